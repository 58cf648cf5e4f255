//! Generator configuration from the command line and environment

use clap::Parser;
use semver::Version;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::pipeline::CodegenError;
use crate::target::PlatformArg;

/// Environment variable pointing at an SDK checkout.
pub const SDK_ENV: &str = "GEODE_SDK";
/// File inside the SDK checkout holding its version.
pub const VERSION_FILE: &str = "VERSION";

pub fn default_sdk_version() -> Version {
    Version::new(0, 0, 0)
}

/// Flags that may trail the positional arguments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Parser)]
#[command(
    no_binary_name = true,
    args_override_self = true,
    disable_help_flag = true,
    disable_version_flag = true
)]
pub struct ExtraFlags {
    /// Leave the pugixml include out of the generated source
    #[arg(long)]
    pub skip_pugixml: bool,

    /// SDK version override
    #[arg(long, value_name = "VERSION", allow_hyphen_values = true)]
    pub sdk_version: Option<String>,
}

impl ExtraFlags {
    /// Parses trailing tokens. Tokens may arrive joined by spaces; anything
    /// that is not a known flag is skipped.
    pub fn from_tokens<S: AsRef<str>>(tokens: &[S]) -> Result<Self, CodegenError> {
        let split: Vec<&str> = tokens.iter()
            .flat_map(|t| t.as_ref().split_whitespace())
            .collect();

        let mut known = vec![];
        let mut iter = split.into_iter();
        while let Some(token) = iter.next() {
            match token {
                "--skip-pugixml" => known.push(token),
                "--sdk-version" => match iter.next() {
                    Some(value) => known.extend([token, value]),
                    None => warn!("--sdk-version given without a value, ignoring"),
                },
                t if t.starts_with("--sdk-version=") => known.push(t),
                other => warn!(token = other, "ignoring unknown argument"),
            }
        }

        Self::try_parse_from(known).map_err(|e| CodegenError::Argument(e.to_string()))
    }
}

/// Everything one generator run needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorConfig {
    pub platform: PlatformArg,
    pub source_root: PathBuf,
    pub output_root: PathBuf,
    pub skip_pugixml: bool,
    pub sdk_version: Version,
}

impl GeneratorConfig {
    /// `sdk_root` is the value of [`SDK_ENV`], consulted only when no
    /// version flag was given.
    pub fn resolve<S: AsRef<str>>(
        platform: &str,
        source_root: PathBuf,
        output_root: PathBuf,
        extra: &[S],
        sdk_root: Option<&Path>,
    ) -> Result<Self, CodegenError> {
        let platform: PlatformArg = platform.parse()?;
        let flags = ExtraFlags::from_tokens(extra)?;
        let sdk_version = resolve_sdk_version(flags.sdk_version.as_deref(), sdk_root)?;

        Ok(Self {
            platform,
            source_root,
            output_root,
            skip_pugixml: flags.skip_pugixml,
            sdk_version,
        })
    }
}

fn parse_version(text: &str) -> Result<Version, CodegenError> {
    let trimmed = text.trim();
    let trimmed = trimmed.strip_prefix('v').unwrap_or(trimmed);
    Version::parse(trimmed)
        .map_err(|e| CodegenError::Argument(format!("Invalid SDK version '{}': {}", text.trim(), e)))
}

/// Flag first, then `<sdk_root>/VERSION`, then the default.
pub fn resolve_sdk_version(flag: Option<&str>, sdk_root: Option<&Path>) -> Result<Version, CodegenError> {
    if let Some(flag) = flag {
        return parse_version(flag);
    }

    if let Some(root) = sdk_root {
        let path = root.join(VERSION_FILE);
        if path.exists() {
            let content = fs::read_to_string(&path).map_err(|source| CodegenError::Io {
                path: path.clone(),
                source,
            })?;
            let first_line = content.lines().next().unwrap_or_default();
            debug!(path = %path.display(), "reading SDK version");
            return parse_version(first_line);
        }
    }

    Ok(default_sdk_version())
}
