//! Target Context - the (platform, architecture) pair of one emitter pass
//!
//! A [`Target`] is a plain `Copy` value handed to every emitter and merge
//! call. Switching architecture means passing a different value; there is
//! no shared state to reset between passes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::pipeline::CodegenError;

/// Preprocessor marker that selects the Arm variant of a split artifact.
pub const ARM_MARKER: &str = "GEODE_IS_ARM_MAC";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Windows,
    Mac,
    Ios,
    Android32,
    Android64,
}

impl Platform {
    pub fn name(self) -> &'static str {
        match self {
            Self::Windows => "Windows",
            Self::Mac => "MacOS",
            Self::Ios => "iOS",
            Self::Android32 => "Android32",
            Self::Android64 => "Android64",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Arch {
    /// The platform's only architecture (x64 on Windows).
    Implicit,
    /// 32-bit Windows.
    X86,
    Arm,
    Intel,
}

impl Arch {
    /// File name suffix of split top-level files (`GeneratedSourceArm.cpp`).
    pub fn suffix(self) -> &'static str {
        match self {
            Self::Arm => "Arm",
            Self::Intel => "Intel",
            Self::X86 | Self::Implicit => "",
        }
    }

    /// Directory suffix of split per-class files (`modify_arm/`).
    pub fn dir_suffix(self) -> &'static str {
        match self {
            Self::Arm => "_arm",
            Self::Intel => "_intel",
            Self::X86 | Self::Implicit => "",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Target {
    platform: Platform,
    arch: Arch,
}

impl Target {
    pub const WIN32: Target = Target { platform: Platform::Windows, arch: Arch::X86 };
    pub const WIN64: Target = Target { platform: Platform::Windows, arch: Arch::Implicit };
    pub const MAC_ARM: Target = Target { platform: Platform::Mac, arch: Arch::Arm };
    pub const MAC_INTEL: Target = Target { platform: Platform::Mac, arch: Arch::Intel };
    pub const IOS: Target = Target { platform: Platform::Ios, arch: Arch::Implicit };
    pub const ANDROID32: Target = Target { platform: Platform::Android32, arch: Arch::Implicit };
    pub const ANDROID64: Target = Target { platform: Platform::Android64, arch: Arch::Implicit };

    pub fn new(platform: Platform, arch: Arch) -> Result<Self, CodegenError> {
        let valid = match platform {
            Platform::Mac => matches!(arch, Arch::Arm | Arch::Intel),
            Platform::Windows => matches!(arch, Arch::Implicit | Arch::X86),
            _ => arch == Arch::Implicit,
        };
        if !valid {
            return Err(CodegenError::Argument(format!(
                "Architecture {:?} is not available on {}",
                arch,
                platform.name()
            )));
        }
        Ok(Self { platform, arch })
    }

    pub fn platform(self) -> Platform {
        self.platform
    }

    pub fn arch(self) -> Arch {
        self.arch
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.arch {
            Arch::Implicit => write!(f, "{}", self.platform.name()),
            Arch::X86 => write!(f, "{} (x86)", self.platform.name()),
            Arch::Arm => write!(f, "{} (arm)", self.platform.name()),
            Arch::Intel => write!(f, "{} (intel)", self.platform.name()),
        }
    }
}

/// Platform token accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlatformArg {
    Win32,
    Win64,
    MacOS,
    #[serde(rename = "iOS")]
    IOS,
    Android32,
    Android64,
}

impl PlatformArg {
    pub fn platform(self) -> Platform {
        match self {
            Self::Win32 | Self::Win64 => Platform::Windows,
            Self::MacOS => Platform::Mac,
            Self::IOS => Platform::Ios,
            Self::Android32 => Platform::Android32,
            Self::Android64 => Platform::Android64,
        }
    }

    /// Targets that need an emitter pass, in pass order.
    pub fn targets(self) -> Vec<Target> {
        match self {
            Self::Win32 => vec![Target::WIN32],
            Self::Win64 => vec![Target::WIN64],
            Self::MacOS => vec![Target::MAC_ARM, Target::MAC_INTEL],
            Self::IOS => vec![Target::IOS],
            Self::Android32 => vec![Target::ANDROID32],
            Self::Android64 => vec![Target::ANDROID64],
        }
    }
}

impl FromStr for PlatformArg {
    type Err = CodegenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Win32" => Ok(Self::Win32),
            "Win64" => Ok(Self::Win64),
            "MacOS" => Ok(Self::MacOS),
            "iOS" => Ok(Self::IOS),
            "Android32" => Ok(Self::Android32),
            "Android64" => Ok(Self::Android64),
            other => Err(CodegenError::Argument(format!("Invalid platform {}", other))),
        }
    }
}

impl fmt::Display for PlatformArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Win32 => "Win32",
            Self::Win64 => "Win64",
            Self::MacOS => "MacOS",
            Self::IOS => "iOS",
            Self::Android32 => "Android32",
            Self::Android64 => "Android64",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_tokens() {
        assert_eq!("Win32".parse::<PlatformArg>().unwrap().targets(), vec![Target::WIN32]);
        assert_eq!("iOS".parse::<PlatformArg>().unwrap().platform(), Platform::Ios);
        assert_eq!(
            "MacOS".parse::<PlatformArg>().unwrap().targets(),
            vec![Target::MAC_ARM, Target::MAC_INTEL]
        );
    }

    #[test]
    fn test_unknown_platform_is_argument_error() {
        let err = "Linux".parse::<PlatformArg>().unwrap_err();
        assert!(matches!(err, CodegenError::Argument(_)));
        assert_eq!(err.to_string(), "Invalid platform Linux");
    }

    #[test]
    fn test_arch_only_multi_valued_on_mac() {
        assert!(Target::new(Platform::Mac, Arch::Implicit).is_err());
        assert!(Target::new(Platform::Ios, Arch::Arm).is_err());
        assert!(Target::new(Platform::Android64, Arch::X86).is_err());
        assert_eq!(Target::new(Platform::Mac, Arch::Intel).unwrap(), Target::MAC_INTEL);
        assert_eq!(Target::new(Platform::Windows, Arch::X86).unwrap(), Target::WIN32);
    }

    #[test]
    fn test_round_trips_display() {
        for token in ["Win32", "Win64", "MacOS", "iOS", "Android32", "Android64"] {
            let arg: PlatformArg = token.parse().unwrap();
            assert_eq!(arg.to_string(), token);
        }
    }
}
