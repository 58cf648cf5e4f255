//! Geode Codegen CLI
//!
//! Usage: geode-codegen <platform> <source-root> <output-root> [flags...]
//! Extra flags may arrive joined into one token; unknown ones are ignored
//! Prints `Codegen error: ...` on stdout and exits 1 on any failure

use clap::error::ErrorKind;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use geode_codegen::config::SDK_ENV;
use geode_codegen::{run, CodegenError, GeneratorConfig};

#[derive(Parser)]
#[command(name = "geode-codegen")]
#[command(about = "Geode Codegen - multi-target C++ binding generator")]
#[command(version)]
struct Cli {
    /// Win32, Win64, MacOS, iOS, Android32 or Android64
    platform: String,

    /// Directory containing Entry.json
    source_root: PathBuf,

    /// Directory that receives Geode/
    output_root: PathBuf,
}

/// Positionals go through clap; everything after them is handed to
/// `ExtraFlags` untouched (--skip-pugixml, --sdk-version <ver>).
fn parse_cli() -> Result<(Cli, Vec<String>), CodegenError> {
    let mut args: Vec<String> = std::env::args().collect();
    let provided = args.len().saturating_sub(1);
    let extra = if args.len() > 4 { args.split_off(4) } else { vec![] };

    let cli = Cli::try_parse_from(&args).map_err(|e| match e.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => e.exit(),
        ErrorKind::MissingRequiredArgument => CodegenError::Argument(format!(
            "Invalid number of parameters (expected 3 or more, found {})",
            provided
        )),
        _ => CodegenError::Argument(e.to_string()),
    })?;
    Ok((cli, extra))
}

fn generate() -> Result<(), CodegenError> {
    let (cli, extra) = parse_cli()?;
    let sdk_root = std::env::var_os(SDK_ENV).map(PathBuf::from);

    let config = GeneratorConfig::resolve(
        &cli.platform,
        cli.source_root,
        cli.output_root,
        extra.as_slice(),
        sdk_root.as_deref(),
    )?;

    let report = run(&config)?;
    tracing::info!(
        files = report.files.len(),
        report_hash = %report.report_hash,
        "done"
    );
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    match generate() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            println!("Codegen error: {}", e);
            ExitCode::FAILURE
        }
    }
}
