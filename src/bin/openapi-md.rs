//! OpenAPI to Markdown CLI
//!
//! Converts an OpenAPI v3 or Swagger v2 document into Markdown documentation.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use openapi_md::{convert_source, ConvertOptions};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "openapi-md")]
#[command(about = "Render an OpenAPI document as Markdown")]
#[command(version)]
struct Cli {
    /// Document source: file path or URL (http:// or https://)
    source: String,

    /// Output file (stdout if not specified)
    destination: Option<PathBuf>,

    /// Sort operations by path and method, and references by name
    #[arg(long, short)]
    sort: bool,

    /// Log progress to stderr
    #[arg(long, short)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // --verbose enables INFO level, otherwise RUST_LOG decides (errors only when unset)
    let filter = if cli.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

fn run(cli: &Cli) -> Result<(), u8> {
    let options = ConvertOptions::new().sort(cli.sort);

    let markdown = convert_source(&cli.source, &options).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    match &cli.destination {
        Some(path) => {
            std::fs::write(path, &markdown).map_err(|e| {
                eprintln!("Error writing to {}: {}", path.display(), e);
                3u8
            })?;
            info!(path = %path.display(), "wrote markdown");
        }
        None => {
            println!("{}", markdown);
        }
    }

    Ok(())
}
