//! twistlint CLI tool.
//!
//! Usage:
//! ```bash
//! twistlint check [OPTIONS] [PATH]
//! twistlint list-msgs
//! twistlint init
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod config_resolver;

/// Twisted coding-standard checker for Python sources
#[derive(Parser)]
#[command(name = "twistlint")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "TWISTLINT_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check Python sources
    Check {
        /// File or directory to check (default: current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,

        /// Only run specific checkers (comma-separated names)
        #[arg(long)]
        rules: Option<String>,

        /// Exclude patterns (can be specified multiple times)
        #[arg(short, long)]
        exclude: Vec<String>,

        /// Checker preset (standard, pep8, minimal)
        #[arg(long)]
        preset: Option<String>,

        /// Shorthand for `--preset pep8`
        #[arg(long, conflicts_with = "preset")]
        pep8: bool,

        /// Render each violation with its source snippet
        #[arg(long)]
        rich: bool,
    },

    /// List available messages
    ListMsgs,

    /// Initialize configuration file
    Init {
        /// Overwrite existing config
        #[arg(long)]
        force: bool,
    },
}

/// Output format for lint results.
#[derive(Clone, Copy, Debug, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON output.
    Json,
    /// One-line-per-violation compact format.
    Compact,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Check {
            path,
            format,
            rules,
            exclude,
            preset,
            pep8,
            rich,
        } => {
            let source = config_resolver::resolve(&project_dir(&path), cli.config.as_deref());
            let options = commands::check::CheckOptions {
                format,
                rules,
                exclude,
                preset: if pep8 { Some("pep8".to_string()) } else { preset },
                rich,
            };
            let failed = commands::check::run(&path, options, &source)?;
            if failed {
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::ListMsgs => commands::list_msgs::run(),
        Commands::Init { force } => commands::init::run(force),
    }
}

/// Directory searched for a project configuration file.
fn project_dir(path: &std::path::Path) -> PathBuf {
    if path.is_file() {
        path.parent()
            .map_or_else(|| PathBuf::from("."), std::path::Path::to_path_buf)
    } else {
        path.to_path_buf()
    }
}
