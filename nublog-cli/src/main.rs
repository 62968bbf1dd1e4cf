//! # nublog CLI
//!
//! Command-line interface for the nublog document compiler.

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "nublog")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "nublog.yml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile every document and write fragments, index, feed and sitemap
    Build,

    /// Compile a single document and print its fragment
    Compile {
        /// Source path relative to the content directory
        file: String,
    },

    /// List documents newest first
    Query {
        /// Only include URL paths starting with this prefix
        #[arg(long)]
        prefix: Option<String>,

        /// Return JSON for machine consumption
        #[arg(long)]
        json: bool,
    },

    /// Compile every document and report errors without writing output
    Check,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let subscriber = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(if cli.verbose {
                tracing::Level::DEBUG.into()
            } else {
                tracing::Level::INFO.into()
            }),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Build => commands::build_site(&cli.config),
        Commands::Compile { file } => commands::compile_file(&cli.config, &file),
        Commands::Query { prefix, json } => {
            commands::query_contents(&cli.config, prefix.as_deref(), json)
        }
        Commands::Check => commands::check_site(&cli.config),
    }
}
