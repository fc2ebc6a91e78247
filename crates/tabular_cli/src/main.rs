mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{ReadArgs, ValidateArgs};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "tabular")]
#[command(version, about = "Describe and validate tabular data", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a data file, resource descriptor or package descriptor
    Validate {
        /// Data file or descriptor (JSON, YAML or TOML)
        source: String,

        #[command(flatten)]
        read: ReadArgs,

        #[command(flatten)]
        validate: ValidateArgs,

        /// Output format: text, json
        #[arg(short, long, default_value = "text")]
        output: String,
    },

    /// Infer the descriptor of a data file or descriptor
    Describe {
        /// Data file or descriptor (JSON, YAML or TOML)
        source: String,

        #[command(flatten)]
        read: ReadArgs,

        /// Read all rows to add hash, bytes, fields and rows
        #[arg(long)]
        stats: bool,

        /// Output format: json, yaml, toml
        #[arg(short, long, default_value = "json")]
        output: String,
    },

    /// Check a descriptor without reading any data
    Check {
        /// Schema, resource or package descriptor (JSON, YAML or TOML)
        descriptor: String,

        /// Output format: text, json
        #[arg(short, long, default_value = "text")]
        output: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG takes precedence over --verbose
    let level = if cli.verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_level(true)
                .compact(),
        )
        .with(filter)
        .init();

    match cli.command {
        Commands::Validate {
            source,
            read,
            validate,
            output,
        } => commands::validate::execute(&source, &read, &validate, &output),

        Commands::Describe {
            source,
            read,
            stats,
            output,
        } => commands::describe::execute(&source, &read, stats, &output),

        Commands::Check { descriptor, output } => commands::check::execute(&descriptor, &output),
    }
}
