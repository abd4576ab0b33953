//! Aero Tutor Control - command-line client for the tutor pipeline.
//!
//! Runs everything in-process: no daemon required.

mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

// Version is embedded at build time
const VERSION: &str = env!("AEROTUTOR_VERSION");

#[derive(Parser)]
#[command(name = "aeroctl")]
#[command(about = "Aero Tutor - conceptual aircraft-systems tutor", long_about = None)]
#[command(version = VERSION)]
struct Cli {
    /// Config file (otherwise discovered)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Show diagnostics on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask a conceptual question (reads stdin when QUESTION is omitted)
    Ask {
        question: Option<String>,

        /// electrical, hydraulic or other
        #[arg(long, default_value = "electrical")]
        focus: String,

        /// Print the raw response as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show how a question would be classified
    Classify {
        question: String,

        #[arg(long)]
        json: bool,
    },

    /// List indexed training documents
    Corpus {
        /// Only documents for this focus
        #[arg(long)]
        focus: Option<String>,
    },

    /// Summarize the compliance log
    Audit {
        /// Most recent events to list
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },

    /// Show the effective configuration and where it came from
    Config,

    /// Print the compliance fingerprint of a question
    Fingerprint { question: String },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = cli.config.as_deref();
    match cli.command {
        Commands::Ask {
            question,
            focus,
            json,
        } => commands::ask(config, question, &focus, json),
        Commands::Classify { question, json } => commands::classify(config, &question, json),
        Commands::Corpus { focus } => commands::corpus(config, focus.as_deref()),
        Commands::Audit { limit } => commands::audit(config, limit),
        Commands::Config => commands::config(config),
        Commands::Fingerprint { question } => commands::fingerprint(config, &question),
    }
}
