use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Translate an SRT subtitle file
    Translate {
        /// Input subtitle file
        #[arg(short, long)]
        input: PathBuf,

        /// Output subtitle file (defaults to the input name with the language tag)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Ollama model to use
        #[arg(short, long)]
        model: Option<String>,

        /// Ollama server URL
        #[arg(short, long)]
        endpoint: Option<String>,

        /// Language tag used in the output file name
        #[arg(short, long)]
        tag: Option<String>,
    },

    /// Check that the ollama server is reachable and list its models
    Check {
        /// Ollama server URL
        #[arg(short, long)]
        endpoint: Option<String>,
    },

    /// Parse a subtitle file and print a summary
    Inspect {
        /// Input subtitle file
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Write a configuration file with the default settings
    InitConfig {
        /// Where to write the file
        #[arg(short, long, default_value = "legendas.toml")]
        path: PathBuf,
    },
}
