//! Legendas - Batched Subtitle Translation
//! 
//! Command line entry point: translate SRT files with a local ollama model,
//! check the server, inspect files and write a default configuration.

use anyhow::Result;
use clap::Parser;
use std::path::Path;
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use tracing_appender::{non_blocking, rolling};

use legendas::cancel::CancelFlag;
use legendas::cli::{Args, Commands};
use legendas::config::Config;
use legendas::error::LegendasError;
use legendas::progress::ConsoleProgress;
use legendas::workflow::Workflow;

const DEFAULT_CONFIG_FILE: &str = "legendas.toml";
const CANCELLED_EXIT_CODE: i32 = 130;
const PREVIEW_ENTRIES: usize = 5;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    setup_logging(args.verbose)?;
    info!("Starting Legendas - Batched Subtitle Translation");

    let mut config = load_config(args.config.as_deref())?;

    match args.command {
        Commands::Translate { input, output, model, endpoint, tag } => {
            if let Some(model) = model {
                config.translate.model = model;
            }
            if let Some(endpoint) = endpoint {
                config.translate.endpoint = endpoint;
            }
            if let Some(tag) = tag {
                config.output.language_tag = tag;
            }

            let workflow = Workflow::new(config)?;
            let cancel = CancelFlag::new();
            spawn_ctrl_c_handler(cancel.clone());

            let progress = ConsoleProgress::new();
            match workflow.translate_file(&input, output.as_deref(), &progress, &cancel).await {
                Ok(translated) => {
                    println!(
                        "Translated {} entries ({} batches, {} entries recovered in {} sweep groups)",
                        translated.summary.entries,
                        translated.summary.batches,
                        translated.summary.swept_entries,
                        translated.summary.sweep_groups
                    );
                    println!("Saved to {}", translated.output_path.display());
                }
                Err(e) if e.is_cancelled() => {
                    eprintln!("Translation cancelled, {} was left untouched", input.display());
                    std::process::exit(CANCELLED_EXIT_CODE);
                }
                Err(e) => return Err(e.into()),
            }
        }
        Commands::Check { endpoint } => {
            if let Some(endpoint) = endpoint {
                config.translate.endpoint = endpoint;
            }

            let workflow = Workflow::new(config)?;
            let models = workflow.check_service().await?;

            println!("ollama is available at {}", workflow.config().translate.endpoint);
            println!("\nInstalled Models:");
            println!("{:<40} {:<10}", "Name", "Size (GB)");
            println!("{}", "-".repeat(50));
            for model in &models {
                println!("{:<40} {:<10.1}", model.name, model.size as f64 / 1024.0 / 1024.0 / 1024.0);
            }

            let wanted = &workflow.config().translate.model;
            if !models.iter().any(|m| &m.name == wanted) {
                warn!("Configured model {} is not installed", wanted);
            }
        }
        Commands::Inspect { input } => {
            let workflow = Workflow::new(config)?;
            let document = workflow.inspect_file(&input).await?;

            println!("{}: {} entries", input.display(), document.len());
            for entry in document.entries().iter().take(PREVIEW_ENTRIES) {
                println!("\n{}\n{}\n{}", entry.index, entry.timestamp, entry.text.join("\n"));
            }
            if document.len() > PREVIEW_ENTRIES {
                println!("\n... {} more", document.len() - PREVIEW_ENTRIES);
            }
        }
        Commands::InitConfig { path } => {
            if path.exists() {
                return Err(LegendasError::Config(format!(
                    "{} already exists",
                    path.display()
                )).into());
            }
            Config::default().save_to_file(&path)?;
            println!("Wrote default configuration to {}", path.display());
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(config_path) => Config::from_file(config_path)?,
        None => {
            if Path::new(DEFAULT_CONFIG_FILE).exists() {
                info!("Found {} in current directory, loading...", DEFAULT_CONFIG_FILE);
                Config::from_file(DEFAULT_CONFIG_FILE)?
            } else {
                Config::default()
            }
        }
    };
    Ok(config)
}

/// Ctrl-C only raises the flag; the run stops at the next batch boundary.
fn spawn_ctrl_c_handler(cancel: CancelFlag) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Cancellation requested, stopping after the current batch");
            cancel.cancel();
        }
    });
}

/// Setup logging to both console and file
fn setup_logging(verbose: bool) -> Result<()> {
    let log_dir = std::env::current_dir()?.join(".legendas").join("log");
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = rolling::daily(&log_dir, "legendas.log");
    let (non_blocking_file, guard) = non_blocking(file_appender);
    // Keep the guard alive for the duration of the program
    std::mem::forget(guard);

    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_file(verbose)
        .with_line_number(verbose);

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!("Logging initialized - console: {}, file: {}",
          log_level, log_dir.join("legendas.log").display());

    Ok(())
}
