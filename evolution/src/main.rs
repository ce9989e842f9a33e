//! Main entry point for the imagevolve binary
//!
//! Runs one evolution session in the terminal: posts are printed and their
//! images written to disk, reactions are typed on stdin.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;

use evolution::services::{AkaSwapPublisher, ConsolePresenter, EnvCredentialSource, optional_keys, required_keys};
use evolution::services::{AKASWAP_PARTNER_ID, AKASWAP_PARTNER_SECRET, HF_TOKEN};
use evolution::{CredentialSource, EvolutionEngine, PromptMerger, create_merger};
use generator::{FileArtifactStore, GenerationClient, HttpImageClient, PlaceholderClient, RetryingGenerator};
use shared::{EvolutionConfig, Trigger, logging};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// Hosted inference endpoint (needs HF_TOKEN)
    Http,
    /// Offline gradient images, for trying the bot without credentials
    Placeholder,
}

/// Evolve images from chat reactions
#[derive(Parser)]
#[command(name = "imagevolve")]
#[command(about = "Evolves AI-generated images from community reactions")]
pub struct Args {
    /// JSON configuration file merged over the defaults
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Image backend
    #[arg(long, value_enum, default_value_t = Backend::Http)]
    pub backend: Backend,

    /// Override the round length from the configuration
    #[arg(long)]
    pub seconds_per_round: Option<u64>,

    /// Override where generated artifacts are stored
    #[arg(long)]
    pub artifact_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logging::init_tracing(Some(&args.log_level));
    logging::log_startup("imagevolve");

    let mut config = EvolutionConfig::load(args.config.as_deref()).context("loading configuration")?;
    if let Some(seconds) = args.seconds_per_round {
        config.seconds_per_round = seconds;
    }
    if let Some(dir) = args.artifact_dir {
        config.artifact_dir = dir;
    }
    config.validate().context("validating configuration")?;

    let uses_http_backend = args.backend == Backend::Http;
    let required = required_keys(&config, uses_http_backend);
    let credentials = EnvCredentialSource
        .load(&required, &optional_keys(&required))
        .await
        .context("loading credentials")?;

    let merger = create_merger(&config, &credentials)?;
    let publisher = if config.publish.enabled {
        let id = credentials.get(AKASWAP_PARTNER_ID).cloned().unwrap_or_default();
        let secret = credentials.get(AKASWAP_PARTNER_SECRET).cloned().unwrap_or_default();
        Some(AkaSwapPublisher::new(&config.publish, id, secret))
    } else {
        None
    };

    match args.backend {
        Backend::Http => {
            let token = credentials.get(HF_TOKEN).cloned().unwrap_or_default();
            let client = HttpImageClient::new(&config.backend, token)?;
            run_engine(config, client, merger, publisher).await
        }
        Backend::Placeholder => run_engine(config, PlaceholderClient::default(), merger, publisher).await,
    }
}

async fn run_engine<C>(
    config: EvolutionConfig,
    client: C,
    merger: Arc<dyn PromptMerger>,
    publisher: Option<AkaSwapPublisher>,
) -> anyhow::Result<()>
where
    C: GenerationClient + 'static,
{
    let store = FileArtifactStore::new(&config.artifact_dir);
    let presenter = ConsolePresenter::new(config.artifact_dir.join("posts"));
    let generator = RetryingGenerator::new(client, store, config.max_retries, config.retry_delay());

    let mut engine = EvolutionEngine::new(config, generator, merger, presenter, publisher)?;

    // Reactions and commands typed on stdin
    let trigger_tx = engine.trigger_sender();
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => match Trigger::parse_command(&line) {
                    Some(trigger) => {
                        if trigger_tx.send(trigger).await.is_err() {
                            break;
                        }
                    }
                    None if line.trim().is_empty() => {}
                    None => println!("    commands: tick | start [prompt] | stop | publish | feedback <tag> [n] | meta <tag>"),
                },
                Ok(None) => {
                    logging::log_shutdown("stdin closed");
                    break;
                }
                Err(err) => {
                    logging::log_error("Reading stdin", &err);
                    break;
                }
            }
        }
    });

    // Set up graceful shutdown
    let shutdown_sender = engine.shutdown_sender();
    tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => {
                logging::log_shutdown("Received Ctrl+C signal");
                let _ = shutdown_sender.send(()).await;
            }
            Err(err) => {
                logging::log_error("Signal handling", &err);
            }
        }
    });

    engine.run().await?;

    logging::log_success("imagevolve stopped gracefully");
    Ok(())
}
