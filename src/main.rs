use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use wavetext_core::{AppConfig, UploadEvent};
use wavetext_pipeline::{watch_container, Transcriber, TriggerHandler};
use wavetext_storage::{BlobStore, StoreRegistry};

#[derive(Parser)]
#[command(name = "wavetext", about = "Blob-triggered speech-to-text pipeline")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Process one uploaded audio object by name (with or without `.wav`)
    Run { name: String },
    /// Watch the local input container and process new `.wav` uploads
    Watch,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load_from_file(&cli.config)
        .with_context(|| format!("failed to load config from {:?}", cli.config))?;
    config.validate().context("invalid configuration")?;

    let env_filter =
        EnvFilter::try_new(&config.general.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("wavetext starting");

    let store = build_store(&config).await?;
    let transcriber = Transcriber::new(&config.speech.engine, engine_config(&config)?);
    tracing::info!(
        backend = %config.storage.backend,
        engine = %config.speech.engine,
        "pipeline ready"
    );

    let handler = TriggerHandler::new(
        store,
        transcriber,
        config.general.scratch_dir(),
        &config.storage.input_container,
        &config.storage.output_container,
    );

    match cli.command {
        Command::Run { name } => {
            let event = match UploadEvent::from_blob_name(&name) {
                Some(event) => event,
                None => UploadEvent::new(name),
            };
            handler
                .handle(&event)
                .await
                .with_context(|| format!("pipeline run failed for '{}'", event.name))?;
        }
        Command::Watch => {
            if config.storage.backend != "local" {
                bail!(
                    "watch mode requires the 'local' storage backend, got '{}'",
                    config.storage.backend
                );
            }
            let root = config.storage.local.clone().unwrap_or_default().root;
            let dir = root.join(&config.storage.input_container);
            tokio::fs::create_dir_all(&dir)
                .await
                .with_context(|| format!("failed to create input container dir {dir:?}"))?;
            watch_container(handler, dir).await.context("watcher failed")?;
        }
    }

    Ok(())
}

async fn build_store(config: &AppConfig) -> Result<Box<dyn BlobStore>> {
    let registry = StoreRegistry::new();
    let mut store = registry
        .create(&config.storage.backend)
        .with_context(|| format!("unknown storage backend '{}'", config.storage.backend))?;

    let backend_config = match config.storage.backend.as_str() {
        "local" => toml::Value::try_from(config.storage.local.clone().unwrap_or_default())
            .context("failed to serialize local storage config")?,
        "azure" => {
            let azure = config
                .storage
                .azure
                .as_ref()
                .context("missing [storage.azure] section")?;
            toml::Value::try_from(azure.clone())
                .context("failed to serialize azure storage config")?
        }
        _ => toml::Value::Table(Default::default()),
    };

    store
        .initialize(backend_config)
        .await
        .with_context(|| {
            format!(
                "failed to initialize '{}' storage backend",
                config.storage.backend
            )
        })?;
    Ok(store)
}

fn engine_config(config: &AppConfig) -> Result<toml::Value> {
    match config.speech.engine.as_str() {
        "rest" => {
            let rest = config
                .speech
                .rest
                .as_ref()
                .context("missing [speech.rest] section")?;
            toml::Value::try_from(rest.clone()).context("failed to serialize rest engine config")
        }
        _ => Ok(toml::Value::Table(Default::default())),
    }
}
