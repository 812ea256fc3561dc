mod action;
mod app;
mod app_state;
mod component;
mod components;
mod focus;
mod markup;
mod theme;
mod widgets;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use tgads_core::config::Config;
use tgads_core::store::{JsonFileStore, StateStore};
use tgads_core::HttpClient;

/// Terminal client for curating Telegram channels and composing ads.
#[derive(Parser, Debug)]
#[command(name = "tgads", version)]
struct Cli {
    /// Backend base URL, e.g. http://127.0.0.1:8080/api/v1
    #[arg(long)]
    api_url: Option<String>,

    /// Where the selection and form values are kept between runs.
    #[arg(long)]
    state_file: Option<PathBuf>,

    /// Start with an empty table instead of loading the full catalog.
    #[arg(long)]
    no_initial_fetch: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let data_dir = tgads_core::platform::data_dir();
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("creating {}", data_dir.display()))?;

    let (mut config, config_error) = match Config::load() {
        Ok(c) => (c, None),
        Err(e) => (Config::default(), Some(e)),
    };
    if let Some(url) = cli.api_url {
        config.api.base_url = url;
    }
    if let Some(path) = cli.state_file {
        config.paths.state_file = path;
    }

    let log_path = config.paths.log_file.clone();
    if let Some(dir) = log_path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("opening log {}", log_path.display()))?;

    // RUST_LOG wins; otherwise app debug with HTTP internals quieted.
    let log_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "debug,hyper_util=warn,reqwest=warn,hyper=warn".to_string());
    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_env_filter(log_filter.as_str())
        .with_ansi(false)
        .init();

    eprintln!("tgads log: {}", log_path.display());
    tracing::info!("tgads starting, api {}", config.api.base_url);
    if let Some(e) = config_error {
        tracing::warn!("[config] using defaults: {:#}", e);
    }

    if let Some(dir) = config.paths.state_file.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let file_store = JsonFileStore::open(config.paths.state_file.clone());
    tracing::info!("[store] state file {}", file_store.path().display());
    let store: Arc<dyn StateStore> = Arc::new(file_store);
    let api = HttpClient::new(&config.api)?;

    app::App::new(config, store, api, !cli.no_initial_fetch).run().await
}
