mod cli;

use clap::Parser;
use cli::{Cli, Commands, FetchArgs};
use pagevault::cache::CacheStore;
use pagevault::config::Config;
use pagevault::targets;
use pagevault::throttle::Throttle;
use pagevault::worker::{ExtractClient, FetchPool, HttpConfig};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

type AnyError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[tokio::main]
async fn main() -> Result<(), AnyError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Fetch(args) => fetch(args).await?,
    }

    Ok(())
}

async fn fetch(args: FetchArgs) -> Result<(), AnyError> {
    let config = match args.config {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load()?,
    };

    let targets = targets::load(&args.urls)?;
    info!(
        count = targets.len(),
        urls = %args.urls.display(),
        "Loaded target list"
    );

    let cache = CacheStore::local(&config.storage.root)?;
    let throttle = Throttle::new(config.fetcher.min_interval(), config.fetcher.jitter());

    let http = HttpConfig {
        connect_timeout: config.fetcher.connect_timeout(),
        request_timeout: config.fetcher.request_timeout(),
        max_retries: config.fetcher.max_retries,
        ..HttpConfig::default()
    };
    // presence enforced by configuration validation
    let api_key = config.api.api_key.clone().unwrap_or_default();
    let client = ExtractClient::new(http, config.api.endpoint.clone(), api_key)?;

    let pool = FetchPool::new(client, throttle, cache, config.fetcher.concurrency);

    tokio::select! {
        summary = pool.run(targets) => {
            info!(
                skipped = summary.skipped,
                fetched = summary.fetched,
                failed = summary.failed,
                "Run finished"
            );
            if summary.failed > 0 {
                std::process::exit(1);
            }
        }
        _ = shutdown_signal() => {
            warn!("Interrupted; completed entries are safe, rerun to resume from the cache");
            std::process::exit(130);
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    // Wait for Ctrl+C
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        let mut sigterm = signal(SignalKind::terminate())
            .expect("failed to install signal handler");
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
