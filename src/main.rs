//! Seekwatch entry point.

use std::sync::Arc;

use clap::{Parser, Subcommand};
use seekwatch::{
    cmd::{bootstrap, reset_counters},
    config::AppConfig,
    delivery::WebhookSink,
    http_client::create_retryable_http_client,
    persistence::JsonFileStore,
    providers::{extract::PageExtractor, http::MarketplaceClient, session::SharedSession},
    supervisor::Supervisor,
};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory containing `app.yaml`.
    #[arg(long)]
    config_dir: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Runs the monitoring supervisor.
    Run,
    /// Seeds the product history from a full listing pass, without pushing.
    Bootstrap,
    /// Resets the daily report counters.
    ResetCounters {
        /// Reset only this group (1..=3); omit to reset all groups.
        #[arg(long)]
        group: Option<u8>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let subscriber =
        FmtSubscriber::builder().with_env_filter(EnvFilter::from_default_env()).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();
    let config = AppConfig::new(cli.config_dir.as_deref())?;

    match cli.command {
        Commands::Run => run_supervisor(config).await?,
        Commands::Bootstrap => bootstrap::execute(config).await?,
        Commands::ResetCounters { group } => reset_counters::execute(config, group).await?,
    }

    Ok(())
}

async fn run_supervisor(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    tracing::debug!(site_url = %config.site_url, state_dir = %config.state_dir.display(), "Configuration loaded.");

    let store = Arc::new(JsonFileStore::new(&config.state_dir).await?);

    let extractor = PageExtractor::new(&config.extractor)?;
    let session = Arc::new(SharedSession::new(config.session_cookie.clone()));
    let data_source = Arc::new(MarketplaceClient::new(
        config.site_url.clone(),
        session,
        extractor,
        config.fetch_timeout,
    )?);

    let webhook_client = Arc::new(create_retryable_http_client(
        &config.webhook_retry,
        reqwest::Client::new(),
    ));
    let sink = Arc::new(WebhookSink::new(
        config.webhooks.clone(),
        webhook_client,
        reqwest::Client::new(),
    )?);

    let supervisor = Supervisor::builder()
        .config(config)
        .store(store)
        .data_source(data_source)
        .sink(sink)
        .build()
        .await?;

    tracing::info!("Supervisor initialized, starting monitoring...");
    supervisor.run().await?;
    Ok(())
}
