use anyhow::Context;
use chart::PngChartRenderer;
use config::{Config, REQUEST_TIMEOUT};
use data_fetcher::MarketDataFetcher;
use dotenv::dotenv;
use notifier::AlertChannel;
use orchestrator::RunOrchestrator;
use tracing_subscriber::EnvFilter;

mod chart;
mod config;
mod data_fetcher;
mod font;
mod notifier;
mod orchestrator;
mod retry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();

    let fetcher = MarketDataFetcher::new(&config).context("Failed to build HTTP clients")?;
    let renderer = PngChartRenderer::new(config.chart_dir.clone());
    let notifier = AlertChannel::from_config(config.mail.as_ref(), REQUEST_TIMEOUT);

    tracing::info!(
        assets = config.assets.len(),
        lookback_days = config.lookback_days,
        "Starting valuation run"
    );

    let summary = RunOrchestrator::new(config, fetcher, renderer, notifier)
        .run()
        .await;
    summary.print();

    Ok(())
}
