use crate::chart::{ChartRenderer, RenderError};
use crate::config::{Asset, Config};
use crate::data_fetcher::{FetchError, PriceSource};
use crate::notifier::Notifier;
use meridian_indicator_engine::{ComputationError, Indicators, Report};
use prettytable::{row, Table};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),
    #[error("computation failed: {0}")]
    Computation(#[from] ComputationError),
    #[error("chart rendering failed: {0}")]
    Render(#[from] RenderError),
}

/// Everything produced for an asset that made it through the pipeline.
#[derive(Debug)]
pub struct AssetReport {
    pub report: Report,
    pub chart: PathBuf,
    pub notified: bool,
}

#[derive(Debug)]
pub struct AssetOutcome {
    pub asset: String,
    pub result: Result<AssetReport, PipelineError>,
}

/// Per-asset outcomes of one run, in configured order.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub outcomes: Vec<AssetOutcome>,
}

impl RunSummary {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    pub fn table(&self) -> Table {
        let mut table = Table::new();
        table.set_titles(row!["Asset", "Status", "Detail"]);

        for outcome in &self.outcomes {
            match &outcome.result {
                Ok(done) => {
                    let mailed = if done.notified { "mailed" } else { "not mailed" };
                    let detail = format!(
                        "{} {} ({})",
                        done.report.date,
                        done.chart.display(),
                        mailed
                    );
                    table.add_row(row![outcome.asset, "reported", detail]);
                }
                Err(e) => {
                    table.add_row(row![outcome.asset, "failed", e]);
                }
            }
        }

        table
    }

    pub fn print(&self) {
        self.table().printstd();
        println!(
            "{} of {} assets reported",
            self.succeeded(),
            self.outcomes.len()
        );
    }
}

/// Runs fetch, indicators, chart, report and alert for every configured asset.
pub struct RunOrchestrator<S, R, N> {
    config: Config,
    source: S,
    renderer: R,
    notifier: N,
}

impl<S, R, N> RunOrchestrator<S, R, N>
where
    S: PriceSource,
    R: ChartRenderer,
    N: Notifier,
{
    pub fn new(config: Config, source: S, renderer: R, notifier: N) -> Self {
        Self {
            config,
            source,
            renderer,
            notifier,
        }
    }

    /// Processes the assets one after another. A failing asset is logged and
    /// recorded; it never stops the others.
    pub async fn run(&self) -> RunSummary {
        let mut summary = RunSummary::default();

        for asset in &self.config.assets {
            tracing::info!("Processing {}", asset.name);

            let result = self.process_asset(asset).await;
            if let Err(e) = &result {
                tracing::warn!(asset = %asset.name, error = %e, "Skipping {}", asset.name);
            }

            summary.outcomes.push(AssetOutcome {
                asset: asset.name.clone(),
                result,
            });
        }

        tracing::info!(
            succeeded = summary.succeeded(),
            failed = summary.failed(),
            "Run finished"
        );
        summary
    }

    async fn process_asset(&self, asset: &Asset) -> Result<AssetReport, PipelineError> {
        let series = self
            .source
            .fetch(&asset.kind, self.config.lookback_days)
            .await?;

        let params = &self.config.indicator_params;
        let frame = Indicators::new(&series)?.calculate(params)?;
        let report = Report::from_frame(asset.name.as_str(), &frame, params)?;

        let chart = self.renderer.render(&asset.name, &frame)?;

        let body = report.to_string();
        println!("{body}\n");

        let notified = match self.notifier.notify(&report.subject(), &body).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(asset = %asset.name, error = %e, "Alert not delivered");
                false
            }
        };

        Ok(AssetReport {
            report,
            chart,
            notified,
        })
    }
}
