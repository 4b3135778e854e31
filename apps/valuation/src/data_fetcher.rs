use crate::config::{AssetKind, Config, REQUEST_TIMEOUT};
use crate::retry::{RetryConfig, Transient};
use async_trait::async_trait;
use meridian_alphavantage::time_series_daily::{
    TimeSeriesDaily, TimeSeriesDailyParams, TimeSeriesError,
};
use meridian_alphavantage::AlphaVantageClient;
use meridian_coingecko::market_chart::{MarketChart, MarketChartParams};
use meridian_coingecko::CoinGeckoClient;
use meridian_shared_models::{PriceSeries, SeriesError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("{0} is not set")]
    MissingCredential(&'static str),
    #[error("HTTP error: {0}")]
    Http(reqwest::Error),
    #[error("API error: {0}")]
    Api(String),
    #[error("Rate limited: {0}")]
    RateLimited(String),
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
    #[error("Invalid price series: {0}")]
    Series(#[from] SeriesError),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            FetchError::MalformedResponse(e.to_string())
        } else {
            FetchError::Http(e)
        }
    }
}

impl From<TimeSeriesError> for FetchError {
    fn from(e: TimeSeriesError) -> Self {
        match e {
            TimeSeriesError::RateLimited(message) => FetchError::RateLimited(message),
            TimeSeriesError::Api(message) => FetchError::Api(message),
            TimeSeriesError::Series(e) => FetchError::Series(e),
            e @ (TimeSeriesError::MissingSeries | TimeSeriesError::InvalidClose { .. }) => {
                FetchError::MalformedResponse(e.to_string())
            }
        }
    }
}

impl Transient for FetchError {
    /// Network trouble, timeouts, 429 and 5xx are retried. Alpha Vantage's
    /// in-body rate limit notes are not: its quota resets per minute or day.
    fn is_transient(&self) -> bool {
        match self {
            FetchError::Http(e) => {
                if e.is_timeout() || e.is_connect() || e.is_request() {
                    return true;
                }
                e.status()
                    .is_some_and(|status| status.as_u16() == 429 || status.is_server_error())
            }
            _ => false,
        }
    }
}

/// Source of daily closing prices.
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Returns up to `days` daily closes, oldest first.
    async fn fetch(&self, kind: &AssetKind, days: usize) -> Result<PriceSeries, FetchError>;
}

/// Fetches crypto prices from CoinGecko and commodities from Alpha Vantage.
pub struct MarketDataFetcher {
    coingecko: CoinGeckoClient,
    alphavantage: Option<AlphaVantageClient>,
    retry: RetryConfig,
}

impl MarketDataFetcher {
    pub fn new(config: &Config) -> Result<Self, FetchError> {
        let coingecko = CoinGeckoClient::new(REQUEST_TIMEOUT)?;
        let alphavantage = config
            .alpha_vantage_key
            .as_deref()
            .map(|key| AlphaVantageClient::new(key, REQUEST_TIMEOUT))
            .transpose()?;

        if alphavantage.is_none() {
            tracing::warn!("ALPHA_VANTAGE_API_KEY not set, commodity prices are unavailable");
        }

        Ok(Self {
            coingecko,
            alphavantage,
            retry: RetryConfig::default(),
        })
    }

    async fn fetch_crypto(&self, coin_id: &str, days: usize) -> Result<PriceSeries, FetchError> {
        let response = self
            .retry
            .run(coin_id, || async move {
                let params = MarketChartParams::builder()
                    .coin_id(coin_id)
                    .vs_currency("usd")
                    .days(u32::try_from(days).unwrap_or(u32::MAX))
                    .interval("daily")
                    .build();
                self.coingecko
                    .call::<MarketChart>(params)
                    .await
                    .map_err(FetchError::from)
            })
            .await?;

        Ok(response.to_price_series(days)?)
    }

    async fn fetch_commodity(&self, symbol: &str, days: usize) -> Result<PriceSeries, FetchError> {
        let client = self
            .alphavantage
            .as_ref()
            .ok_or(FetchError::MissingCredential("ALPHA_VANTAGE_API_KEY"))?;

        let response = self
            .retry
            .run(symbol, || async move {
                let params = TimeSeriesDailyParams::builder()
                    .symbol(symbol)
                    .outputsize("compact")
                    .build();
                client
                    .call::<TimeSeriesDaily>(params)
                    .await
                    .map_err(FetchError::from)
            })
            .await?;

        Ok(response.into_price_series(days)?)
    }
}

#[async_trait]
impl PriceSource for MarketDataFetcher {
    async fn fetch(&self, kind: &AssetKind, days: usize) -> Result<PriceSeries, FetchError> {
        let series = match kind {
            AssetKind::Crypto { coin_id } => self.fetch_crypto(coin_id, days).await?,
            AssetKind::Commodity { symbol } => self.fetch_commodity(symbol, days).await?,
        };

        tracing::debug!(
            points = series.len(),
            latest = %series.latest().date,
            "Fetched {:?}",
            kind
        );

        Ok(series)
    }
}
