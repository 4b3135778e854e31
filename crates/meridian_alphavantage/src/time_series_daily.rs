use crate::method::Method;
use bon::Builder;
use chrono::NaiveDate;
use meridian_shared_models::{PriceSeries, SeriesError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TimeSeriesError {
    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),
    #[error("API error: {0}")]
    Api(String),
    #[error("Response carries no daily time series")]
    MissingSeries,
    #[error("Invalid close price {value:?} on {date}")]
    InvalidClose { date: NaiveDate, value: String },
    #[error(transparent)]
    Series(#[from] SeriesError),
}

#[derive(Serialize, Deserialize, Debug, Builder)]
#[builder(on(String, into))]
pub struct TimeSeriesDailyParams {
    pub symbol: String,
    /// `compact` (latest 100 points) or `full`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outputsize: Option<String>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct TimeSeriesDailyResponse {
    #[serde(rename = "Meta Data", default)]
    pub meta_data: Option<MetaData>,
    #[serde(rename = "Time Series (Daily)", default)]
    pub time_series: Option<BTreeMap<NaiveDate, DailyBar>>,
    #[serde(rename = "Error Message", default)]
    pub error_message: Option<String>,
    #[serde(rename = "Note", default)]
    pub note: Option<String>,
    #[serde(rename = "Information", default)]
    pub information: Option<String>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct MetaData {
    #[serde(rename = "1. Information")]
    pub information: String,
    #[serde(rename = "2. Symbol")]
    pub symbol: String,
    #[serde(rename = "3. Last Refreshed")]
    pub last_refreshed: String,
}

/// Daily bar; Alpha Vantage quotes every value as a decimal string.
#[derive(Serialize, Deserialize, Debug)]
pub struct DailyBar {
    #[serde(rename = "1. open")]
    pub open: String,
    #[serde(rename = "2. high")]
    pub high: String,
    #[serde(rename = "3. low")]
    pub low: String,
    #[serde(rename = "4. close")]
    pub close: String,
    #[serde(rename = "5. volume", default)]
    pub volume: Option<String>,
}

impl TimeSeriesDailyResponse {
    /// Turns the response into the most recent `days` closes, ascending.
    ///
    /// Error payloads arrive with a success status and no series; they are
    /// mapped to `RateLimited` or `Api` here.
    pub fn into_price_series(self, days: usize) -> Result<PriceSeries, TimeSeriesError> {
        if let Some(message) = self.error_message {
            return Err(TimeSeriesError::Api(message));
        }

        let Some(time_series) = self.time_series else {
            return Err(match self.note.or(self.information) {
                Some(message) if message.to_lowercase().contains("rate limit") => {
                    TimeSeriesError::RateLimited(message)
                }
                Some(message) => TimeSeriesError::Api(message),
                None => TimeSeriesError::MissingSeries,
            });
        };

        let closes = time_series
            .into_iter()
            .map(|(date, bar)| match bar.close.trim().parse::<f64>() {
                Ok(close) => Ok((date, close)),
                Err(_) => Err(TimeSeriesError::InvalidClose {
                    date,
                    value: bar.close,
                }),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(PriceSeries::from_daily_closes(closes)?.most_recent(days)?)
    }
}

pub struct TimeSeriesDaily;

impl Method for TimeSeriesDaily {
    const FUNCTION: &'static str = "TIME_SERIES_DAILY";

    type Response = TimeSeriesDailyResponse;
    type Params = TimeSeriesDailyParams;
}
