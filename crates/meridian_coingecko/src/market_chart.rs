use crate::BASE_URL;
use crate::method::Method;
use bon::Builder;
use chrono::{DateTime, NaiveDate};
use meridian_shared_models::{PriceSeries, SeriesError};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Builder)]
#[builder(on(String, into))]
pub struct MarketChartParams {
    /// CoinGecko coin id, e.g. `bitcoin`. Sent as a path segment.
    #[serde(skip)]
    pub coin_id: String,

    pub vs_currency: String,
    pub days: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval: Option<String>,
}

/// `[timestamp_ms, value]` pairs, oldest first.
#[derive(Serialize, Deserialize, Debug)]
pub struct CoinGeckoMarketChartResponse {
    pub prices: Vec<(f64, f64)>,
    #[serde(default)]
    pub market_caps: Vec<(f64, f64)>,
    #[serde(default)]
    pub total_volumes: Vec<(f64, f64)>,
}

impl CoinGeckoMarketChartResponse {
    /// Price samples keyed by their UTC calendar date.
    ///
    /// Samples whose timestamp is out of range are skipped.
    pub fn daily_closes(&self) -> impl Iterator<Item = (NaiveDate, f64)> + '_ {
        self.prices.iter().filter_map(|&(timestamp_ms, price)| {
            DateTime::from_timestamp_millis(timestamp_ms as i64)
                .map(|datetime| (datetime.date_naive(), price))
        })
    }

    /// The most recent `days` daily closes, ascending by date.
    ///
    /// CoinGecko appends the current intraday price after the daily samples;
    /// when it falls on an already present date it replaces that close.
    pub fn to_price_series(&self, days: usize) -> Result<PriceSeries, SeriesError> {
        PriceSeries::from_daily_closes(self.daily_closes())?.most_recent(days)
    }
}

pub struct MarketChart;

impl Method for MarketChart {
    type Response = CoinGeckoMarketChartResponse;
    type Params = MarketChartParams;

    fn url(params: &Self::Params) -> String {
        format!("{BASE_URL}/coins/{}/market_chart", params.coin_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coin_id_is_a_path_segment() {
        let params = MarketChartParams::builder()
            .coin_id("ethereum")
            .vs_currency("usd")
            .days(180)
            .interval("daily")
            .build();

        assert_eq!(
            MarketChart::url(&params),
            "https://api.coingecko.com/api/v3/coins/ethereum/market_chart"
        );

        let query = serde_json::to_value(&params).unwrap();
        assert!(query.get("coin_id").is_none());
        assert_eq!(query["vs_currency"], "usd");
        assert_eq!(query["days"], 180);
        assert_eq!(query["interval"], "daily");
    }
}
