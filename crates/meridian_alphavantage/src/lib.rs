pub mod method;
pub mod time_series_daily;

use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use reqwest::{Client, ClientBuilder};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

pub const QUERY_URL: &str = "https://www.alphavantage.co/query";

pub struct AlphaVantageClient {
    api_key: String,
    reqwest: Client,
}

impl AlphaVantageClient {
    pub fn new(api_key: &str, timeout: Duration) -> reqwest::Result<Self> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let reqwest = ClientBuilder::new()
            .default_headers(default_headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            api_key: api_key.to_string(),
            reqwest,
        })
    }

    pub(crate) async fn get<R: DeserializeOwned, P: Serialize + ?Sized>(
        &self,
        function: &str,
        params: &P,
    ) -> reqwest::Result<R> {
        let response = self
            .reqwest
            .get(QUERY_URL)
            .query(&[("function", function), ("apikey", self.api_key.as_str())])
            .query(params)
            .send()
            .await?;
        let response = response.error_for_status()?;

        response.json().await
    }

    /// Alpha Vantage reports most failures with a 200 status; inspect the
    /// response body before trusting it.
    pub async fn call<M: method::Method>(&self, params: M::Params) -> reqwest::Result<M::Response> {
        self.get(M::FUNCTION, &params).await
    }
}
