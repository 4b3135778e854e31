pub mod market_chart;
pub mod method;

use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use reqwest::{Client, ClientBuilder};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

pub const BASE_URL: &str = "https://api.coingecko.com/api/v3";

pub struct CoinGeckoClient {
    reqwest: Client,
}

impl CoinGeckoClient {
    pub fn new(timeout: Duration) -> reqwest::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let reqwest = ClientBuilder::new()
            .default_headers(headers)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;

        Ok(Self { reqwest })
    }

    pub(crate) async fn get<T: DeserializeOwned, P: Serialize + ?Sized>(
        &self,
        url: &str,
        params: &P,
    ) -> reqwest::Result<T> {
        let response = self
            .reqwest
            .get(url)
            .query(params)
            .send()
            .await?
            .error_for_status()?
            .json::<T>()
            .await?;

        Ok(response)
    }

    pub async fn call<M: method::Method>(&self, params: M::Params) -> reqwest::Result<M::Response> {
        self.get(&M::url(&params), &params).await
    }
}
