use meridian_email::{MailConfig, DEFAULT_RELAY};
use meridian_indicator_engine::IndicatorParams;
use std::path::PathBuf;
use std::time::Duration;

/// Number of daily closes analysed per asset.
pub const LOOKBACK_DAYS: usize = 180;

/// Upper bound for any single HTTP request or SMTP exchange.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Where an asset's prices come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetKind {
    /// Alpha Vantage daily series, e.g. `XAUUSD`.
    Commodity { symbol: String },
    /// CoinGecko coin id, e.g. `bitcoin`.
    Crypto { coin_id: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    pub name: String,
    pub kind: AssetKind,
}

impl Asset {
    pub fn commodity(name: &str, symbol: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: AssetKind::Commodity {
                symbol: symbol.to_string(),
            },
        }
    }

    pub fn crypto(name: &str, coin_id: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: AssetKind::Crypto {
                coin_id: coin_id.to_string(),
            },
        }
    }
}

pub fn default_assets() -> Vec<Asset> {
    vec![
        Asset::commodity("Gold", "XAUUSD"),
        Asset::crypto("Bitcoin", "bitcoin"),
        Asset::crypto("Ethereum", "ethereum"),
    ]
}

/// Run configuration, loaded once at startup and read-only afterwards.
#[derive(Debug, Clone)]
pub struct Config {
    pub alpha_vantage_key: Option<String>,
    pub mail: Option<MailConfig>,
    pub chart_dir: PathBuf,
    pub lookback_days: usize,
    pub indicator_params: IndicatorParams,
    pub assets: Vec<Asset>,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from a key lookup; blank values count as unset.
    ///
    /// A mail account missing half of its credentials is dropped with a
    /// warning, so reports still reach the console.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let mail = match (get("GMAIL_USER"), get("GMAIL_PASS")) {
            (Some(username), Some(password)) => Some(MailConfig {
                username,
                password,
                recipient: get("ALERT_RECIPIENT"),
                relay: get("SMTP_RELAY").unwrap_or_else(|| DEFAULT_RELAY.to_string()),
            }),
            (Some(_), None) => {
                tracing::warn!("GMAIL_USER is set without GMAIL_PASS, alerts will not be mailed");
                None
            }
            (None, Some(_)) => {
                tracing::warn!("GMAIL_PASS is set without GMAIL_USER, alerts will not be mailed");
                None
            }
            (None, None) => None,
        };

        Self {
            alpha_vantage_key: get("ALPHA_VANTAGE_API_KEY"),
            mail,
            chart_dir: get("CHART_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(".")),
            lookback_days: LOOKBACK_DAYS,
            indicator_params: IndicatorParams::default(),
            assets: default_assets(),
        }
    }
}
