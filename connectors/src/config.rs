use common::{Error, Result};
use std::time::Duration;

pub const BINANCE_API_URL: &str = "https://api.binance.com/api/v3";
pub const KRAKEN_API_URL: &str = "https://api.kraken.com/0/public";

/// Configuration shared by the exchange connectors
#[derive(Debug, Clone)]
pub struct ConnectorConfig {
    pub binance_url: String,
    pub kraken_url: String,
    /// Upper bound for every exchange request
    pub timeout: Duration,
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        Self {
            binance_url: BINANCE_API_URL.to_string(),
            kraken_url: KRAKEN_API_URL.to_string(),
            timeout: Duration::from_millis(4000),
        }
    }
}

impl ConnectorConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let binance_url = std::env::var("BINANCE_API_URL").unwrap_or(defaults.binance_url);
        let kraken_url = std::env::var("KRAKEN_API_URL").unwrap_or(defaults.kraken_url);
        let timeout = std::env::var("EXCHANGE_TIMEOUT_MS")
            .ok()
            .and_then(|ms| ms.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.timeout);

        Self {
            binance_url,
            kraken_url,
            timeout,
        }
    }

    /// HTTP client with the request timeout applied.
    pub fn http_client(&self) -> Result<reqwest::Client> {
        if self.timeout.is_zero() {
            return Err(Error::ConfigError(
                "EXCHANGE_TIMEOUT_MS must be greater than zero".to_string(),
            ));
        }

        reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(concat!("coinwatch/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(Error::HttpError)
    }
}
