use common::{
    models::{Currency, Exchange, WatchList},
    Error, Result,
};
use connectors::ConnectorConfig;
use std::time::Duration;

use crate::poller::PollConfig;

/// Refresh cadence per exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollIntervals {
    pub binance: Duration,
    pub kraken: Duration,
}

impl Default for PollIntervals {
    fn default() -> Self {
        Self {
            binance: Exchange::Binance.default_poll_interval(),
            kraken: Exchange::Kraken.default_poll_interval(),
        }
    }
}

impl PollIntervals {
    pub fn for_exchange(&self, exchange: Exchange) -> Duration {
        match exchange {
            Exchange::Binance => self.binance,
            Exchange::Kraken => self.kraken,
        }
    }
}

/// Configuration for market data acquisition
#[derive(Debug, Clone)]
pub struct MarketConfig {
    pub connectors: ConnectorConfig,
    pub intervals: PollIntervals,
    /// Configuration the poller starts with
    pub initial: PollConfig,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            connectors: ConnectorConfig::default(),
            intervals: PollIntervals::default(),
            initial: PollConfig {
                currency: Currency::Usd,
                exchange: Exchange::PRIMARY,
                watch_list: WatchList::parse("BTC,ETH,XRP"),
            },
        }
    }
}

fn env_millis(name: &str) -> Option<Duration> {
    std::env::var(name)
        .ok()
        .and_then(|ms| ms.parse().ok())
        .map(Duration::from_millis)
}

impl MarketConfig {
    /// Create a new market configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let intervals = PollIntervals {
            binance: env_millis("BINANCE_POLL_MS").unwrap_or(defaults.intervals.binance),
            kraken: env_millis("KRAKEN_POLL_MS").unwrap_or(defaults.intervals.kraken),
        };

        let currency = match std::env::var("DEFAULT_CURRENCY") {
            Ok(code) => code.parse()?,
            Err(_) => defaults.initial.currency,
        };
        let exchange = match std::env::var("DEFAULT_EXCHANGE") {
            Ok(name) => name.parse()?,
            Err(_) => defaults.initial.exchange,
        };
        let watch_list = std::env::var("DEFAULT_SYMBOLS")
            .map(|csv| WatchList::parse(&csv))
            .unwrap_or(defaults.initial.watch_list);

        let config = Self {
            connectors: ConnectorConfig::from_env(),
            intervals,
            initial: PollConfig {
                currency,
                exchange,
                watch_list,
            },
        };
        config.validate()?;
        Ok(config)
    }

    /// Every request must time out before the next poll is due.
    pub fn validate(&self) -> Result<()> {
        for exchange in [Exchange::Binance, Exchange::Kraken] {
            let interval = self.intervals.for_exchange(exchange);
            if self.connectors.timeout >= interval {
                return Err(Error::ConfigError(format!(
                    "request timeout {:?} must be shorter than the {} poll interval {:?}",
                    self.connectors.timeout, exchange, interval
                )));
            }
        }

        if self.initial.watch_list.is_empty() {
            return Err(Error::ConfigError(
                "DEFAULT_SYMBOLS must name at least one symbol".to_string(),
            ));
        }

        Ok(())
    }
}
