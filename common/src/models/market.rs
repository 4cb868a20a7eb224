use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

use crate::Error;

/// Display currency every price is quoted in.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Currency {
    #[serde(rename = "USD")]
    Usd,
    #[serde(rename = "EUR")]
    Eur,
}

impl Currency {
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
        }
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "USD" => Ok(Currency::Usd),
            "EUR" => Ok(Currency::Eur),
            other => Err(Error::ParseError(format!(
                "Unknown currency: {}. Supported currencies: USD, EUR",
                other
            ))),
        }
    }
}

/// Exchange identifiers
///
/// Binance is the primary source, Kraken the secondary. Whichever one is
/// selected, the other serves as its fallback.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Exchange {
    #[serde(rename = "BINANCE")]
    Binance,
    #[serde(rename = "KRAKEN")]
    Kraken,
}

impl Exchange {
    pub const PRIMARY: Exchange = Exchange::Binance;
    pub const SECONDARY: Exchange = Exchange::Kraken;

    /// The exchange consulted when a lookup on `self` fails.
    pub fn fallback(&self) -> Exchange {
        match self {
            Exchange::Binance => Exchange::Kraken,
            Exchange::Kraken => Exchange::Binance,
        }
    }

    /// Default refresh cadence. Kraken is queried one pair per request, so it
    /// gets the longer interval.
    pub fn default_poll_interval(&self) -> Duration {
        match self {
            Exchange::Binance => Duration::from_secs(5),
            Exchange::Kraken => Duration::from_secs(10),
        }
    }
}

impl std::fmt::Display for Exchange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Exchange::Binance => write!(f, "binance"),
            Exchange::Kraken => write!(f, "kraken"),
        }
    }
}

impl FromStr for Exchange {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "binance" | "primary" => Ok(Exchange::Binance),
            "kraken" | "secondary" => Ok(Exchange::Kraken),
            other => Err(Error::ParseError(format!(
                "Unknown exchange: {}. Supported exchanges: binance, kraken",
                other
            ))),
        }
    }
}
