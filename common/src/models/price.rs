use crate::models::{Currency, Exchange};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum number of sparkline samples kept per coin (one day of hourly closes).
pub const HISTORY_LEN: usize = 24;

/// Exchange-specific market for one symbol in one currency.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct TradingPair {
    pub exchange: Exchange,
    /// Canonical uppercase ticker (e.g., BTC)
    pub symbol: String,
    /// Human-readable name, falls back to the symbol
    pub name: String,
    pub currency: Currency,
    /// Identifier the exchange expects (e.g., BTCUSDT, XBTEUR)
    pub id: String,
}

/// Price history point
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryPoint {
    pub time: DateTime<Utc>,
    pub price: f64,
}
