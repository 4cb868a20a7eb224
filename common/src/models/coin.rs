use crate::models::{HistoryPoint, TradingPair, HISTORY_LEN};
use crate::FetchError;
use serde::{Deserialize, Serialize};

/// One symbol's market state as published to the UI.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CoinSnapshot {
    /// Lowercase symbol, used as the UI key
    pub id: String,
    /// Canonical uppercase ticker
    pub symbol: String,
    pub name: String,
    /// Price in the active display currency
    pub current_price: f64,
    /// 24h change in percent
    pub change_24h: f64,
    /// Chronological, at most `HISTORY_LEN` samples
    pub history: Vec<HistoryPoint>,
    pub color: String,
}

impl CoinSnapshot {
    /// Builds a live entry, rejecting values no exchange should produce.
    pub fn new(pair: &TradingPair, current_price: f64, change_24h: f64) -> Result<Self, FetchError> {
        if !current_price.is_finite() || current_price <= 0.0 {
            return Err(FetchError::Malformed(format!(
                "{} price is not a positive number: {}",
                pair.id, current_price
            )));
        }
        if !change_24h.is_finite() {
            return Err(FetchError::Malformed(format!(
                "{} 24h change is not finite",
                pair.id
            )));
        }

        Ok(Self {
            id: pair.symbol.to_lowercase(),
            symbol: pair.symbol.clone(),
            name: pair.name.clone(),
            current_price,
            change_24h,
            history: Vec::new(),
            color: color_for(&pair.symbol),
        })
    }

    /// Zero-valued entry rendered before the first live fetch settles.
    pub fn placeholder(symbol: &str, name: &str) -> Self {
        Self {
            id: symbol.to_lowercase(),
            symbol: symbol.to_string(),
            name: name.to_string(),
            current_price: 0.0,
            change_24h: 0.0,
            history: Vec::new(),
            color: color_for(symbol),
        }
    }

    /// Attaches history, sorted oldest first and trimmed to the newest `HISTORY_LEN` samples.
    pub fn with_history(mut self, mut history: Vec<HistoryPoint>) -> Self {
        history.sort_by(|a, b| a.time.cmp(&b.time));
        if history.len() > HISTORY_LEN {
            history.drain(..history.len() - HISTORY_LEN);
        }
        self.history = history;
        self
    }
}

const BRAND_COLORS: &[(&str, &str)] = &[
    ("BTC", "#F7931A"),
    ("ETH", "#627EEA"),
    ("XRP", "#23292F"),
    ("SOL", "#14F195"),
    ("ADA", "#0033AD"),
    ("DOGE", "#C2A633"),
    ("DOT", "#E6007A"),
    ("LTC", "#345D9D"),
    ("BNB", "#F3BA2F"),
    ("XMR", "#FF6600"),
];

const PALETTE: &[&str] = &[
    "#3B82F6", "#10B981", "#F59E0B", "#EF4444", "#8B5CF6", "#EC4899", "#14B8A6", "#F97316",
];

/// Deterministic presentation color for a symbol, so refreshes never flicker.
pub fn color_for(symbol: &str) -> String {
    if let Some((_, color)) = BRAND_COLORS.iter().find(|(s, _)| *s == symbol) {
        return color.to_string();
    }

    // FNV-1a; std's hasher is not stable across releases
    let hash = symbol.bytes().fold(0x811c9dc5u32, |acc, b| {
        (acc ^ b as u32).wrapping_mul(0x0100_0193)
    });
    PALETTE[hash as usize % PALETTE.len()].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Currency, Exchange};
    use chrono::{Duration, TimeZone, Utc};

    fn pair() -> TradingPair {
        TradingPair {
            exchange: Exchange::Binance,
            symbol: "BTC".to_string(),
            name: "Bitcoin".to_string(),
            currency: Currency::Usd,
            id: "BTCUSDT".to_string(),
        }
    }

    #[test]
    fn rejects_non_positive_or_non_finite_prices() {
        assert!(matches!(
            CoinSnapshot::new(&pair(), 0.0, 1.0),
            Err(FetchError::Malformed(_))
        ));
        assert!(CoinSnapshot::new(&pair(), f64::NAN, 1.0).is_err());
        assert!(CoinSnapshot::new(&pair(), 10.0, f64::INFINITY).is_err());

        let coin = CoinSnapshot::new(&pair(), 64000.5, -2.5).unwrap();
        assert_eq!(coin.id, "btc");
        assert_eq!(coin.color, "#F7931A");
    }

    #[test]
    fn history_is_chronological_and_bounded() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let history: Vec<_> = (0..30)
            .rev()
            .map(|i| HistoryPoint {
                time: start + Duration::hours(i),
                price: i as f64,
            })
            .collect();

        let coin = CoinSnapshot::new(&pair(), 1.0, 0.0).unwrap().with_history(history);

        assert_eq!(coin.history.len(), HISTORY_LEN);
        assert_eq!(coin.history.first().unwrap().price, 6.0);
        assert_eq!(coin.history.last().unwrap().price, 29.0);
        assert!(coin.history.windows(2).all(|w| w[0].time < w[1].time));
    }

    #[test]
    fn color_is_stable_per_symbol() {
        assert_eq!(color_for("ZZZ"), color_for("ZZZ"));
        assert!(PALETTE.contains(&color_for("NEWCOIN").as_str()));
    }

    #[test]
    fn serializes_camel_case() {
        let json = serde_json::to_value(CoinSnapshot::placeholder("ETH", "Ethereum")).unwrap();
        assert_eq!(json["currentPrice"], 0.0);
        assert_eq!(json["change24h"], 0.0);
        assert_eq!(json["id"], "eth");
    }
}
