use crate::config::{ConnectorConfig, BINANCE_API_URL};
use crate::http::{cell_price, get_text, parse_decimal};
use crate::{ExchangeConnector, FetchResult};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use common::{
    models::{CoinSnapshot, Exchange, HistoryPoint, TradingPair, HISTORY_LEN},
    Result,
};
use serde::Deserialize;
use tracing::debug;

/// Primary exchange. A single request returns price and 24h change.
pub struct BinanceConnector {
    client: reqwest::Client,
    base_url: String,
}

impl BinanceConnector {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &ConnectorConfig) -> Result<Self> {
        Ok(Self::new(config.http_client()?, config.binance_url.clone()))
    }
}

impl Default for BinanceConnector {
    fn default() -> Self {
        Self::new(reqwest::Client::new(), BINANCE_API_URL)
    }
}

#[derive(Debug, Deserialize)]
struct Binance24hTicker {
    #[serde(rename = "lastPrice")]
    last_price: Option<String>,
    #[serde(rename = "priceChangePercent")]
    price_change_percent: Option<String>,
}

pub(crate) fn parse_ticker(body: &str, pair: &TradingPair) -> FetchResult<CoinSnapshot> {
    let ticker: Binance24hTicker = serde_json::from_str(body)?;

    let price = parse_decimal("lastPrice", ticker.last_price.as_deref())?;
    let change = parse_decimal("priceChangePercent", ticker.price_change_percent.as_deref())?;

    CoinSnapshot::new(pair, price, change)
}

// Binance returns an array of arrays:
// [
//   [
//     1499040000000,      // Open time
//     "0.01634790",       // Open
//     "0.80000000",       // High
//     "0.01575800",       // Low
//     "0.01577100",       // Close
//     "148976.11427815",  // Volume
//     ...
//   ]
// ]
pub(crate) fn parse_klines(body: &str) -> FetchResult<Vec<HistoryPoint>> {
    let candles: Vec<Vec<serde_json::Value>> = serde_json::from_str(body)?;

    let mut points = Vec::with_capacity(candles.len());
    for candle in candles {
        if candle.len() < 5 {
            continue;
        }

        let time = match candle[0].as_i64().and_then(|ms| Utc.timestamp_millis_opt(ms).single()) {
            Some(time) => time,
            None => continue,
        };

        let price = match cell_price(&candle[4]) {
            Some(price) => price,
            None => continue,
        };

        points.push(HistoryPoint { time, price });
    }

    points.sort_by(|a, b| a.time.cmp(&b.time));
    Ok(points)
}

#[async_trait]
impl ExchangeConnector for BinanceConnector {
    fn exchange(&self) -> Exchange {
        Exchange::Binance
    }

    async fn fetch_one(&self, pair: &TradingPair) -> FetchResult<CoinSnapshot> {
        let url = format!("{}/ticker/24hr", self.base_url);
        debug!("Fetching 24hr ticker from Binance for {}", pair.id);

        let body = get_text(&self.client, &url, &[("symbol", pair.id.clone())]).await?;
        parse_ticker(&body, pair)
    }

    async fn fetch_history(
        &self,
        pair: &TradingPair,
    ) -> FetchResult<Vec<HistoryPoint>> {
        let url = format!("{}/klines", self.base_url);
        debug!("Fetching hourly klines from Binance for {}", pair.id);

        let params = [
            ("symbol", pair.id.clone()),
            ("interval", "1h".to_string()),
            ("limit", HISTORY_LEN.to_string()),
        ];
        let body = get_text(&self.client, &url, &params).await?;
        parse_klines(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{models::Currency, FetchError};

    fn pair() -> TradingPair {
        TradingPair {
            exchange: Exchange::Binance,
            symbol: "BTC".to_string(),
            name: "Bitcoin".to_string(),
            currency: Currency::Usd,
            id: "BTCUSDT".to_string(),
        }
    }

    const TICKER: &str = r#"{
        "symbol": "BTCUSDT",
        "priceChange": "-1021.37000000",
        "priceChangePercent": "-1.523",
        "weightedAvgPrice": "66457.61734563",
        "prevClosePrice": "67063.98000000",
        "lastPrice": "66042.61000000",
        "lastQty": "0.00112000",
        "openPrice": "67063.98000000",
        "volume": "22614.31628000",
        "openTime": 1717372800000,
        "closeTime": 1717459199999,
        "count": 3146020
    }"#;

    #[test]
    fn parses_recorded_ticker() {
        let coin = parse_ticker(TICKER, &pair()).unwrap();
        assert_eq!(coin.symbol, "BTC");
        assert_eq!(coin.current_price, 66042.61);
        assert_eq!(coin.change_24h, -1.523);
        assert!(coin.history.is_empty());
    }

    #[test]
    fn missing_or_garbage_fields_are_malformed() {
        let missing = r#"{"symbol":"BTCUSDT","priceChangePercent":"1.0"}"#;
        assert!(matches!(parse_ticker(missing, &pair()), Err(FetchError::Malformed(_))));

        let garbage = r#"{"lastPrice":"n/a","priceChangePercent":"1.0"}"#;
        assert!(matches!(parse_ticker(garbage, &pair()), Err(FetchError::Malformed(_))));

        let zero = r#"{"lastPrice":"0.00000000","priceChangePercent":"0.0"}"#;
        assert!(matches!(parse_ticker(zero, &pair()), Err(FetchError::Malformed(_))));

        assert!(matches!(parse_ticker("<html>", &pair()), Err(FetchError::Malformed(_))));
    }

    #[test]
    fn parses_klines_oldest_first_and_skips_broken_rows() {
        let body = r#"[
            [1717448400000, "66100.0", "66200.0", "66000.0", "66150.5", "10.0"],
            [1717444800000, "66000.0", "66120.0", "65900.0", "66100.0", "12.0"],
            [1717452000000, "66150.5", "66300.0", "66100.0", "not-a-number", "9.0"],
            ["bad-time", "1", "1", "1", "1", "1"],
            [1717455600000]
        ]"#;

        let points = parse_klines(body).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].price, 66100.0);
        assert_eq!(points[1].price, 66150.5);
        assert!(points[0].time < points[1].time);
    }

    #[test]
    fn klines_body_must_be_an_array() {
        let err = parse_klines(r#"{"code":-1121,"msg":"Invalid symbol."}"#).unwrap_err();
        assert!(matches!(err, FetchError::Malformed(_)));
    }
}
