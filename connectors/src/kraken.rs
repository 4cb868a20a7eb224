use crate::config::{ConnectorConfig, KRAKEN_API_URL};
use crate::http::{cell_price, get_text, parse_decimal};
use crate::{ExchangeConnector, FetchResult};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use common::{
    models::{CoinSnapshot, Exchange, HistoryPoint, TradingPair, HISTORY_LEN},
    FetchError, Result,
};
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, error};

/// Hourly candles
const OHLC_INTERVAL_MINUTES: u32 = 60;

/// Secondary exchange. Pairs are queried one per request and failures are
/// reported inside a 200 response's `error` array.
pub struct KrakenConnector {
    client: reqwest::Client,
    base_url: String,
}

impl KrakenConnector {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &ConnectorConfig) -> Result<Self> {
        Ok(Self::new(config.http_client()?, config.kraken_url.clone()))
    }
}

impl Default for KrakenConnector {
    fn default() -> Self {
        Self::new(reqwest::Client::new(), KRAKEN_API_URL)
    }
}

#[derive(Debug, Deserialize)]
struct KrakenResponse<T> {
    #[serde(default)]
    error: Vec<String>,
    result: Option<T>,
}

#[derive(Debug, Deserialize)]
struct KrakenTicker {
    /// Last trade closed: [price, lot volume]
    c: Option<Vec<String>>,
    /// Today's opening price
    o: Option<String>,
}

fn classify_errors(errors: &[String]) -> FetchError {
    let detail = errors.join("; ");
    error!("Kraken API error: {}", detail);

    if errors.iter().any(|e| e.starts_with("EQuery:Unknown asset pair")) {
        FetchError::NotFound(detail)
    } else if errors
        .iter()
        .any(|e| e.contains("Rate limit") || e.contains("Too many requests"))
    {
        FetchError::RateLimited(detail)
    } else if errors.iter().any(|e| e.starts_with("EGeneral:Invalid arguments")) {
        FetchError::NotFound(detail)
    } else {
        // EService:Unavailable, EService:Busy, EGeneral:Internal error
        FetchError::Transient(detail)
    }
}

fn unwrap_result<T>(response: KrakenResponse<T>) -> FetchResult<T> {
    if !response.error.is_empty() {
        return Err(classify_errors(&response.error));
    }
    response
        .result
        .ok_or_else(|| FetchError::Malformed("response has neither result nor error".to_string()))
}

pub(crate) fn parse_ticker(body: &str, pair: &TradingPair) -> FetchResult<CoinSnapshot> {
    let response: KrakenResponse<HashMap<String, KrakenTicker>> = serde_json::from_str(body)?;

    // keyed by Kraken's legacy name (XXBTZUSD for XBTUSD), one entry per request
    let ticker = unwrap_result(response)?
        .into_values()
        .next()
        .ok_or_else(|| FetchError::NotFound(format!("no ticker for {}", pair.id)))?;

    let last = ticker.c.as_ref().and_then(|c| c.first()).map(String::as_str);
    let price = parse_decimal("c", last)?;
    let open = parse_decimal("o", ticker.o.as_deref())?;

    if open <= 0.0 {
        return Err(FetchError::Malformed(format!(
            "{} opening price is not positive",
            pair.id
        )));
    }
    let change = (price - open) / open * 100.0;

    CoinSnapshot::new(pair, price, change)
}

// Kraken returns {"result": {"XXBTZUSD": [[time, open, high, low, close, vwap, volume, count], ...], "last": 1717455600}}
pub(crate) fn parse_ohlc(body: &str) -> FetchResult<Vec<HistoryPoint>> {
    let response: KrakenResponse<HashMap<String, serde_json::Value>> = serde_json::from_str(body)?;
    let result = unwrap_result(response)?;

    let candles = result
        .into_iter()
        .filter(|(key, _)| key != "last")
        .find_map(|(_, value)| match value {
            serde_json::Value::Array(rows) => Some(rows),
            _ => None,
        })
        .ok_or_else(|| FetchError::Malformed("no candle series in OHLC result".to_string()))?;

    let mut points = Vec::with_capacity(candles.len());
    for candle in candles {
        let row = match candle.as_array() {
            Some(row) if row.len() >= 5 => row,
            _ => continue,
        };

        let time = match row[0].as_i64().and_then(|s| Utc.timestamp_opt(s, 0).single()) {
            Some(time) => time,
            None => continue,
        };

        let price = match cell_price(&row[4]) {
            Some(price) => price,
            None => continue,
        };

        points.push(HistoryPoint { time, price });
    }

    points.sort_by(|a, b| a.time.cmp(&b.time));
    if points.len() > HISTORY_LEN {
        points.drain(..points.len() - HISTORY_LEN);
    }
    Ok(points)
}

#[async_trait]
impl ExchangeConnector for KrakenConnector {
    fn exchange(&self) -> Exchange {
        Exchange::Kraken
    }

    async fn fetch_one(&self, pair: &TradingPair) -> FetchResult<CoinSnapshot> {
        let url = format!("{}/Ticker", self.base_url);
        debug!("Fetching ticker from Kraken for {}", pair.id);

        let body = get_text(&self.client, &url, &[("pair", pair.id.clone())]).await?;
        parse_ticker(&body, pair)
    }

    async fn fetch_history(&self, pair: &TradingPair) -> FetchResult<Vec<HistoryPoint>> {
        let url = format!("{}/OHLC", self.base_url);
        debug!("Fetching hourly OHLC from Kraken for {}", pair.id);

        let params = [
            ("pair", pair.id.clone()),
            ("interval", OHLC_INTERVAL_MINUTES.to_string()),
        ];
        let body = get_text(&self.client, &url, &params).await?;
        parse_ohlc(&body)
    }
}
