//! Scripted exchanges for aggregator and poller tests.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use common::{
    models::{CoinSnapshot, Currency, Exchange, HistoryPoint, TradingPair},
    FetchError,
};
use connectors::{ExchangeConnector, FetchResult, Listing, SymbolResolver};
use market::Aggregator;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
struct Script {
    outcome: Result<f64, FetchError>,
    delay: Duration,
    history_fails: bool,
}

/// Exchange that answers from a per-symbol script.
///
/// EUR prices are twice the USD price, so tests can tell which
/// configuration produced a snapshot.
pub struct MockExchange {
    exchange: Exchange,
    scripts: HashMap<String, Script>,
    calls: AtomicUsize,
}

impl MockExchange {
    pub fn new(exchange: Exchange) -> Self {
        Self {
            exchange,
            scripts: HashMap::new(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn price(mut self, symbol: &str, price: f64) -> Self {
        self.scripts.insert(
            symbol.to_string(),
            Script {
                outcome: Ok(price),
                delay: Duration::ZERO,
                history_fails: false,
            },
        );
        self
    }

    pub fn error(mut self, symbol: &str, error: FetchError) -> Self {
        self.scripts.insert(
            symbol.to_string(),
            Script {
                outcome: Err(error),
                delay: Duration::ZERO,
                history_fails: false,
            },
        );
        self
    }

    pub fn delay(mut self, symbol: &str, delay: Duration) -> Self {
        if let Some(script) = self.scripts.get_mut(symbol) {
            script.delay = delay;
        }
        self
    }

    pub fn without_history(mut self, symbol: &str) -> Self {
        if let Some(script) = self.scripts.get_mut(symbol) {
            script.history_fails = true;
        }
        self
    }

    /// Number of `fetch_one` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ExchangeConnector for MockExchange {
    fn exchange(&self) -> Exchange {
        self.exchange
    }

    async fn fetch_one(&self, pair: &TradingPair) -> FetchResult<CoinSnapshot> {
        assert_eq!(pair.exchange, self.exchange, "pair resolved for the wrong exchange");
        self.calls.fetch_add(1, Ordering::SeqCst);

        let script = self
            .scripts
            .get(&pair.symbol)
            .cloned()
            .ok_or_else(|| FetchError::NotFound(pair.id.clone()))?;

        tokio::time::sleep(script.delay).await;

        let factor = match pair.currency {
            Currency::Usd => 1.0,
            Currency::Eur => 2.0,
        };
        let price = script.outcome?;
        CoinSnapshot::new(pair, price * factor, 1.5)
    }

    async fn fetch_history(&self, pair: &TradingPair) -> FetchResult<Vec<HistoryPoint>> {
        match self.scripts.get(&pair.symbol) {
            Some(script) if !script.history_fails => {
                let start = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
                Ok((0..3)
                    .map(|i| HistoryPoint {
                        time: start + ChronoDuration::hours(i),
                        price: 10.0 + i as f64,
                    })
                    .collect())
            }
            _ => Err(FetchError::Transient("history unavailable".to_string())),
        }
    }
}

const BOTH: &[Currency] = &[Currency::Usd, Currency::Eur];

/// BTC, SOL and DOGE on both exchanges, ETH and XMR on Kraken only, BNB on
/// Binance only. Anything else is unsupported everywhere.
pub fn resolver() -> Arc<SymbolResolver> {
    Arc::new(SymbolResolver::from_listings(
        vec![
            Listing::new("BTC", "Bitcoin").binance(BOTH).kraken(BOTH).kraken_base("XBT"),
            Listing::new("SOL", "Solana").binance(BOTH).kraken(BOTH),
            Listing::new("DOGE", "Dogecoin").binance(BOTH).kraken(BOTH).kraken_base("XDG"),
            Listing::new("ETH", "Ethereum").kraken(BOTH),
            Listing::new("XMR", "Monero").kraken(BOTH),
            Listing::new("BNB", "BNB").binance(BOTH),
        ],
        false,
    ))
}

pub fn aggregator(binance: Arc<MockExchange>, kraken: Arc<MockExchange>) -> Arc<Aggregator> {
    Arc::new(Aggregator::new(resolver(), binance, kraken))
}

pub fn symbols(coins: &[CoinSnapshot]) -> Vec<&str> {
    coins.iter().map(|c| c.symbol.as_str()).collect()
}
