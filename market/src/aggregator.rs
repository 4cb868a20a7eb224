use common::{
    models::{CoinSnapshot, Currency, Exchange, WatchList},
    FetchError, Result,
};
use connectors::{
    BinanceConnector, ConnectorConfig, ExchangeConnector, KrakenConnector, SymbolResolver,
};
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::placeholder;

/// Why a symbol could not be served by one exchange.
#[derive(Debug)]
enum LookupFailure {
    Unsupported,
    Fetch(FetchError),
}

impl std::fmt::Display for LookupFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LookupFailure::Unsupported => write!(f, "unsupported"),
            LookupFailure::Fetch(e) => write!(f, "{}: {}", e.kind(), e),
        }
    }
}

/// Fans a watch-list out across both exchanges and assembles one ordered snapshot.
pub struct Aggregator {
    resolver: Arc<SymbolResolver>,
    binance: Arc<dyn ExchangeConnector>,
    kraken: Arc<dyn ExchangeConnector>,
}

impl Aggregator {
    pub fn new(
        resolver: Arc<SymbolResolver>,
        binance: Arc<dyn ExchangeConnector>,
        kraken: Arc<dyn ExchangeConnector>,
    ) -> Self {
        Self {
            resolver,
            binance,
            kraken,
        }
    }

    /// Live connectors with the built-in listing catalog.
    pub fn from_config(config: &ConnectorConfig) -> Result<Self> {
        Ok(Self::new(
            Arc::new(SymbolResolver::new()),
            Arc::new(BinanceConnector::from_config(config)?),
            Arc::new(KrakenConnector::from_config(config)?),
        ))
    }

    pub fn resolver(&self) -> &SymbolResolver {
        &self.resolver
    }

    fn connector(&self, exchange: Exchange) -> &dyn ExchangeConnector {
        match exchange {
            Exchange::Binance => self.binance.as_ref(),
            Exchange::Kraken => self.kraken.as_ref(),
        }
    }

    /// Zero-network snapshot for the same watch-list.
    pub fn initial(&self, currency: Currency, symbols: &WatchList) -> Vec<CoinSnapshot> {
        placeholder::initial(&self.resolver, currency, symbols)
    }

    /// Runs one poll cycle.
    ///
    /// Every symbol is looked up concurrently; the result keeps watch-list
    /// order and simply omits symbols neither exchange could serve. This
    /// never fails: an empty vector is a valid outcome.
    pub async fn aggregate(
        &self,
        symbols: &WatchList,
        currency: Currency,
        primary: Exchange,
    ) -> Vec<CoinSnapshot> {
        let lookups = symbols
            .iter()
            .map(|symbol| self.lookup(symbol, currency, primary));

        let coins: Vec<CoinSnapshot> = join_all(lookups).await.into_iter().flatten().collect();

        info!(
            "Aggregated {}/{} symbols in {} from {}",
            coins.len(),
            symbols.len(),
            currency,
            primary
        );
        coins
    }

    async fn lookup(&self, symbol: &str, currency: Currency, primary: Exchange) -> Option<CoinSnapshot> {
        let failure = match self.fetch_from(symbol, currency, primary).await {
            Ok(coin) => return Some(coin),
            Err(failure) => failure,
        };

        // any primary failure is fallback-eligible
        let secondary = primary.fallback();
        debug!(
            "{} unavailable on {} ({}), trying {}",
            symbol, primary, failure, secondary
        );

        match self.fetch_from(symbol, currency, secondary).await {
            Ok(coin) => {
                debug!("{} served by fallback {}", symbol, secondary);
                Some(coin)
            }
            Err(fallback_failure) => {
                warn!(
                    "Dropping {} from snapshot: {} on {}, {} on {}",
                    symbol, failure, primary, fallback_failure, secondary
                );
                None
            }
        }
    }

    async fn fetch_from(
        &self,
        symbol: &str,
        currency: Currency,
        exchange: Exchange,
    ) -> std::result::Result<CoinSnapshot, LookupFailure> {
        let pair = self
            .resolver
            .resolve(symbol, currency, exchange)
            .ok_or(LookupFailure::Unsupported)?;

        let connector = self.connector(exchange);
        let coin = connector
            .fetch_one(&pair)
            .await
            .map_err(LookupFailure::Fetch)?;

        // a missing sparkline never costs the coin its entry
        let history = match connector.fetch_history(&pair).await {
            Ok(history) => history,
            Err(e) => {
                debug!("No history for {} on {}: {}", pair.id, exchange, e);
                Vec::new()
            }
        };

        Ok(coin.with_history(history))
    }
}
