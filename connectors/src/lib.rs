pub mod binance;
pub mod config;
pub mod gemini;
mod http;
pub mod kraken;
pub mod resolver;

use async_trait::async_trait;
use common::{
    models::{CoinSnapshot, Currency, Exchange, HistoryPoint, MarketAnalysis, TradingPair},
    FetchError, Result,
};

pub use binance::BinanceConnector;
pub use config::ConnectorConfig;
pub use gemini::{GeminiAnalyzer, GeminiConfig};
pub use kraken::KrakenConnector;
pub use resolver::{Listing, SymbolResolver};

pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// Trait defining the interface for exchange API clients
///
/// Implementations are stateless apart from their HTTP client and safe to
/// call concurrently.
#[async_trait]
pub trait ExchangeConnector: Send + Sync {
    fn exchange(&self) -> Exchange;

    /// Current price and 24h change for a resolved pair, without history
    async fn fetch_one(&self, pair: &TradingPair) -> FetchResult<CoinSnapshot>;

    /// Short hourly look-back for the sparkline, oldest first
    async fn fetch_history(&self, pair: &TradingPair) -> FetchResult<Vec<HistoryPoint>>;
}

/// Opaque market-sentiment collaborator
#[async_trait]
pub trait MarketAnalyzer: Send + Sync {
    async fn analyze(&self, coins: &[CoinSnapshot], currency: Currency) -> Result<MarketAnalysis>;
}
