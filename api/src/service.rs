use common::{
    models::{CoinSnapshot, Currency, Exchange, MarketAnalysis, WatchList},
    Error, Result,
};
use connectors::MarketAnalyzer;
use market::{Aggregator, PollConfig, Poller, Snapshot};
use std::sync::Arc;
use tracing::{debug, info};

/// Inputs for one analysis call, captured so the lock is not held while the
/// collaborator runs.
pub struct AnalysisRequest {
    pub analyzer: Arc<dyn MarketAnalyzer>,
    pub coins: Vec<CoinSnapshot>,
    pub currency: Currency,
    pub exchange: Exchange,
}

/// Service owning the poller and the user's dashboard configuration
pub struct MarketService {
    aggregator: Arc<Aggregator>,
    poller: Poller,
    analyzer: Option<Arc<dyn MarketAnalyzer>>,
    /// Last analysis, valid until currency or exchange changes
    analysis: Option<MarketAnalysis>,
}

impl MarketService {
    pub fn new(
        aggregator: Arc<Aggregator>,
        poller: Poller,
        analyzer: Option<Arc<dyn MarketAnalyzer>>,
    ) -> Self {
        Self {
            aggregator,
            poller,
            analyzer,
            analysis: None,
        }
    }

    /// Placeholder snapshot, no network
    pub fn initial_snapshot(&self, currency: Currency, symbols: &WatchList) -> Vec<CoinSnapshot> {
        self.aggregator.initial(currency, symbols)
    }

    /// Handle for running aggregate cycles outside the poller's cadence
    pub fn aggregator(&self) -> Arc<Aggregator> {
        self.aggregator.clone()
    }

    pub fn latest(&self) -> Snapshot {
        self.poller.latest()
    }

    pub fn config(&self) -> Result<PollConfig> {
        self.poller
            .config()
            .ok_or_else(|| Error::InternalError("Poller has not been configured".to_string()))
    }

    pub fn configure(&mut self, config: PollConfig) {
        if let Ok(current) = self.config() {
            if current.currency != config.currency || current.exchange != config.exchange {
                debug!("Currency or exchange changed, dropping cached analysis");
                self.analysis = None;
            }
        }
        self.poller.configure(config);
    }

    pub fn add_symbol(&mut self, symbol: &str) -> Result<PollConfig> {
        let mut config = self.config()?;
        config.watch_list.add(symbol)?;
        info!("Watch-list is now {}", config.watch_list);
        self.configure(config.clone());
        Ok(config)
    }

    pub fn remove_symbol(&mut self, symbol: &str) -> Result<PollConfig> {
        let mut config = self.config()?;
        config.watch_list.remove(symbol)?;
        info!("Watch-list is now {}", config.watch_list);
        self.configure(config.clone());
        Ok(config)
    }

    pub fn shutdown(&mut self) {
        self.poller.stop();
    }

    pub fn analysis(&self) -> Result<MarketAnalysis> {
        self.analysis
            .clone()
            .ok_or_else(|| Error::NotFound("No analysis has been generated yet".to_string()))
    }

    pub fn analysis_request(&self) -> Result<AnalysisRequest> {
        let analyzer = self
            .analyzer
            .clone()
            .ok_or_else(|| Error::ConfigError("Market analysis is not configured".to_string()))?;

        let snapshot = self.poller.latest();
        let config = snapshot
            .config
            .ok_or_else(|| Error::InternalError("Poller has not been configured".to_string()))?;

        if !snapshot.live {
            return Err(Error::Conflict("Market data is still loading".to_string()));
        }
        if snapshot.coins.is_empty() {
            return Err(Error::AnalysisError("No coins to analyze".to_string()));
        }

        Ok(AnalysisRequest {
            analyzer,
            coins: snapshot.coins,
            currency: config.currency,
            exchange: config.exchange,
        })
    }

    /// Caches `analysis` unless the configuration moved on while it was produced.
    pub fn store_analysis(&mut self, request: &AnalysisRequest, analysis: MarketAnalysis) {
        match self.config() {
            Ok(config)
                if config.currency == request.currency && config.exchange == request.exchange =>
            {
                self.analysis = Some(analysis);
            }
            _ => debug!("Configuration changed during analysis, not caching result"),
        }
    }
}
