use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use common::{
    models::{CoinSnapshot, Currency, Exchange, MarketAnalysis, WatchList},
    Error as CommonError,
};
use market::{PollConfig, Snapshot};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error};

use crate::service::MarketService;

pub type SharedService = Arc<RwLock<MarketService>>;

// Create a wrapper for our common::Error type
#[derive(Debug)]
pub struct ApiError(CommonError);

impl From<CommonError> for ApiError {
    fn from(err: CommonError) -> Self {
        ApiError(err)
    }
}

// Convert our API error wrapper to an Axum response
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self.0 {
            CommonError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            CommonError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            CommonError::ParseError(msg) => (StatusCode::BAD_REQUEST, msg),
            CommonError::ExchangeError(e) => (StatusCode::BAD_GATEWAY, e.to_string()),
            CommonError::HttpError(e) => (
                StatusCode::BAD_GATEWAY,
                format!("External API request failed: {}", e),
            ),
            CommonError::AnalysisError(msg) => (StatusCode::BAD_GATEWAY, msg),
            // only raised at runtime for collaborators left unconfigured
            CommonError::ConfigError(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            CommonError::InternalError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        if status.is_server_error() {
            error!("Request failed: {} - {}", status, message);
        }

        #[derive(Serialize)]
        struct ErrorResponse {
            error: String,
        }

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

/// Configuration as exchanged with the UI
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigBody {
    pub currency: Currency,
    pub exchange: Exchange,
    pub symbols: WatchList,
}

impl From<PollConfig> for ConfigBody {
    fn from(config: PollConfig) -> Self {
        Self {
            currency: config.currency,
            exchange: config.exchange,
            symbols: config.watch_list,
        }
    }
}

impl From<ConfigBody> for PollConfig {
    fn from(body: ConfigBody) -> Self {
        Self {
            currency: body.currency,
            exchange: body.exchange,
            watch_list: body.symbols,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotResponse {
    pub generation: u64,
    pub config: Option<ConfigBody>,
    pub live: bool,
    pub updated_at: Option<DateTime<Utc>>,
    pub coins: Vec<CoinSnapshot>,
}

impl From<Snapshot> for SnapshotResponse {
    fn from(snapshot: Snapshot) -> Self {
        Self {
            generation: snapshot.generation,
            config: snapshot.config.map(ConfigBody::from),
            live: snapshot.live,
            updated_at: snapshot.updated_at,
            coins: snapshot.coins,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SnapshotQuery {
    pub currency: Option<String>,
    pub exchange: Option<String>,
    /// Comma separated, e.g. `BTC,ETH`
    pub symbols: Option<String>,
}

impl SnapshotQuery {
    /// Fills omitted parameters from the active configuration.
    fn resolve(&self, active: PollConfig) -> Result<PollConfig, CommonError> {
        let currency = match self.currency.as_deref() {
            Some(code) => code.parse()?,
            None => active.currency,
        };
        let exchange = match self.exchange.as_deref() {
            Some(name) => name.parse()?,
            None => active.exchange,
        };
        let watch_list = match self.symbols.as_deref() {
            Some(csv) => WatchList::parse(csv),
            None => active.watch_list,
        };

        if watch_list.is_empty() {
            return Err(CommonError::ParseError(
                "At least one symbol is required".to_string(),
            ));
        }

        Ok(PollConfig {
            currency,
            exchange,
            watch_list,
        })
    }
}

// Placeholder snapshot for the given (or active) configuration
pub async fn get_initial_snapshot(
    State(service): State<SharedService>,
    Query(query): Query<SnapshotQuery>,
) -> Result<Json<Vec<CoinSnapshot>>, ApiError> {
    let service = service.read().await;
    let config = query.resolve(service.config()?)?;

    Ok(Json(
        service.initial_snapshot(config.currency, &config.watch_list),
    ))
}

// Run one aggregate cycle on demand
pub async fn poll_snapshot(
    State(service): State<SharedService>,
    Query(query): Query<SnapshotQuery>,
) -> Result<Json<Vec<CoinSnapshot>>, ApiError> {
    // the lock is released before any exchange is contacted
    let (aggregator, config) = {
        let service = service.read().await;
        (service.aggregator(), query.resolve(service.config()?)?)
    };

    debug!(
        "On-demand poll of {} in {} from {}",
        config.watch_list, config.currency, config.exchange
    );

    let coins = aggregator
        .aggregate(&config.watch_list, config.currency, config.exchange)
        .await;
    Ok(Json(coins))
}

// Latest snapshot published by the poller
pub async fn get_snapshot(State(service): State<SharedService>) -> Json<SnapshotResponse> {
    let service = service.read().await;
    Json(service.latest().into())
}

pub async fn get_config(
    State(service): State<SharedService>,
) -> Result<Json<ConfigBody>, ApiError> {
    let service = service.read().await;
    Ok(Json(service.config()?.into()))
}

pub async fn put_config(
    State(service): State<SharedService>,
    Json(body): Json<ConfigBody>,
) -> Result<Json<ConfigBody>, ApiError> {
    if body.symbols.is_empty() {
        return Err(CommonError::ParseError("At least one symbol is required".to_string()).into());
    }

    let mut service = service.write().await;
    service.configure(body.clone().into());
    Ok(Json(body))
}

pub async fn add_symbol(
    State(service): State<SharedService>,
    Path(symbol): Path<String>,
) -> Result<Json<ConfigBody>, ApiError> {
    let mut service = service.write().await;
    Ok(Json(service.add_symbol(&symbol)?.into()))
}

pub async fn remove_symbol(
    State(service): State<SharedService>,
    Path(symbol): Path<String>,
) -> Result<Json<ConfigBody>, ApiError> {
    let mut service = service.write().await;
    Ok(Json(service.remove_symbol(&symbol)?.into()))
}

pub async fn get_analysis(
    State(service): State<SharedService>,
) -> Result<Json<MarketAnalysis>, ApiError> {
    let service = service.read().await;
    Ok(Json(service.analysis()?))
}

// Ask the analysis collaborator about the latest snapshot
pub async fn run_analysis(
    State(service): State<SharedService>,
) -> Result<Json<MarketAnalysis>, ApiError> {
    // the lock is released while the collaborator runs
    let request = service.read().await.analysis_request()?;
    let analysis = request
        .analyzer
        .analyze(&request.coins, request.currency)
        .await?;

    service.write().await.store_analysis(&request, analysis.clone());
    Ok(Json(analysis))
}
