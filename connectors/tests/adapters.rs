//! Exchange adapters against an in-process fixture server.

use axum::{
    extract::Query,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use common::{
    models::{CoinSnapshot, Currency, Exchange},
    FetchError,
};
use connectors::{
    BinanceConnector, ConnectorConfig, ExchangeConnector, KrakenConnector, SymbolResolver,
};
use std::collections::HashMap;
use std::time::Duration;

const BINANCE_BTC: &str = r#"{"symbol":"BTCUSDT","priceChangePercent":"2.150","lastPrice":"67012.50000000","volume":"1.0"}"#;
const BINANCE_KLINES: &str = r#"[
    [1717444800000,"66000.0","66120.0","65900.0","66100.0","12.0",1717448399999,"0",1,"0","0","0"],
    [1717448400000,"66100.0","66200.0","66000.0","66150.5","10.0",1717451999999,"0",1,"0","0","0"]
]"#;
const KRAKEN_XMR: &str = r#"{"error":[],"result":{"XXMRZUSD":{"c":["165.00","0.5"],"o":"150.00"}}}"#;
const KRAKEN_XMR_OHLC: &str = r#"{"error":[],"result":{"XXMRZUSD":[[1717444800,"150","151","149","150.5","150","10",3],[1717448400,"150.5","166","150","165.0","160","12",4]],"last":1717448400}}"#;

type Params = Query<HashMap<String, String>>;

async fn binance_ticker(Query(params): Params) -> Response {
    match params.get("symbol").map(String::as_str) {
        Some("BTCUSDT") => (StatusCode::OK, BINANCE_BTC).into_response(),
        Some("SLOWUSDT") => {
            tokio::time::sleep(Duration::from_secs(2)).await;
            (StatusCode::OK, BINANCE_BTC).into_response()
        }
        Some("BUSYUSDT") => (
            StatusCode::TOO_MANY_REQUESTS,
            [(header::RETRY_AFTER, "30")],
            "",
        )
            .into_response(),
        Some("DOWNUSDT") => (StatusCode::SERVICE_UNAVAILABLE, "maintenance").into_response(),
        Some("JUNKUSDT") => (StatusCode::OK, "<html>oops</html>").into_response(),
        _ => (
            StatusCode::BAD_REQUEST,
            r#"{"code":-1121,"msg":"Invalid symbol."}"#,
        )
            .into_response(),
    }
}

async fn binance_klines(Query(params): Params) -> Response {
    match (params.get("symbol"), params.get("interval"), params.get("limit")) {
        (Some(symbol), Some(interval), Some(limit))
            if symbol == "BTCUSDT" && interval == "1h" && limit == "24" =>
        {
            (StatusCode::OK, BINANCE_KLINES).into_response()
        }
        _ => (StatusCode::BAD_REQUEST, "unexpected query").into_response(),
    }
}

async fn kraken_ticker(Query(params): Params) -> Response {
    match params.get("pair").map(String::as_str) {
        Some("XMRUSD") => (StatusCode::OK, KRAKEN_XMR).into_response(),
        Some("ETHUSD") => {
            (StatusCode::OK, r#"{"error":["EAPI:Rate limit exceeded"]}"#).into_response()
        }
        _ => (StatusCode::OK, r#"{"error":["EQuery:Unknown asset pair"]}"#).into_response(),
    }
}

async fn kraken_ohlc(Query(params): Params) -> Response {
    match (params.get("pair"), params.get("interval")) {
        (Some(pair), Some(interval)) if pair == "XMRUSD" && interval == "60" => {
            (StatusCode::OK, KRAKEN_XMR_OHLC).into_response()
        }
        _ => (StatusCode::OK, r#"{"error":["EGeneral:Invalid arguments"]}"#).into_response(),
    }
}

async fn spawn_fixture_server() -> ConnectorConfig {
    let app = Router::new()
        .route("/binance/ticker/24hr", get(binance_ticker))
        .route("/binance/klines", get(binance_klines))
        .route("/kraken/Ticker", get(kraken_ticker))
        .route("/kraken/OHLC", get(kraken_ohlc));

    let server = axum::Server::bind(&"127.0.0.1:0".parse().unwrap()).serve(app.into_make_service());
    let addr = server.local_addr();
    tokio::spawn(server);

    ConnectorConfig {
        binance_url: format!("http://{}/binance", addr),
        kraken_url: format!("http://{}/kraken/", addr),
        timeout: Duration::from_millis(300),
    }
}

#[tokio::test]
async fn binance_fetches_ticker_and_history() {
    let config = spawn_fixture_server().await;
    let binance = BinanceConnector::from_config(&config).unwrap();
    let pair = SymbolResolver::new()
        .resolve("BTC", Currency::Usd, Exchange::Binance)
        .unwrap();

    let coin = binance.fetch_one(&pair).await.unwrap();
    assert_eq!(coin.symbol, "BTC");
    assert_eq!(coin.name, "Bitcoin");
    assert_eq!(coin.current_price, 67012.5);
    assert_eq!(coin.change_24h, 2.15);

    let history = binance.fetch_history(&pair).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[1].price, 66150.5);
}

async fn fetch_usd(binance: &BinanceConnector, symbol: &str) -> Result<CoinSnapshot, FetchError> {
    let pair = SymbolResolver::new()
        .resolve(symbol, Currency::Usd, Exchange::Binance)
        .unwrap();
    binance.fetch_one(&pair).await
}

#[tokio::test]
async fn binance_errors_are_classified() {
    let config = spawn_fixture_server().await;
    let binance = BinanceConnector::from_config(&config).unwrap();

    assert!(matches!(fetch_usd(&binance, "ZZZ").await, Err(FetchError::NotFound(_))));
    match fetch_usd(&binance, "BUSY").await {
        Err(FetchError::RateLimited(detail)) => assert!(detail.contains("retry after 30s")),
        other => panic!("expected RateLimited, got {:?}", other),
    }
    assert!(matches!(fetch_usd(&binance, "DOWN").await, Err(FetchError::Transient(_))));
    assert!(matches!(fetch_usd(&binance, "JUNK").await, Err(FetchError::Malformed(_))));
}

#[tokio::test]
async fn timed_out_request_is_transient() {
    let config = spawn_fixture_server().await;
    let binance = BinanceConnector::from_config(&config).unwrap();
    let started = std::time::Instant::now();
    let result = fetch_usd(&binance, "SLOW").await;

    assert!(matches!(result, Err(FetchError::Transient(_))));
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn kraken_fetches_ticker_and_history() {
    let config = spawn_fixture_server().await;
    let kraken = KrakenConnector::from_config(&config).unwrap();
    let pair = SymbolResolver::new()
        .resolve("XMR", Currency::Usd, Exchange::Kraken)
        .unwrap();

    let coin = kraken.fetch_one(&pair).await.unwrap();
    assert_eq!(coin.name, "Monero");
    assert_eq!(coin.current_price, 165.0);
    assert!((coin.change_24h - 10.0).abs() < 1e-9);

    let history = kraken.fetch_history(&pair).await.unwrap();
    assert_eq!(history.len(), 2);
    assert!(history[0].time < history[1].time);
}

#[tokio::test]
async fn kraken_error_arrays_are_classified() {
    let config = spawn_fixture_server().await;
    let kraken = KrakenConnector::from_config(&config).unwrap();
    let resolver = SymbolResolver::new();

    let sol = resolver.resolve("SOL", Currency::Usd, Exchange::Kraken).unwrap();
    assert!(matches!(kraken.fetch_one(&sol).await, Err(FetchError::NotFound(_))));
    assert!(matches!(kraken.fetch_history(&sol).await, Err(FetchError::NotFound(_))));

    let eth = resolver.resolve("ETH", Currency::Usd, Exchange::Kraken).unwrap();
    assert!(matches!(kraken.fetch_one(&eth).await, Err(FetchError::RateLimited(_))));
}
