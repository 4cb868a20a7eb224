use common::FetchError;
use reqwest::{header::RETRY_AFTER, StatusCode};
use tracing::{debug, error, warn};

/// Request weight Binance reports as spent in the current minute
const BINANCE_USED_WEIGHT: &str = "x-mbx-used-weight-1m";

/// Issues a GET and returns the body of a successful response.
///
/// Non-success statuses are classified into `FetchError` kinds; transport
/// failures (including the client timeout) come back as `Transient`.
pub(crate) async fn get_text(
    client: &reqwest::Client,
    url: &str,
    query: &[(&str, String)],
) -> Result<String, FetchError> {
    debug!("GET {} {:?}", url, query);

    let response = client.get(url).query(query).send().await?;
    let status = response.status();
    let retry_after = header_value(&response, RETRY_AFTER.as_str());
    if let Some(weight) = header_value(&response, BINANCE_USED_WEIGHT) {
        debug!("Binance request weight used: {}", weight);
    }
    let body = response.text().await?;

    if !status.is_success() {
        let err = classify_status(status, &body, retry_after.as_deref());
        match &err {
            FetchError::RateLimited(detail) => warn!("Exchange rate limit hit: {}", detail),
            _ => error!("Exchange API error: {} - {}", status, body),
        }
        return Err(err);
    }

    Ok(body)
}

fn header_value(response: &reqwest::Response, name: &str) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.trim().to_string())
}

pub(crate) fn classify_status(status: StatusCode, body: &str, retry_after: Option<&str>) -> FetchError {
    let detail = format!("{} - {}", status, body);
    match status.as_u16() {
        404 => FetchError::NotFound(detail),
        // Binance answers unknown pairs with 400 and code -1121
        400 if body.contains("-1121") || body.contains("Invalid symbol") => {
            FetchError::NotFound(detail)
        }
        403 | 418 | 429 => match retry_after {
            Some(secs) => FetchError::RateLimited(format!("{} (retry after {}s)", detail, secs)),
            None => FetchError::RateLimited(detail),
        },
        s if s >= 500 => FetchError::Transient(detail),
        _ => FetchError::NotFound(detail),
    }
}

/// Parses a decimal field, refusing to substitute zero for missing data.
pub(crate) fn parse_decimal(field: &str, value: Option<&str>) -> Result<f64, FetchError> {
    let raw = value.ok_or_else(|| FetchError::Malformed(format!("missing field {}", field)))?;
    let parsed = raw
        .trim()
        .parse::<f64>()
        .map_err(|e| FetchError::Malformed(format!("field {} = {:?}: {}", field, raw, e)))?;

    if !parsed.is_finite() {
        return Err(FetchError::Malformed(format!("field {} is not finite", field)));
    }
    Ok(parsed)
}

/// Reads a price out of a candle cell, which exchanges send as a string or a number.
pub(crate) fn cell_price(cell: &serde_json::Value) -> Option<f64> {
    let price = match cell {
        serde_json::Value::String(s) => s.parse::<f64>().ok(),
        other => other.as_f64(),
    };
    price.filter(|p| p.is_finite() && *p > 0.0)
}
