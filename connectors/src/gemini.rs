//! Gemini-backed market analysis.

use crate::MarketAnalyzer;
use async_trait::async_trait;
use common::{
    models::{CoinSnapshot, Currency, MarketAnalysis},
    Error, Result,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_MODEL: &str = "gemini-2.5-flash";

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl GeminiConfig {
    /// `None` when `GEMINI_API_KEY` is unset; analysis is then unavailable.
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("GEMINI_API_KEY").ok().filter(|k| !k.is_empty())?;
        let model = std::env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        Some(Self {
            api_key,
            model,
            base_url: GEMINI_API_URL.to_string(),
            timeout: Duration::from_secs(30),
        })
    }
}

pub struct GeminiAnalyzer {
    client: reqwest::Client,
    config: GeminiConfig,
}

impl GeminiAnalyzer {
    pub fn new(config: GeminiConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(Error::HttpError)?;
        Ok(Self { client, config })
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Serialize, Deserialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Content,
}

pub(crate) fn build_prompt(coins: &[CoinSnapshot], currency: Currency) -> String {
    let lines: Vec<String> = coins
        .iter()
        .map(|c| {
            format!(
                "- {} ({}): {:.2} {} ({:+.2}% 24h)",
                c.name, c.symbol, c.current_price, currency, c.change_24h
            )
        })
        .collect();

    format!(
        "You are a cryptocurrency market analyst. Current prices in {}:\n{}\n\n\
         Reply with a JSON object with the fields \"sentiment\" (one of \"bullish\", \
         \"bearish\", \"neutral\"), \"summary\" (two or three sentences on the overall \
         market) and \"keyLevels\" (notable support and resistance levels).",
        currency,
        lines.join("\n")
    )
}

pub(crate) fn parse_analysis(text: &str) -> Result<MarketAnalysis> {
    // models occasionally wrap JSON in a markdown fence
    let trimmed = text
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();

    serde_json::from_str(trimmed)
        .map_err(|e| Error::AnalysisError(format!("Unexpected analysis payload: {}", e)))
}

#[async_trait]
impl MarketAnalyzer for GeminiAnalyzer {
    async fn analyze(&self, coins: &[CoinSnapshot], currency: Currency) -> Result<MarketAnalysis> {
        if coins.is_empty() {
            return Err(Error::AnalysisError("No coins to analyze".to_string()));
        }

        let url = format!(
            "{}/models/{}:generateContent",
            self.config.base_url, self.config.model
        );
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: build_prompt(coins, currency),
                }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
            },
        };

        debug!("Requesting market analysis for {} coins", coins.len());

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.config.api_key)
            .json(&request)
            .send()
            .await?
            .error_for_status()
            .map_err(|e| Error::AnalysisError(e.to_string()))?
            .json::<GenerateResponse>()
            .await?;

        let text = response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .ok_or_else(|| Error::AnalysisError("Empty analysis response".to_string()))?;

        parse_analysis(&text)
    }
}
