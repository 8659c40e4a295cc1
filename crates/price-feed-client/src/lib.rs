use analysis_core::{AnalysisError, PriceFeed, PricePoint, Timeframe};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

const DEFAULT_BASE_URL: &str = "https://public-api.birdeye.so";
const DEFAULT_RATE_LIMIT: u32 = 100;
const MAX_ATTEMPTS: u32 = 3;
const FIRST_BACKOFF: Duration = Duration::from_secs(2);

/// Spaces request starts evenly so no more than `per_minute` begin in a minute.
struct RequestPacer {
    interval: Duration,
    next_slot: Mutex<Instant>,
}

impl RequestPacer {
    fn per_minute(per_minute: u32) -> Self {
        Self {
            interval: Duration::from_secs(60) / per_minute.max(1),
            next_slot: Mutex::new(Instant::now()),
        }
    }

    /// Reserve the next free slot and sleep until it arrives
    async fn wait_turn(&self) {
        let slot = {
            let mut next = self.next_slot.lock().await;
            let slot = (*next).max(Instant::now());
            *next = slot + self.interval;
            slot
        };

        if slot > Instant::now() {
            tracing::debug!("Pacing price feed request for {}ms", (slot - Instant::now()).as_millis());
            tokio::time::sleep_until(slot).await;
        }
    }
}

fn api_error(e: impl std::fmt::Display) -> AnalysisError {
    AnalysisError::ApiError(e.to_string())
}

/// HTTP client for the token price history endpoint
#[derive(Clone)]
pub struct PriceFeedClient {
    api_key: String,
    base_url: String,
    client: Client,
    pacer: Arc<RequestPacer>,
}

impl PriceFeedClient {
    pub fn new(api_key: String) -> Self {
        // Requests per minute; free-tier keys should set a lower value.
        let rate_limit = std::env::var("PRICE_FEED_RATE_LIMIT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_RATE_LIMIT);

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            client,
            pacer: Arc::new(RequestPacer::per_minute(rate_limit)),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Paced send that backs off and retries while the feed answers 429.
    async fn send_paced(&self, request: RequestBuilder) -> Result<Response, AnalysisError> {
        let mut backoff = FIRST_BACKOFF;

        for attempt in 1..=MAX_ATTEMPTS {
            let attempt_request = request
                .try_clone()
                .ok_or_else(|| api_error("request body cannot be replayed"))?;

            self.pacer.wait_turn().await;
            let response = attempt_request.send().await.map_err(api_error)?;
            if response.status() != StatusCode::TOO_MANY_REQUESTS {
                return Ok(response);
            }

            if attempt < MAX_ATTEMPTS {
                tracing::warn!(
                    "Price feed throttled (attempt {}/{}), backing off {}s",
                    attempt,
                    MAX_ATTEMPTS,
                    backoff.as_secs()
                );
                tokio::time::sleep(backoff).await;
                backoff *= 2;
            }
        }

        Err(api_error(format!("price feed still throttling after {} attempts", MAX_ATTEMPTS)))
    }

    /// Get the price history of a token for one timeframe
    pub async fn get_history_price(
        &self,
        address: &str,
        timeframe: Timeframe,
        from_unix: i64,
        to_unix: i64,
    ) -> Result<Vec<PricePoint>, AnalysisError> {
        let url = format!("{}/defi/history_price", self.base_url);
        let from = from_unix.to_string();
        let to = to_unix.to_string();

        let response = self
            .send_paced(
                self.client
                    .get(&url)
                    .header("X-API-KEY", &self.api_key)
                    .header("accept", "application/json")
                    .query(&[
                        ("address", address),
                        ("address_type", "token"),
                        ("type", timeframe.feed_id()),
                        ("time_from", from.as_str()),
                        ("time_to", to.as_str()),
                    ]),
            )
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(api_error(format!("HTTP {}: {}", status, body)));
        }

        let history: HistoryResponse = response.json().await.map_err(api_error)?;
        history.into_points()
    }
}

#[async_trait]
impl PriceFeed for PriceFeedClient {
    async fn price_history(
        &self,
        address: &str,
        timeframe: Timeframe,
        from_unix: i64,
        to_unix: i64,
    ) -> Result<Vec<PricePoint>, AnalysisError> {
        self.get_history_price(address, timeframe, from_unix, to_unix).await
    }
}

// Response types

#[derive(Debug, Deserialize)]
struct HistoryResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<HistoryData>,
}

#[derive(Debug, Deserialize)]
struct HistoryData {
    #[serde(default)]
    items: Vec<HistoryItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HistoryItem {
    unix_time: i64,
    value: f64,
}

impl HistoryResponse {
    /// Points sorted ascending by timestamp
    fn into_points(self) -> Result<Vec<PricePoint>, AnalysisError> {
        if !self.success {
            return Err(AnalysisError::InvalidData(
                self.message
                    .unwrap_or_else(|| "price feed reported failure".to_string()),
            ));
        }

        let mut points: Vec<PricePoint> = self
            .data
            .map(|d| d.items)
            .unwrap_or_default()
            .into_iter()
            .map(|item| PricePoint::new(item.unix_time, item.value))
            .collect();
        points.sort_by_key(|p| p.timestamp);
        Ok(points)
    }
}
