//! HTTP client for the deal-finder backend.
//!
//! Discovery comes in two transports for the same data: a batch JSON
//! endpoint (`/glitches`) that resolves in one response, and an SSE
//! endpoint (`/glitches/stream`) that emits items incrementally with
//! progress markers. Verification (`/verify`) and category metadata
//! (`/categories/{name}`) are batch only.
//!
//! Wire types are deliberately loose (`#[serde(default)]` everywhere) —
//! the backend is not strict about fields. Callers validate before letting
//! anything cross into domain types.

pub mod error;
mod sse;

pub use error::{GlitchApiError, Result};
pub use sse::StreamEvent;

use std::time::Duration;

use futures::stream::BoxStream;
use serde::Deserialize;
use tracing::info;

// --- Wire types ---

/// Raw item shape as the backend returns it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WireItem {
    pub url: String,
    pub name: String,
    pub description: String,
    pub store: String,
    pub category: String,
    pub savings_percentage: f64,
    pub discounted_price: Option<f64>,
    pub next_best_price: Option<WirePriceQuote>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WirePriceQuote {
    pub price: f64,
    pub store: String,
}

/// Raw verification response. `status` is `"available"` or anything else.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WireVerification {
    pub status: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WireCategoryInfo {
    pub name: String,
    pub label: String,
    pub item_count: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GlitchesResponse {
    items: Vec<WireItem>,
}

// --- Client ---

#[derive(Clone)]
pub struct GlitchApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl GlitchApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Fetch deal candidates for one (category, keyword, site) probe.
    pub async fn fetch_glitches(
        &self,
        category: &str,
        keyword: &str,
        site: &str,
    ) -> Result<Vec<WireItem>> {
        info!(category, keyword, site, "Fetching glitches");

        let resp = self
            .client
            .get(format!("{}/glitches", self.base_url))
            .query(&[("category", category), ("q", keyword), ("site", site)])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(GlitchApiError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let data: GlitchesResponse = resp
            .json()
            .await
            .map_err(|e| GlitchApiError::Decode(e.to_string()))?;

        info!(category, keyword, site, count = data.items.len(), "Glitches fetched");
        Ok(data.items)
    }

    /// Check whether a deal URL is still live.
    pub async fn verify_item(&self, url: &str) -> Result<WireVerification> {
        info!(url, "Verifying item");

        let resp = self
            .client
            .get(format!("{}/verify", self.base_url))
            .query(&[("url", url)])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(GlitchApiError::Api {
                status: status.as_u16(),
                message,
            });
        }

        resp.json()
            .await
            .map_err(|e| GlitchApiError::Decode(e.to_string()))
    }

    /// Optional category metadata. `None` when the backend has nothing
    /// useful to say — a missing or malformed response is not an error.
    pub async fn category_info(&self, category: &str) -> Result<Option<WireCategoryInfo>> {
        let resp = self
            .client
            .get(format!("{}/categories/{category}", self.base_url))
            .send()
            .await?;

        if !resp.status().is_success() {
            return Ok(None);
        }

        Ok(resp.json().await.ok())
    }

    /// Open the SSE discovery stream for one probe. Yields events until the
    /// backend signals `finished` or the connection ends.
    pub async fn stream_glitches(
        &self,
        category: &str,
        keyword: &str,
        site: &str,
    ) -> Result<BoxStream<'static, Result<StreamEvent>>> {
        info!(category, keyword, site, "Opening glitch stream");

        let resp = self
            .client
            .get(format!("{}/glitches/stream", self.base_url))
            .query(&[("category", category), ("q", keyword), ("site", site)])
            .header("Accept", "text/event-stream")
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(GlitchApiError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(Box::pin(async_stream::try_stream! {
            let mut resp = resp;
            let mut buf = String::new();
            'read: while let Some(chunk) = resp.chunk().await? {
                let text = String::from_utf8_lossy(&chunk).into_owned();
                for payload in sse::drain_data_lines(&mut buf, &text) {
                    let event: StreamEvent = serde_json::from_str(&payload)
                        .map_err(|e| GlitchApiError::Decode(e.to_string()))?;
                    let finished = event.finished;
                    yield event;
                    if finished {
                        break 'read;
                    }
                }
            }
        }))
    }
}
