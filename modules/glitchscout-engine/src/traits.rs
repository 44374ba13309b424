// Trait abstractions for the pipeline's two remote collaborators.
//
// DiscoveryClient yields zero or more items and then completes; an
// implementation may resolve in one burst (batch JSON) or incrementally
// (SSE). The sweep only relies on "zero or more items, then done" and
// never assumes either shape.
// VerificationClient answers one availability check per item URL.
//
// Both are implemented for GlitchApiClient below, and by scripted doubles
// in `testing` for deterministic tests: no network, no backend.

use anyhow::Result;
use async_trait::async_trait;
use futures::future;
use futures::stream::{self, BoxStream, StreamExt};
use tracing::warn;

use glitchapi_client::{GlitchApiClient, StreamEvent, WireItem};
use glitchscout_common::{DealItem, GlitchScoutError, PriceQuote, VerificationOutcome};

/// One event on a discovery probe.
#[derive(Debug, Clone)]
pub enum DiscoveryEvent {
    /// A discovered candidate.
    Item(DealItem),
    /// Human-readable progress marker from the source.
    Progress(String),
    /// End of this probe. Nothing meaningful follows.
    Finished,
}

pub type DiscoveryStream = BoxStream<'static, Result<DiscoveryEvent>>;

#[async_trait]
pub trait DiscoveryClient: Send + Sync {
    /// Probe one (category, keyword, site) combination.
    async fn discover(&self, category: &str, keyword: &str, site: &str)
        -> Result<DiscoveryStream>;
}

#[async_trait]
pub trait VerificationClient: Send + Sync {
    /// Confirm that a deal URL is still live.
    async fn verify(&self, url: &str) -> Result<VerificationOutcome>;
}

// ---------------------------------------------------------------------------
// GlitchApiClient adapters
// ---------------------------------------------------------------------------

/// Validate a wire item into a domain item. Items without a parseable
/// http(s) URL are dropped — the URL is the item's identity and everything
/// downstream keys on it.
pub fn deal_item_from_wire(wire: WireItem) -> Option<DealItem> {
    let parsed = url::Url::parse(&wire.url).ok()?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return None;
    }
    Some(DealItem {
        url: wire.url,
        name: wire.name,
        description: wire.description,
        store: wire.store,
        category: wire.category,
        savings_percentage: wire.savings_percentage,
        discounted_price: wire.discounted_price,
        next_best: wire.next_best_price.map(|q| PriceQuote {
            price: q.price,
            store: q.store,
        }),
    })
}

fn item_event(wire: WireItem) -> Option<DiscoveryEvent> {
    let url = wire.url.clone();
    match deal_item_from_wire(wire) {
        Some(item) => Some(DiscoveryEvent::Item(item)),
        None => {
            warn!(url = url.as_str(), "Dropping discovered item with invalid URL");
            None
        }
    }
}

/// Batch discovery over `/glitches`: the whole probe resolves in one
/// response, replayed as a burst of events.
#[async_trait]
impl DiscoveryClient for GlitchApiClient {
    async fn discover(
        &self,
        category: &str,
        keyword: &str,
        site: &str,
    ) -> Result<DiscoveryStream> {
        let items = self
            .fetch_glitches(category, keyword, site)
            .await
            .map_err(|e| GlitchScoutError::Discovery(e.to_string()))?;

        let events: Vec<Result<DiscoveryEvent>> = items
            .into_iter()
            .filter_map(item_event)
            .map(Ok)
            .chain(std::iter::once(Ok(DiscoveryEvent::Finished)))
            .collect();
        Ok(stream::iter(events).boxed())
    }
}

/// Incremental discovery over the backend's SSE endpoint. Same data as the
/// batch adapter, delivered as it is found, with progress markers.
pub struct StreamingDiscovery {
    client: GlitchApiClient,
}

impl StreamingDiscovery {
    pub fn new(client: GlitchApiClient) -> Self {
        Self { client }
    }
}

fn stream_event_into(event: StreamEvent) -> Option<Result<DiscoveryEvent>> {
    if event.finished {
        return Some(Ok(DiscoveryEvent::Finished));
    }
    if let Some(wire) = event.item {
        return item_event(wire).map(Ok);
    }
    event
        .progress_label
        .map(|label| Ok(DiscoveryEvent::Progress(label)))
}

#[async_trait]
impl DiscoveryClient for StreamingDiscovery {
    async fn discover(
        &self,
        category: &str,
        keyword: &str,
        site: &str,
    ) -> Result<DiscoveryStream> {
        let events = self
            .client
            .stream_glitches(category, keyword, site)
            .await
            .map_err(|e| GlitchScoutError::Discovery(e.to_string()))?;

        Ok(events
            .filter_map(|event| {
                let mapped = match event {
                    Ok(event) => stream_event_into(event),
                    Err(e) => Some(Err(GlitchScoutError::Discovery(e.to_string()).into())),
                };
                future::ready(mapped)
            })
            .boxed())
    }
}

/// Availability checks over `/verify`. A non-"available" status is an
/// unconfirmed outcome, not an error; transport failures are the caller's
/// to fold into the same bucket.
#[async_trait]
impl VerificationClient for GlitchApiClient {
    async fn verify(&self, url: &str) -> Result<VerificationOutcome> {
        let wire = self
            .verify_item(url)
            .await
            .map_err(|e| GlitchScoutError::Verification(e.to_string()))?;

        Ok(VerificationOutcome {
            confirmed: wire.status == "available",
            reason: if wire.reason.is_empty() {
                None
            } else {
                Some(wire.reason)
            },
        })
    }
}
