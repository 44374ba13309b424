// Scripted doubles for the two collaborator traits.
//
// ScriptedDiscovery — (keyword, site) → items, with a call log for
// probe-count assertions. Unregistered pairs yield nothing, like a probe
// that found no deals; pairs registered with `fail_on` become transport
// errors. `progress_first` makes every probe emit a progress marker ahead
// of its items, exercising the incremental stream shape.
// ScriptedVerifier — url → outcome with optional per-url latency;
// unregistered urls confirm.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use futures::stream::{self, StreamExt};

use glitchscout_common::{DealItem, VerificationOutcome};

use crate::traits::{DiscoveryClient, DiscoveryEvent, DiscoveryStream, VerificationClient};

/// Build a deal item with sensible defaults for tests.
pub fn deal(url: &str) -> DealItem {
    DealItem {
        url: url.to_string(),
        name: format!("deal {url}"),
        description: "scripted test deal".to_string(),
        store: "shop.test".to_string(),
        category: "tech".to_string(),
        savings_percentage: 55.0,
        discounted_price: Some(49.99),
        next_best: None,
    }
}

// ---------------------------------------------------------------------------
// ScriptedDiscovery
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct ScriptedDiscovery {
    responses: HashMap<(String, String), Vec<DealItem>>,
    failures: HashSet<(String, String)>,
    progress_first: bool,
    delay: Option<Duration>,
    calls: Mutex<Vec<(String, String)>>,
}

impl ScriptedDiscovery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(mut self, keyword: &str, site: &str, items: Vec<DealItem>) -> Self {
        self.responses
            .insert((keyword.to_string(), site.to_string()), items);
        self
    }

    pub fn fail_on(mut self, keyword: &str, site: &str) -> Self {
        self.failures
            .insert((keyword.to_string(), site.to_string()));
        self
    }

    pub fn progress_first(mut self) -> Self {
        self.progress_first = true;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Every probe this double has served, in order.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl DiscoveryClient for ScriptedDiscovery {
    async fn discover(
        &self,
        _category: &str,
        keyword: &str,
        site: &str,
    ) -> Result<DiscoveryStream> {
        self.calls
            .lock()
            .unwrap()
            .push((keyword.to_string(), site.to_string()));

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let key = (keyword.to_string(), site.to_string());
        if self.failures.contains(&key) {
            anyhow::bail!("scripted transport failure for {keyword} @ {site}");
        }

        let mut events: Vec<Result<DiscoveryEvent>> = Vec::new();
        if self.progress_first {
            events.push(Ok(DiscoveryEvent::Progress(format!(
                "probing {site} for {keyword}"
            ))));
        }
        for item in self.responses.get(&key).cloned().unwrap_or_default() {
            events.push(Ok(DiscoveryEvent::Item(item)));
        }
        events.push(Ok(DiscoveryEvent::Finished));
        Ok(stream::iter(events).boxed())
    }
}

// ---------------------------------------------------------------------------
// ScriptedVerifier
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct ScriptedVerifier {
    denials: HashMap<String, String>,
    errors: HashSet<String>,
    delays: HashMap<String, Duration>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// The check runs but comes back unconfirmed.
    pub fn deny(mut self, url: &str, reason: &str) -> Self {
        self.denials.insert(url.to_string(), reason.to_string());
        self
    }

    /// The check itself fails at the transport level.
    pub fn fail(mut self, url: &str) -> Self {
        self.errors.insert(url.to_string());
        self
    }

    pub fn delay(mut self, url: &str, delay: Duration) -> Self {
        self.delays.insert(url.to_string(), delay);
        self
    }

    /// Every URL this double has checked, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl VerificationClient for ScriptedVerifier {
    async fn verify(&self, url: &str) -> Result<VerificationOutcome> {
        self.calls.lock().unwrap().push(url.to_string());

        if let Some(delay) = self.delays.get(url) {
            tokio::time::sleep(*delay).await;
        }
        if self.errors.contains(url) {
            anyhow::bail!("scripted verification outage for {url}");
        }

        match self.denials.get(url) {
            Some(reason) => Ok(VerificationOutcome {
                confirmed: false,
                reason: Some(reason.clone()),
            }),
            None => Ok(VerificationOutcome {
                confirmed: true,
                reason: Some("in stock".to_string()),
            }),
        }
    }
}
