//! The keyword×site sweep and per-item verification dispatch.
//!
//! The sweep is one sequential loop that suspends at each discovery call.
//! It probes the next pair only while the board can accept an item; when
//! the board is full of pending/verified slots it parks on the session's
//! notify and resumes from the shared cursor once a verification outcome
//! frees a slot. That parked-and-woken resume is the replacement sweep:
//! same generation, same cursor, so a refill never re-probes the pair that
//! produced the dead item.

use std::sync::Arc;

use futures::StreamExt;
use tracing::{debug, info, warn};

use crate::catalog::{keywords_for, site_list};
use crate::session::SessionInner;
use crate::slots::SLOT_CAPACITY;
use crate::traits::DiscoveryEvent;

/// Position in the keyword×site enumeration. Keyword-major: all sites for
/// keyword 0, then all sites for keyword 1, and so on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepCursor {
    keyword_idx: usize,
    site_idx: usize,
}

impl SweepCursor {
    /// Current pair as (keyword index, site index), advancing past it.
    /// `None` once the space is exhausted.
    pub fn advance(&mut self, keywords: usize, sites: usize) -> Option<(usize, usize)> {
        if self.keyword_idx >= keywords || sites == 0 {
            return None;
        }
        let pair = (self.keyword_idx, self.site_idx);
        self.site_idx += 1;
        if self.site_idx >= sites {
            self.site_idx = 0;
            self.keyword_idx += 1;
        }
        Some(pair)
    }
}

enum Step {
    Probe { keyword: String, site: String },
    Park,
    Done,
}

pub(crate) async fn run_sweep(inner: Arc<SessionInner>, generation: u64) {
    let (category, run_id, wake) = {
        let state = inner.state.lock().unwrap();
        if state.generation != generation {
            return;
        }
        (
            state.category.clone(),
            state.run_id.clone(),
            state.wake.clone(),
        )
    };
    let keywords = keywords_for(&category);
    let sites = site_list();

    loop {
        // Decide under the lock, never hold it across I/O.
        let step = {
            let mut state = inner.state.lock().unwrap();
            if state.generation != generation || !state.running {
                return;
            }
            if state.board.verified_count() >= SLOT_CAPACITY {
                Step::Done
            } else if !state.board.wants_item() {
                Step::Park
            } else {
                match state.cursor.advance(keywords.len(), sites.len()) {
                    Some((k, s)) => Step::Probe {
                        keyword: keywords[k].clone(),
                        site: sites[s].clone(),
                    },
                    None => Step::Done,
                }
            }
        };

        match step {
            Step::Done => break,
            Step::Park => {
                // A verification outcome either frees a slot or completes
                // the board; either way the next decision changes.
                wake.notified().await;
            }
            Step::Probe { keyword, site } => {
                set_progress(&inner, generation, format!("{keyword} @ {site}"));
                probe(&inner, generation, &category, &keyword, &site).await;
            }
        }
    }

    finish(&inner, generation, &run_id);
}

/// One discovery call. Failures are recovered locally — the sweep simply
/// moves on to the next pair.
async fn probe(
    inner: &Arc<SessionInner>,
    generation: u64,
    category: &str,
    keyword: &str,
    site: &str,
) {
    let mut events = match inner.discovery.discover(category, keyword, site).await {
        Ok(events) => events,
        Err(e) => {
            warn!(keyword, site, error = %e, "Discovery probe failed");
            return;
        }
    };

    while let Some(event) = events.next().await {
        match event {
            Ok(DiscoveryEvent::Item(item)) => {
                let url = item.url.clone();
                let inserted = {
                    let mut state = inner.state.lock().unwrap();
                    if state.generation != generation {
                        return;
                    }
                    let inserted = state.board.insert_or_replace(item);
                    if inserted {
                        state.emit(&inner.reporter);
                    }
                    inserted
                };
                if inserted {
                    debug!(url = url.as_str(), keyword, site, "Item discovered");
                    dispatch_verification(inner, generation, url);
                }
            }
            Ok(DiscoveryEvent::Progress(label)) => set_progress(inner, generation, label),
            Ok(DiscoveryEvent::Finished) => break,
            Err(e) => {
                warn!(keyword, site, error = %e, "Discovery stream error");
                break;
            }
        }
    }
}

/// Fire-and-forget availability check, concurrent with the sweep and with
/// other checks. A transport failure lands in the same slot state as a
/// confirmed unavailability; only the reason string differs.
fn dispatch_verification(inner: &Arc<SessionInner>, generation: u64, url: String) {
    let inner = inner.clone();
    tokio::spawn(async move {
        let (confirmed, reason) = match inner.verifier.verify(&url).await {
            Ok(outcome) => (outcome.confirmed, outcome.reason),
            Err(e) => (false, Some(format!("availability check failed: {e}"))),
        };

        let wake = {
            let mut state = inner.state.lock().unwrap();
            if state.generation != generation {
                debug!(url = url.as_str(), "Discarding stale verification result");
                return;
            }
            let changed = if confirmed {
                state.board.mark_verified(&url, reason)
            } else {
                state.board.mark_unavailable(&url, reason)
            };
            if changed {
                info!(url = url.as_str(), confirmed, "Verification result");
                state.emit(&inner.reporter);
            }
            state.wake.clone()
        };
        wake.notify_one();
    });
}

fn set_progress(inner: &SessionInner, generation: u64, label: String) {
    let mut state = inner.state.lock().unwrap();
    if state.generation != generation || !state.running || state.progress == label {
        return;
    }
    state.progress = label;
    state.emit(&inner.reporter);
}

fn finish(inner: &SessionInner, generation: u64, run_id: &str) {
    let mut state = inner.state.lock().unwrap();
    if state.generation != generation || !state.running {
        return;
    }
    state.running = false;
    state.progress.clear();
    if state.board.occupied() == 0 {
        state.error = Some("no items found".to_string());
    }
    state.emit(&inner.reporter);
    info!(
        run_id,
        verified = state.board.verified_count(),
        occupied = state.board.occupied(),
        "Sweep finished"
    );
}
