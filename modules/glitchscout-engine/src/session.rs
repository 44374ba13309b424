//! Session lifecycle: at most one orchestration run is current at a time.
//!
//! `start_search` supersedes the previous session by bumping a monotonic
//! generation counter. In-flight work from a superseded session is never
//! force-cancelled; its completions check the generation and discard
//! themselves. The slot board is the only shared mutable state and every
//! mutation goes through the state mutex in one synchronous critical
//! section, so the reporting channel never observes a partial update.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use tokio::sync::{mpsc, Notify};
use tracing::info;
use uuid::Uuid;

use glitchscout_common::Snapshot;

use crate::slots::SlotBoard;
use crate::sweep::{run_sweep, SweepCursor};
use crate::traits::{DiscoveryClient, VerificationClient};

/// Owns the current session and its reporting channel.
pub struct SessionController {
    inner: Arc<SessionInner>,
}

pub(crate) struct SessionInner {
    pub(crate) discovery: Arc<dyn DiscoveryClient>,
    pub(crate) verifier: Arc<dyn VerificationClient>,
    pub(crate) reporter: mpsc::UnboundedSender<Snapshot>,
    generation: AtomicU64,
    pub(crate) state: Mutex<SessionState>,
}

pub(crate) struct SessionState {
    pub(crate) generation: u64,
    pub(crate) run_id: String,
    pub(crate) category: String,
    pub(crate) board: SlotBoard,
    pub(crate) cursor: SweepCursor,
    pub(crate) running: bool,
    pub(crate) progress: String,
    pub(crate) error: Option<String>,
    /// Wakes this session's parked sweep after a verification outcome.
    /// Session-scoped so a superseded sweep can never steal a wakeup.
    pub(crate) wake: Arc<Notify>,
}

impl SessionState {
    fn idle() -> Self {
        Self {
            generation: 0,
            run_id: String::new(),
            category: String::new(),
            board: SlotBoard::new(),
            cursor: SweepCursor::default(),
            running: false,
            progress: String::new(),
            error: None,
            wake: Arc::new(Notify::new()),
        }
    }

    /// Send the current state down the reporting channel. Callers emit
    /// only after an actual change — every snapshot corresponds to exactly
    /// one state-changing call.
    pub(crate) fn emit(&self, reporter: &mpsc::UnboundedSender<Snapshot>) {
        let snapshot = Snapshot {
            slots: self.board.render(),
            running: self.running,
            progress: self.progress.clone(),
            error: self.error.clone(),
            updated_at: Utc::now(),
        };
        // A dropped receiver just means nobody is watching anymore.
        let _ = reporter.send(snapshot);
    }
}

impl SessionController {
    /// Build a controller around the two collaborators. The returned
    /// receiver is the sole read path for the presentation layer.
    pub fn new(
        discovery: Arc<dyn DiscoveryClient>,
        verifier: Arc<dyn VerificationClient>,
    ) -> (Self, mpsc::UnboundedReceiver<Snapshot>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let controller = Self {
            inner: Arc::new(SessionInner {
                discovery,
                verifier,
                reporter: tx,
                generation: AtomicU64::new(0),
                state: Mutex::new(SessionState::idle()),
            }),
        };
        (controller, rx)
    }

    /// Begin a fresh session for `category`, superseding any current one.
    pub fn start_search(&self, category: &str) {
        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let run_id = Uuid::new_v4().to_string();

        let old_wake = {
            let mut state = self.inner.state.lock().unwrap();
            let old_wake = state.wake.clone();
            *state = SessionState {
                generation,
                run_id: run_id.clone(),
                category: category.to_string(),
                board: SlotBoard::new(),
                cursor: SweepCursor::default(),
                running: true,
                progress: String::new(),
                error: None,
                wake: Arc::new(Notify::new()),
            };
            state.emit(&self.inner.reporter);
            old_wake
        };
        // Let a parked predecessor sweep observe its stale generation.
        // notify_one stores a permit, so a sweep that is about to park
        // still wakes immediately.
        old_wake.notify_one();

        info!(run_id = run_id.as_str(), category, generation, "Search session started");
        tokio::spawn(run_sweep(self.inner.clone(), generation));
    }

    /// Cooperatively stop the current session. The sweep exits at its next
    /// iteration boundary; verification outcomes already in flight still
    /// land on the board.
    pub fn stop(&self) {
        let wake = {
            let mut state = self.inner.state.lock().unwrap();
            if !state.running {
                return;
            }
            state.running = false;
            state.emit(&self.inner.reporter);
            info!(run_id = state.run_id.as_str(), "Search session stopped");
            state.wake.clone()
        };
        wake.notify_one();
    }
}
