use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// --- Deal items ---

/// A competing offer for the same item at another store. Used to show how
/// far below the market a deal sits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub price: f64,
    pub store: String,
}

/// One discovered deal candidate.
///
/// Identity is the canonical source URL and never changes after discovery;
/// verification state lives on the slot holding the item, not here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DealItem {
    pub url: String,
    pub name: String,
    pub description: String,
    pub store: String,
    pub category: String,
    pub savings_percentage: f64,
    pub discounted_price: Option<f64>,
    /// Next best price found anywhere else, if known.
    pub next_best: Option<PriceQuote>,
}

// --- Slots ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotState {
    Empty,
    Pending,
    Verified,
    Unavailable,
}

impl std::fmt::Display for SlotState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SlotState::Empty => write!(f, "empty"),
            SlotState::Pending => write!(f, "pending"),
            SlotState::Verified => write!(f, "verified"),
            SlotState::Unavailable => write!(f, "unavailable"),
        }
    }
}

/// One position in the deal leaderboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slot {
    pub item: Option<DealItem>,
    pub state: SlotState,
    /// Human-readable explanation of the state, e.g. the verifier's reason
    /// for rejecting an item.
    pub reason: Option<String>,
}

impl Slot {
    pub fn empty() -> Self {
        Self {
            item: None,
            state: SlotState::Empty,
            reason: None,
        }
    }
}

// --- Verification ---

/// Outcome of an availability check for one deal URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationOutcome {
    pub confirmed: bool,
    pub reason: Option<String>,
}

// --- Reporting ---

/// Immutable view of a session, emitted after every state change. The
/// consumer never reads session internals directly; this is the whole
/// read path.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    /// Always one entry per leaderboard position, padded with empty slots.
    pub slots: Vec<Slot>,
    pub running: bool,
    /// Which keyword/site pair the sweep is probing right now.
    pub progress: String,
    /// Aggregate failure shown when a whole sweep produced nothing.
    pub error: Option<String>,
    pub updated_at: DateTime<Utc>,
}
