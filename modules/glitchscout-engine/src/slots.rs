//! The bounded deal leaderboard.

use glitchscout_common::{DealItem, Slot, SlotState};

/// Number of leaderboard positions per session.
pub const SLOT_CAPACITY: usize = 5;

/// Up to [`SLOT_CAPACITY`] slots keyed by item URL.
///
/// All queries and mutations are O(capacity). Mutations report whether
/// anything changed so the caller can skip redundant snapshot emissions.
#[derive(Debug, Default)]
pub struct SlotBoard {
    slots: Vec<Slot>,
}

impl SlotBoard {
    pub fn new() -> Self {
        Self { slots: Vec::new() }
    }

    /// Insert a discovered item in Pending state.
    ///
    /// The first Unavailable slot in scan order is overwritten before a new
    /// slot is appended; a board full of Pending/Verified slots rejects the
    /// insert, as does an item whose URL already occupies a slot.
    pub fn insert_or_replace(&mut self, item: DealItem) -> bool {
        let occupied = self
            .slots
            .iter()
            .any(|s| s.item.as_ref().is_some_and(|i| i.url == item.url));
        if occupied {
            return false;
        }

        if let Some(slot) = self
            .slots
            .iter_mut()
            .find(|s| s.state == SlotState::Unavailable)
        {
            *slot = Slot {
                item: Some(item),
                state: SlotState::Pending,
                reason: None,
            };
            return true;
        }

        if self.slots.len() < SLOT_CAPACITY {
            self.slots.push(Slot {
                item: Some(item),
                state: SlotState::Pending,
                reason: None,
            });
            return true;
        }

        false
    }

    /// Pending → Verified for the slot holding `url`. Stale keys (slot
    /// already replaced, or never present) change nothing.
    pub fn mark_verified(&mut self, url: &str, reason: Option<String>) -> bool {
        self.transition(url, SlotState::Verified, reason)
    }

    /// Pending → Unavailable. The freed slot becomes the replacement target
    /// for the next insert.
    pub fn mark_unavailable(&mut self, url: &str, reason: Option<String>) -> bool {
        self.transition(url, SlotState::Unavailable, reason)
    }

    fn transition(&mut self, url: &str, to: SlotState, reason: Option<String>) -> bool {
        let Some(slot) = self.slots.iter_mut().find(|s| {
            s.state == SlotState::Pending && s.item.as_ref().is_some_and(|i| i.url == url)
        }) else {
            return false;
        };
        slot.state = to;
        slot.reason = reason;
        true
    }

    pub fn verified_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|s| s.state == SlotState::Verified)
            .count()
    }

    pub fn occupied(&self) -> usize {
        self.slots.len()
    }

    /// Whether the next discovered item could land anywhere: a free
    /// position remains, or an Unavailable slot is waiting for a
    /// replacement.
    pub fn wants_item(&self) -> bool {
        self.slots.len() < SLOT_CAPACITY
            || self.slots.iter().any(|s| s.state == SlotState::Unavailable)
    }

    /// Clone of all slots, padded to capacity with empty ones.
    pub fn render(&self) -> Vec<Slot> {
        let mut slots = self.slots.clone();
        slots.resize(SLOT_CAPACITY, Slot::empty());
        slots
    }
}
