//! Discovery-and-verification pipeline for deal candidates.
//!
//! A session sweeps the keyword×site space for a category, keeps a bounded
//! leaderboard of candidates, and confirms each one's availability out of
//! band. Starting a new search supersedes the old session; stale async
//! completions are discarded by generation check.

pub mod catalog;
pub mod session;
pub mod slots;
pub mod sweep;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod traits;

pub use session::SessionController;
pub use slots::{SlotBoard, SLOT_CAPACITY};
pub use traits::{
    DiscoveryClient, DiscoveryEvent, DiscoveryStream, StreamingDiscovery, VerificationClient,
};
