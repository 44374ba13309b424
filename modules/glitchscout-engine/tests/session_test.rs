//! End-to-end scenarios for the session pipeline, driven entirely by
//! scripted collaborators: no network, no backend.
//!
//! Assertions are about eventual reported state — verification runs
//! concurrently with the sweep, so mid-flight snapshots are collected but
//! never used as the stopping condition.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::timeout;

use glitchscout_common::{SlotState, Snapshot};
use glitchscout_engine::testing::{deal, ScriptedDiscovery, ScriptedVerifier};
use glitchscout_engine::{SessionController, SLOT_CAPACITY};

const SITES: [&str; 5] = [
    "amazon.fr",
    "cdiscount.com",
    "fnac.com",
    "darty.com",
    "rakuten.fr",
];

/// Receive snapshots until `done` matches, panicking after two seconds.
/// Returns everything received, the matching snapshot last.
async fn collect_until(
    rx: &mut UnboundedReceiver<Snapshot>,
    done: impl Fn(&Snapshot) -> bool,
) -> Vec<Snapshot> {
    let mut history = Vec::new();
    loop {
        let snapshot = timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("timed out waiting for a snapshot")
            .expect("reporting channel closed");
        let matched = done(&snapshot);
        history.push(snapshot);
        if matched {
            return history;
        }
    }
}

fn verified_count(snapshot: &Snapshot) -> usize {
    snapshot
        .slots
        .iter()
        .filter(|s| s.state == SlotState::Verified)
        .count()
}

/// One item per (first keyword, site) pair — enough to fill the board from
/// a single keyword's row.
fn discovery_for_first_keyword(keyword: &str, prefix: &str) -> ScriptedDiscovery {
    let mut discovery = ScriptedDiscovery::new();
    for (i, site) in SITES.iter().enumerate() {
        discovery = discovery.on(keyword, site, vec![deal(&format!("{prefix}/deal-{i}"))]);
    }
    discovery
}

#[tokio::test]
async fn sweep_stops_once_the_board_is_fully_verified() {
    let discovery = Arc::new(discovery_for_first_keyword(
        "laptop clearance",
        "https://shop.test",
    ));
    let verifier = Arc::new(ScriptedVerifier::new());

    let (controller, mut rx) = SessionController::new(discovery.clone(), verifier.clone());
    controller.start_search("tech");

    let history = collect_until(&mut rx, |s| {
        !s.running && verified_count(s) == SLOT_CAPACITY
    })
    .await;

    let last = history.last().unwrap();
    assert!(last.error.is_none());
    assert!(last.slots.iter().all(|s| s.state == SlotState::Verified));

    // Early termination: the remaining tech pairs were never probed.
    let calls = discovery.calls();
    assert_eq!(calls.len(), SLOT_CAPACITY);
    assert!(calls.iter().all(|(keyword, _)| keyword == "laptop clearance"));
    assert_eq!(verifier.calls().len(), SLOT_CAPACITY);
}

#[tokio::test]
async fn failed_verification_frees_the_slot_for_a_replacement() {
    // Five items fill the board; the replacement probe is the cursor
    // successor pair: second keyword, first site.
    let discovery = Arc::new(
        discovery_for_first_keyword("laptop clearance", "https://shop.test").on(
            "headset discount",
            "amazon.fr",
            vec![deal("https://shop.test/replacement")],
        ),
    );
    let verifier =
        Arc::new(ScriptedVerifier::new().deny("https://shop.test/deal-2", "price reverted"));

    let (controller, mut rx) = SessionController::new(discovery.clone(), verifier.clone());
    controller.start_search("tech");

    let history = collect_until(&mut rx, |s| {
        !s.running && verified_count(s) == SLOT_CAPACITY
    })
    .await;

    // Slot 2 walked Pending → Unavailable → Pending → Verified.
    let slot2_states: Vec<(SlotState, String)> = history
        .iter()
        .filter_map(|s| {
            let slot = &s.slots[2];
            slot.item.as_ref().map(|i| (slot.state, i.url.clone()))
        })
        .collect();
    assert!(slot2_states.contains(&(SlotState::Pending, "https://shop.test/deal-2".into())));
    assert!(slot2_states.contains(&(SlotState::Unavailable, "https://shop.test/deal-2".into())));
    assert!(slot2_states.contains(&(SlotState::Pending, "https://shop.test/replacement".into())));

    let last = history.last().unwrap();
    assert_eq!(last.slots[2].state, SlotState::Verified);
    assert_eq!(
        last.slots[2].item.as_ref().unwrap().url,
        "https://shop.test/replacement"
    );

    // Exactly one replacement probe, resumed from the cursor rather than
    // the start of the space.
    let calls = discovery.calls();
    assert_eq!(calls.len(), 6);
    assert_eq!(
        calls[5],
        ("headset discount".to_string(), "amazon.fr".to_string())
    );

    // Every snapshot corresponds to exactly one state change.
    for pair in history.windows(2) {
        assert!(
            pair[0].slots != pair[1].slots
                || pair[0].running != pair[1].running
                || pair[0].progress != pair[1].progress
                || pair[0].error != pair[1].error,
            "identical consecutive snapshots"
        );
    }
}

#[tokio::test]
async fn new_search_supersedes_and_discards_stale_completions() {
    let mut discovery = ScriptedDiscovery::new();
    for (i, site) in SITES.iter().enumerate() {
        discovery = discovery
            .on(
                "laptop clearance",
                site,
                vec![deal(&format!("https://tech.test/deal-{i}"))],
            )
            .on(
                "console bundle price",
                site,
                vec![deal(&format!("https://gaming.test/deal-{i}"))],
            );
    }
    let discovery = Arc::new(discovery);

    // Tech verifications resolve late, after the session is superseded.
    let mut verifier = ScriptedVerifier::new();
    for i in 0..SITES.len() {
        verifier = verifier.delay(
            &format!("https://tech.test/deal-{i}"),
            Duration::from_millis(50),
        );
    }
    let verifier = Arc::new(verifier);

    let (controller, mut rx) = SessionController::new(discovery.clone(), verifier.clone());
    controller.start_search("tech");

    // Wait until the tech sweep has items in flight, then supersede it.
    collect_until(&mut rx, |s| s.slots.iter().any(|slot| slot.item.is_some())).await;
    controller.start_search("gaming");

    let history = collect_until(&mut rx, |s| {
        !s.running && verified_count(s) == SLOT_CAPACITY
    })
    .await;

    let last = history.last().unwrap();
    assert!(last.slots.iter().all(|slot| {
        slot.item
            .as_ref()
            .is_some_and(|i| i.url.starts_with("https://gaming.test/"))
    }));

    // From the gaming session's reset onward, no tech item ever appears.
    let reset_idx = history
        .iter()
        .rposition(|s| s.slots.iter().all(|slot| slot.item.is_none()))
        .expect("supersession reset snapshot");
    assert!(history[reset_idx..].iter().all(|s| {
        s.slots.iter().all(|slot| {
            slot.item
                .as_ref()
                .map_or(true, |i| i.url.starts_with("https://gaming.test/"))
        })
    }));

    // Tech checks were genuinely in flight, and their late completions
    // produce no further reports.
    assert!(verifier
        .calls()
        .iter()
        .any(|url| url.starts_with("https://tech.test/")));
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert!(rx.try_recv().is_err(), "stale completion produced a snapshot");
}

#[tokio::test]
async fn empty_sweep_reports_nothing_found() {
    let discovery = Arc::new(ScriptedDiscovery::new());
    let verifier = Arc::new(ScriptedVerifier::new());

    let (controller, mut rx) = SessionController::new(discovery.clone(), verifier.clone());
    controller.start_search("obscure category");

    let history = collect_until(&mut rx, |s| !s.running).await;

    let last = history.last().unwrap();
    assert!(last
        .slots
        .iter()
        .all(|s| s.item.is_none() && s.state == SlotState::Empty));
    assert_eq!(last.error.as_deref(), Some("no items found"));

    // Unknown category: one probe per site for the fallback keyword.
    assert_eq!(discovery.calls().len(), SITES.len());
    assert!(discovery
        .calls()
        .iter()
        .all(|(keyword, _)| keyword == "obscure category"));
    assert!(verifier.calls().is_empty());
}

#[tokio::test]
async fn exhausted_space_ends_with_an_underfull_board() {
    // One probe errors out, two yield items, the rest come back empty.
    let discovery = Arc::new(
        ScriptedDiscovery::new()
            .fail_on("niche", "amazon.fr")
            .on("niche", "fnac.com", vec![deal("https://shop.test/only-1")])
            .on("niche", "rakuten.fr", vec![deal("https://shop.test/only-2")]),
    );
    let verifier = Arc::new(ScriptedVerifier::new());

    let (controller, mut rx) = SessionController::new(discovery.clone(), verifier.clone());
    controller.start_search("niche");

    // The sweep ends under-full; late confirmations still land afterwards.
    let history = collect_until(&mut rx, |s| !s.running && verified_count(s) == 2).await;

    let last = history.last().unwrap();
    assert!(last.error.is_none());
    assert_eq!(
        last.slots
            .iter()
            .filter(|s| s.state == SlotState::Empty)
            .count(),
        SLOT_CAPACITY - 2
    );

    // The whole space was enumerated despite the transport failure.
    assert_eq!(discovery.calls().len(), SITES.len());
}

#[tokio::test]
async fn verification_outage_reads_as_unavailable() {
    let discovery = Arc::new(ScriptedDiscovery::new().on(
        "niche",
        "amazon.fr",
        vec![deal("https://shop.test/flaky")],
    ));
    let verifier = Arc::new(ScriptedVerifier::new().fail("https://shop.test/flaky"));

    let (controller, mut rx) = SessionController::new(discovery.clone(), verifier.clone());
    controller.start_search("niche");

    let history = collect_until(&mut rx, |s| {
        !s.running && s.slots[0].state == SlotState::Unavailable
    })
    .await;

    // The space is exhausted, so the slot stays unavailable for good, with
    // the transport failure folded into the reason.
    let slot = &history.last().unwrap().slots[0];
    assert!(slot
        .reason
        .as_deref()
        .unwrap()
        .contains("availability check failed"));
}

#[tokio::test]
async fn incremental_probes_surface_progress_labels() {
    let discovery = Arc::new(ScriptedDiscovery::new().progress_first().on(
        "niche",
        "amazon.fr",
        vec![deal("https://shop.test/streamed")],
    ));
    let verifier = Arc::new(ScriptedVerifier::new());

    let (controller, mut rx) = SessionController::new(discovery.clone(), verifier.clone());
    controller.start_search("niche");

    let history = collect_until(&mut rx, |s| !s.running && verified_count(s) == 1).await;

    // The sweep's own pair label and the stream's marker both surface.
    assert!(history.iter().any(|s| s.progress == "niche @ amazon.fr"));
    assert!(history
        .iter()
        .any(|s| s.progress == "probing amazon.fr for niche"));
}

#[tokio::test]
async fn stop_halts_the_sweep_at_the_next_boundary() {
    let discovery = Arc::new(ScriptedDiscovery::new().with_delay(Duration::from_millis(50)));
    let verifier = Arc::new(ScriptedVerifier::new());

    let (controller, mut rx) = SessionController::new(discovery.clone(), verifier.clone());
    controller.start_search("tech");

    collect_until(&mut rx, |s| s.running).await;
    controller.stop();
    collect_until(&mut rx, |s| !s.running).await;

    // The probe that may have been in flight is the only one ever issued.
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert!(discovery.calls().len() <= 1);
}
