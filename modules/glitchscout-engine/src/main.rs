use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use glitchapi_client::GlitchApiClient;
use glitchscout_common::{Config, SlotState};
use glitchscout_engine::{DiscoveryClient, SessionController, StreamingDiscovery, VerificationClient};

#[derive(Parser)]
#[command(
    name = "glitchscout",
    about = "Sweep deal sources for price glitches and verify each find"
)]
struct Args {
    /// Category to sweep (tech, gaming, home, fashion — anything else is
    /// searched as a raw keyword).
    category: String,

    /// Use the incremental SSE discovery endpoint instead of batch fetches.
    #[arg(long)]
    stream: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("glitchscout_engine=info".parse()?)
                .add_directive("glitchapi_client=info".parse()?),
        )
        .init();

    let args = Args::parse();
    let config = Config::from_env();
    info!(api = config.api_base_url.as_str(), "GlitchScout starting");

    let client = GlitchApiClient::new(
        &config.api_base_url,
        Duration::from_secs(config.request_timeout_secs),
    );

    match client.category_info(&args.category).await {
        Ok(Some(category_info)) => info!(
            category = args.category.as_str(),
            label = category_info.label.as_str(),
            "Category info"
        ),
        Ok(None) => {}
        Err(e) => warn!(error = %e, "Category info unavailable"),
    }

    let discovery: Arc<dyn DiscoveryClient> = if args.stream {
        Arc::new(StreamingDiscovery::new(client.clone()))
    } else {
        Arc::new(client.clone())
    };
    let verifier: Arc<dyn VerificationClient> = Arc::new(client);

    let (controller, mut snapshots) = SessionController::new(discovery, verifier);
    controller.start_search(&args.category);

    let mut last = None;
    while let Some(snapshot) = snapshots.recv().await {
        let verified = snapshot
            .slots
            .iter()
            .filter(|s| s.state == SlotState::Verified)
            .count();
        let filled = snapshot.slots.iter().filter(|s| s.item.is_some()).count();
        info!(
            verified,
            filled,
            progress = snapshot.progress.as_str(),
            "Leaderboard updated"
        );
        let done = !snapshot.running;
        last = Some(snapshot);
        if done {
            break;
        }
    }

    // Verification outcomes can still land after the sweep ends; give the
    // stragglers a moment before printing the final board.
    while let Ok(Some(snapshot)) =
        tokio::time::timeout(Duration::from_secs(2), snapshots.recv()).await
    {
        last = Some(snapshot);
    }
    if let Some(snapshot) = last {
        if let Some(error) = &snapshot.error {
            warn!(error = error.as_str(), "Search ended without results");
        }
        for slot in snapshot.slots.iter().filter(|s| s.item.is_some()) {
            let item = slot.item.as_ref().unwrap();
            info!(
                url = item.url.as_str(),
                name = item.name.as_str(),
                savings = item.savings_percentage,
                state = %slot.state,
                reason = slot.reason.as_deref().unwrap_or(""),
                "Final slot"
            );
        }
    }

    Ok(())
}
