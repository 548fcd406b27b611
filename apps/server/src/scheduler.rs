//! Background scheduler for periodic provider probes.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::main_lib::AppState;

/// Delay before the first sweep so startup traffic goes first.
const INITIAL_DELAY_SECS: u64 = 30;

/// Starts the background probe scheduler.
pub fn start_probe_scheduler(state: Arc<AppState>, every: Duration) {
    tokio::spawn(async move {
        info!("Provider probe scheduler started ({}s interval)", every.as_secs());

        tokio::time::sleep(Duration::from_secs(INITIAL_DELAY_SECS)).await;

        let mut ticker = interval(every);
        // A slow sweep must not trigger a burst of catch-up sweeps.
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            run_probe_sweep(&state).await;
        }
    });
}

async fn run_probe_sweep(state: &Arc<AppState>) {
    let results = state.health_monitor.probe_all().await;
    if results.is_empty() {
        debug!("Probe sweep skipped: no live providers");
        return;
    }
    let failed = results.iter().filter(|r| !r.success).count();
    if failed > 0 {
        warn!(
            "Probe sweep finished: {} of {} providers failed",
            failed,
            results.len()
        );
    } else {
        info!("Probe sweep finished: {} providers reachable", results.len());
    }
}
