use std::time::Duration;

use tracing::error;

use crate::{bookings, state::AppState};

/// Periodic sweep that promotes past-due confirmed bookings to COMPLETED.
/// Runs until the process exits; a failed pass is logged and the next tick
/// proceeds. Safe to run concurrently with user-triggered cancellations
/// because the sweep only touches rows still CONFIRMED at commit time.
pub async fn run_completion_sweep(state: AppState) {
    let period = Duration::from_secs(state.config.sweep_interval_minutes * 60);
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        interval.tick().await;
        if let Err(e) = bookings::service::complete_past_bookings(&state).await {
            error!(error = %e, "completion sweep failed");
        }
    }
}
