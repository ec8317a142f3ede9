//! Per-tracker polling task.
//!
//! Each configured tracker gets one task: an immediate first poll, then a
//! fixed interval. A failed poll marks the tracker unavailable; the next tick
//! is the retry.

use std::sync::Arc;

use tracing::{debug, error};

use crate::client::Client;
use crate::config::TrackerConfig;
use crate::state::{SharedState, TrackerState};

pub async fn run(name: String, config: TrackerConfig, state: SharedState) {
    let client = match &config.base_url {
        Some(base) => Client::with_base_url(
            base.clone(),
            config.serial_number,
            config.device_token.clone(),
            config.auth_token.clone(),
        ),
        None => Client::new(
            config.serial_number,
            config.device_token.clone(),
            config.auth_token.clone(),
        ),
    };

    let mut interval = tokio::time::interval(config.poll_interval());
    loop {
        interval.tick().await;

        match client.fetch().await {
            Ok(record) => {
                debug!(
                    "[{}] poll ok: battery={:?} weights={} trips={}",
                    name,
                    record.numeric("battery"),
                    record.weight_history.len(),
                    record.trips.len()
                );
                state.update_tracker(
                    &name,
                    TrackerState {
                        record: Some(Arc::new(record)),
                        last_error: None,
                    },
                );
            }
            Err(e) => {
                error!("[{}] poll failed: {}", name, e);
                state.update_tracker(
                    &name,
                    TrackerState {
                        record: None,
                        last_error: Some(e.to_string()),
                    },
                );
            }
        }
    }
}
