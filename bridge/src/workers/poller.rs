//! Polling worker for periodic status updates

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tracing::{debug, error, info};

use crate::coordinator::{Coordinator, VehicleApi};
use crate::ha::publisher::EntityPublisher;

/// Poller worker options
#[derive(Debug, Clone)]
pub struct Options {
    /// Polling interval
    pub interval: Duration,

    /// Initial delay before first poll
    pub initial_delay: Duration,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
            initial_delay: Duration::from_secs(5),
        }
    }
}

/// Run the poller worker.
///
/// Every tick is one unit of work: login if needed, fetch, decode,
/// publish. A failed tick only flips availability; the next tick retries
/// from scratch.
pub async fn run<S, F, C>(
    options: &Options,
    coordinator: &Coordinator<C>,
    publisher: Option<&EntityPublisher>,
    sleep_fn: S,
    mut shutdown_signal: Pin<Box<dyn Future<Output = ()> + Send>>,
) where
    S: Fn(Duration) -> F,
    F: Future<Output = ()>,
    C: VehicleApi,
{
    info!("Poller worker starting...");

    // Initial delay
    sleep_fn(options.initial_delay).await;

    if let Some(publisher) = publisher {
        if let Err(e) = publisher.publish_discovery().await {
            error!("Failed to publish discovery configs: {}", e);
        }
    }

    // First refresh up front so entities populate without waiting a
    // full interval
    tick(coordinator, publisher).await;

    loop {
        // Check for shutdown
        tokio::select! {
            _ = &mut shutdown_signal => {
                info!("Poller worker shutting down...");
                return;
            }
            _ = sleep_fn(options.interval) => {
                // Continue with poll
            }
        }

        tick(coordinator, publisher).await;
    }
}

async fn tick<C: VehicleApi>(coordinator: &Coordinator<C>, publisher: Option<&EntityPublisher>) {
    debug!("Polling vehicle status...");

    match coordinator.refresh().await {
        Ok(data) => {
            debug!("Update completed successfully");
            if let Some(publisher) = publisher {
                if let Err(e) = publisher.publish_data(&data).await {
                    error!("Failed to publish state: {}", e);
                }
            }
        }
        Err(e) => {
            error!("Update failed: {}", e);
            if let Some(publisher) = publisher {
                if let Err(e) = publisher.publish_unavailable().await {
                    error!("Failed to publish availability: {}", e);
                }
            }
        }
    }
}
