//! Background reclaimer for stale client entries.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, info};

use super::registry::ClientRegistry;

/// Periodic task that evicts registry entries for inactive clients.
///
/// Without reclamation the registry grows with every distinct client a
/// long-lived process ever sees. The reclaimer bounds that growth: once per
/// `sweep_interval` it takes the registry's critical section, performs one
/// sweep, releases the lock, and idles until the next tick. The lock is
/// never held across the idle period, so request admission is only ever
/// blocked for the duration of a single sweep.
pub struct Reclaimer {
    /// Registry shared with the admission gate
    registry: Arc<ClientRegistry>,
    /// Period between sweeps
    sweep_interval: Duration,
    /// Inactivity threshold before an entry is evicted
    stale_after: Duration,
}

impl Reclaimer {
    /// Create a new reclaimer over a shared registry.
    pub fn new(
        registry: Arc<ClientRegistry>,
        sweep_interval: Duration,
        stale_after: Duration,
    ) -> Self {
        Self {
            registry,
            sweep_interval,
            stale_after,
        }
    }

    /// Spawn the reclaim loop onto the runtime.
    ///
    /// The task runs for the lifetime of the serving process and never exits
    /// on its own; at shutdown it is simply abandoned, since it owns no
    /// external resources. A sweep has no failure path, so nothing here can
    /// terminate the loop.
    pub fn spawn(self) -> JoinHandle<()> {
        info!(
            sweep_interval_secs = self.sweep_interval.as_secs(),
            stale_after_secs = self.stale_after.as_secs(),
            "Starting client registry reclaimer"
        );

        tokio::spawn(async move {
            let mut ticker = interval(self.sweep_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick of a tokio interval fires immediately
            ticker.tick().await;

            loop {
                ticker.tick().await;
                let evicted = self.registry.sweep(Instant::now(), self.stale_after);
                if evicted > 0 {
                    debug!(evicted, "Evicted stale client entries");
                }
            }
        })
    }
}
