//! Periodic eviction of pending halves that waited too long for a peer.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::registry::Registry;

/// Runs forever, firing on `tick` and evicting any half of `registry` whose
/// wait exceeds `budget`. Never touches a connection that has already been
/// handed off to the pipe engine — it only ever sees what's still queued at
/// the moment it takes the lock.
pub async fn run(registry: Arc<Registry>, budget: Duration, tick: Duration) {
    let mut interval = tokio::time::interval(tick);
    // The first tick fires immediately; skip it so the budget has a chance
    // to actually elapse before the first sweep.
    interval.tick().await;

    loop {
        interval.tick().await;
        let evicted = registry.evict_expired(Instant::now(), budget);
        for half in evicted {
            tracing::warn!(
                direction = %half.direction,
                age_secs = half.arrived_at.elapsed().as_secs_f64(),
                "timeout-evicted"
            );
            // Dropping the connection releases its file descriptor; this
            // happens outside the registry lock, which was only held for
            // the scan itself.
            drop(half);
        }
    }
}
