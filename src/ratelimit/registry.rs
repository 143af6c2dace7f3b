//! Client registry: shared, mutex-guarded limiter state.

use std::collections::HashMap;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::debug;

use super::bucket::TokenBucket;

/// Per-client state tracked by the registry.
struct ClientEntry {
    /// This client's token bucket
    bucket: TokenBucket,
    /// Updated on every admitted or rejected request from this client
    last_seen: Instant,
}

/// Shared mapping from client identity to limiter state.
///
/// The registry is the single owner of all limiter state: every read and
/// write of a [`ClientEntry`] happens inside one mutex-guarded critical
/// section, and no entry reference ever escapes it. Entries are created
/// lazily on a client's first request and evicted by the reclaimer once the
/// client has been inactive past the staleness threshold.
///
/// `capacity` and `refill_rate` are global configuration, identical for
/// every client bucket, and read-only after construction.
pub struct ClientRegistry {
    /// Client identity -> entry; all access goes through the mutex
    clients: Mutex<HashMap<String, ClientEntry>>,
    /// Bucket capacity seeded into every new entry
    capacity: u32,
    /// Refill rate seeded into every new entry
    refill_rate: f64,
}

impl ClientRegistry {
    /// Create an empty registry with the given global bucket parameters.
    pub fn new(capacity: u32, refill_rate: f64) -> Self {
        Self {
            clients: Mutex::new(HashMap::new()),
            capacity,
            refill_rate,
        }
    }

    /// Decide whether a request from `client_id` is admitted.
    ///
    /// Under a single critical section: looks up the client, creating a
    /// fresh full bucket on first sight, consults the bucket, and updates
    /// `last_seen` regardless of the outcome. This is the only path that
    /// creates entries or mutates bucket state.
    ///
    /// For a single client, the effective order of bucket mutations matches
    /// the order in which callers enter the critical section.
    pub fn admit(&self, client_id: &str, now: Instant) -> bool {
        let mut clients = self.clients.lock();

        let entry = clients
            .entry(client_id.to_string())
            .or_insert_with(|| {
                debug!(client = %client_id, "Tracking new client");
                ClientEntry {
                    bucket: TokenBucket::new(self.capacity, self.refill_rate, now),
                    last_seen: now,
                }
            });

        let admitted = entry.bucket.try_consume(now);
        entry.last_seen = now;
        admitted
    }

    /// Evict every entry whose `last_seen` is older than `stale_after`.
    ///
    /// The whole sweep runs as one critical section, atomic with respect to
    /// any concurrent [`admit`](Self::admit). The lock is released when the
    /// sweep returns; it is never held across the reclaimer's idle period.
    ///
    /// Returns the number of evicted entries.
    pub fn sweep(&self, now: Instant, stale_after: Duration) -> usize {
        let mut clients = self.clients.lock();
        let before = clients.len();
        clients.retain(|_, entry| now.saturating_duration_since(entry.last_seen) <= stale_after);
        before - clients.len()
    }

    /// Number of clients currently tracked.
    pub fn client_count(&self) -> usize {
        self.clients.lock().len()
    }

    /// Current token count for a client, if tracked.
    ///
    /// This is primarily useful for testing.
    pub fn tokens_for(&self, client_id: &str) -> Option<f64> {
        self.clients
            .lock()
            .get(client_id)
            .map(|entry| entry.bucket.available())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_admit_creates_entry_lazily() {
        let registry = ClientRegistry::new(4, 2.0);
        assert_eq!(registry.client_count(), 0);

        assert!(registry.admit("10.0.0.1", Instant::now()));
        assert_eq!(registry.client_count(), 1);
    }

    #[test]
    fn test_admit_exhausts_burst() {
        let registry = ClientRegistry::new(3, 1.0);
        let now = Instant::now();

        for _ in 0..3 {
            assert!(registry.admit("10.0.0.1", now));
        }
        assert!(!registry.admit("10.0.0.1", now));
    }

    #[test]
    fn test_admit_scenario_two_capacity() {
        let registry = ClientRegistry::new(2, 1.0);
        let now = Instant::now();

        assert!(registry.admit("10.0.0.1", now));
        assert!(registry.admit("10.0.0.1", now));
        assert!(!registry.admit("10.0.0.1", now));
        assert!(registry.admit("10.0.0.1", now + Duration::from_secs(1)));
    }

    #[test]
    fn test_clients_are_independent() {
        let registry = ClientRegistry::new(2, 1.0);
        let now = Instant::now();

        // Interleave admits for two clients; each gets its own full burst
        assert!(registry.admit("10.0.0.1", now));
        assert!(registry.admit("10.0.0.2", now));
        assert!(registry.admit("10.0.0.1", now));
        assert!(registry.admit("10.0.0.2", now));
        assert!(!registry.admit("10.0.0.1", now));
        assert!(!registry.admit("10.0.0.2", now));
    }

    #[test]
    fn test_interleaved_matches_sequential_counts() {
        let now = Instant::now();

        let interleaved = ClientRegistry::new(3, 1.0);
        let mut a_admitted = 0;
        let mut b_admitted = 0;
        for _ in 0..5 {
            if interleaved.admit("a", now) {
                a_admitted += 1;
            }
            if interleaved.admit("b", now) {
                b_admitted += 1;
            }
        }

        let sequential = ClientRegistry::new(3, 1.0);
        let a_sequential = (0..5).filter(|_| sequential.admit("a", now)).count();
        let b_sequential = (0..5).filter(|_| sequential.admit("b", now)).count();

        assert_eq!(a_admitted, a_sequential);
        assert_eq!(b_admitted, b_sequential);
    }

    #[test]
    fn test_sweep_evicts_only_stale_entries() {
        let registry = ClientRegistry::new(4, 1.0);
        let start = Instant::now();

        registry.admit("stale", start);
        registry.admit("fresh", start + Duration::from_secs(3));

        // At t=4s with stale_after=3s: "stale" is 4s old, "fresh" is 1s old
        let evicted = registry.sweep(start + Duration::from_secs(4), Duration::from_secs(3));

        assert_eq!(evicted, 1);
        assert_eq!(registry.client_count(), 1);
        assert!(registry.tokens_for("stale").is_none());
        assert!(registry.tokens_for("fresh").is_some());
    }

    #[test]
    fn test_rejected_requests_refresh_last_seen() {
        let registry = ClientRegistry::new(1, 0.001);
        let start = Instant::now();

        registry.admit("10.0.0.1", start);

        // Rejected requests still count as activity
        let later = start + Duration::from_secs(10);
        assert!(!registry.admit("10.0.0.1", later));

        let evicted = registry.sweep(later + Duration::from_secs(1), Duration::from_secs(5));
        assert_eq!(evicted, 0);
        assert_eq!(registry.client_count(), 1);
    }

    #[test]
    fn test_sweep_on_empty_registry() {
        let registry = ClientRegistry::new(4, 1.0);
        assert_eq!(registry.sweep(Instant::now(), Duration::from_secs(3)), 0);
    }

    #[test]
    fn test_concurrent_admits_do_not_lose_updates() {
        let registry = Arc::new(ClientRegistry::new(1000, 1000.0));
        let now = Instant::now();

        let mut handles = Vec::new();
        for t in 0..8 {
            let registry = registry.clone();
            handles.push(thread::spawn(move || {
                let client = format!("10.0.0.{}", t % 2);
                let mut admitted = 0;
                for _ in 0..100 {
                    if registry.admit(&client, now) {
                        admitted += 1;
                    }
                }
                admitted
            }));
        }

        let total: u32 = handles.into_iter().map(|h| h.join().unwrap()).sum();

        // 400 requests per client against capacity 1000: all admitted
        assert_eq!(total, 800);
        assert_eq!(registry.client_count(), 2);
    }

    #[test]
    fn test_concurrent_admit_and_sweep() {
        let registry = Arc::new(ClientRegistry::new(10, 1.0));
        let now = Instant::now();

        let mut handles = Vec::new();
        for t in 0..4 {
            let registry = registry.clone();
            handles.push(thread::spawn(move || {
                for i in 0..50 {
                    registry.admit(&format!("10.0.{}.{}", t, i), now);
                    registry.sweep(now, Duration::from_secs(3));
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        // Nothing was stale, so every tracked client survives
        assert_eq!(registry.client_count(), 200);
    }
}
