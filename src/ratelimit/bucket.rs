//! Token bucket implementation.

use tokio::time::Instant;

/// A token bucket tracking admission state for a single client.
///
/// Tokens accrue continuously at `refill_rate` per second up to `capacity`,
/// and each admitted request spends one token. Refill uses fractional tokens
/// so coarse time sampling does not bias the effective rate.
///
/// The bucket itself is not synchronized; callers hold the registry's lock
/// for the duration of every call.
#[derive(Debug)]
pub struct TokenBucket {
    /// Maximum burst size
    capacity: f64,
    /// Tokens replenished per second
    refill_rate: f64,
    /// Currently available tokens, always in `[0, capacity]`
    tokens: f64,
    /// When the last refill was computed
    last_refill: Instant,
}

impl TokenBucket {
    /// Create a new bucket, full to capacity.
    ///
    /// `capacity` and `refill_rate` come from global configuration and are
    /// immutable for the lifetime of the bucket.
    pub fn new(capacity: u32, refill_rate: f64, now: Instant) -> Self {
        Self {
            capacity: f64::from(capacity),
            refill_rate,
            tokens: f64::from(capacity),
            last_refill: now,
        }
    }

    /// Refill the bucket for the time elapsed since the last refill, then
    /// try to spend one token.
    ///
    /// Returns `true` if a token was spent (request admitted), `false` if
    /// the bucket is empty (request rejected). Rejection does not mutate the
    /// token count beyond the refill.
    pub fn try_consume(&mut self, now: Instant) -> bool {
        let elapsed = now.saturating_duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.refill_rate).min(self.capacity);
        self.last_refill = now;

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Currently available tokens.
    pub fn available(&self) -> f64 {
        self.tokens
    }
}
