// ============================
// crates/backend-lib/src/auth/rate_limit.rs
// ============================
//! Rate limiting for failed sign-in attempts, keyed by normalized identifier.

use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::warn;

/// Default number of failed attempts before rate limiting
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Default lockout duration (5 minutes)
pub const DEFAULT_LOCKOUT_DURATION: Duration = Duration::from_secs(5 * 60);

/// Failed attempts recorded between two sweeps of stale entries
const CLEANUP_EVERY: u64 = 256;

/// Entry in the rate limit map
#[derive(Debug, Clone)]
struct RateLimitEntry {
    /// Number of failed attempts
    failed_attempts: u32,
    /// When the lockout expires
    lockout_expiry: Option<Instant>,
    /// Most recent failure
    last_failure: Instant,
}

impl RateLimitEntry {
    /// Locked out and still serving the lockout
    fn is_locked(&self, now: Instant) -> bool {
        self.lockout_expiry.is_some_and(|expiry| now < expiry)
    }

    /// A finished lockout, or failures that are older than one lockout window
    fn is_stale(&self, now: Instant, window: Duration) -> bool {
        match self.lockout_expiry {
            Some(expiry) => now >= expiry,
            None => now.duration_since(self.last_failure) >= window,
        }
    }
}

/// Rate limiter for authentication attempts
#[derive(Debug, Clone)]
pub struct AuthRateLimiter {
    /// Map of identifiers to rate limit entries
    attempts: Arc<DashMap<String, RateLimitEntry>>,
    /// Maximum number of failed attempts before lockout
    max_attempts: u32,
    /// Duration of lockout period
    lockout_duration: Duration,
    /// Failed attempts since startup, drives periodic cleanup
    recorded: Arc<AtomicU64>,
}

impl Default for AuthRateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, DEFAULT_LOCKOUT_DURATION)
    }
}

impl AuthRateLimiter {
    /// Create a new auth rate limiter
    pub fn new(max_attempts: u32, lockout_duration: Duration) -> Self {
        Self {
            attempts: Arc::new(DashMap::new()),
            max_attempts,
            lockout_duration,
            recorded: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Record a failed authentication attempt
    pub fn record_failed_attempt(&self, identifier: &str) {
        let now = Instant::now();

        {
            let mut entry = self
                .attempts
                .entry(identifier.to_string())
                .or_insert_with(|| RateLimitEntry {
                    failed_attempts: 0,
                    lockout_expiry: None,
                    last_failure: now,
                });

            // Start over once a lockout or the failure window has run out
            if entry.is_stale(now, self.lockout_duration) {
                entry.failed_attempts = 0;
                entry.lockout_expiry = None;
            }

            entry.failed_attempts += 1;
            entry.last_failure = now;

            if entry.failed_attempts >= self.max_attempts && entry.lockout_expiry.is_none() {
                entry.lockout_expiry = Some(now + self.lockout_duration);
                warn!(
                    attempts = entry.failed_attempts,
                    lockout_secs = self.lockout_duration.as_secs(),
                    "identifier locked out after repeated failed sign-ins"
                );
            }
        }

        // entry guard is released above; retain locks every shard
        if self.recorded.fetch_add(1, Ordering::Relaxed) % CLEANUP_EVERY == CLEANUP_EVERY - 1 {
            self.cleanup();
        }
    }

    /// Record a successful authentication
    pub fn record_success(&self, identifier: &str) {
        self.attempts.remove(identifier);
    }

    /// Check if an identifier is allowed to attempt authentication
    pub fn check_rate_limit(&self, identifier: &str) -> bool {
        match self.attempts.get(identifier) {
            Some(entry) => !entry.is_locked(Instant::now()),
            None => true,
        }
    }

    /// Drop entries whose lockout has ended or whose failures have aged out
    pub fn cleanup(&self) {
        let now = Instant::now();
        self.attempts
            .retain(|_, entry| !entry.is_stale(now, self.lockout_duration));
    }

    /// Number of identifiers currently tracked
    pub fn tracked(&self) -> usize {
        self.attempts.len()
    }
}
