// ==============================
// tests/unit/rate_limit_tests.rs
// ==============================
//! This test suite is designed to validate the functionality of the `AuthRateLimiter`
use carelink_backend_lib::auth::AuthRateLimiter;
use std::time::Duration;

#[test]
fn test_rate_limiter_allows_initial_attempts() {
    let rate_limiter = AuthRateLimiter::default();
    assert!(rate_limiter.check_rate_limit("test@gmail.com"));
}

#[test]
fn test_rate_limiter_blocks_after_max_attempts() {
    let rate_limiter = AuthRateLimiter::default();

    // default max is 5
    for _ in 0..4 {
        rate_limiter.record_failed_attempt("test@gmail.com");
    }
    assert!(rate_limiter.check_rate_limit("test@gmail.com"));

    rate_limiter.record_failed_attempt("test@gmail.com");
    assert!(!rate_limiter.check_rate_limit("test@gmail.com"));
}

#[test]
fn test_rate_limiter_resets_after_success() {
    let rate_limiter = AuthRateLimiter::default();

    for _ in 0..3 {
        rate_limiter.record_failed_attempt("test@gmail.com");
    }
    rate_limiter.record_success("test@gmail.com");

    for _ in 0..3 {
        rate_limiter.record_failed_attempt("test@gmail.com");
    }
    assert!(rate_limiter.check_rate_limit("test@gmail.com"));
}

#[test]
fn test_lockout_counts_start_over_after_expiry() {
    let rate_limiter = AuthRateLimiter::new(2, Duration::from_millis(20));
    rate_limiter.record_failed_attempt("test@gmail.com");
    rate_limiter.record_failed_attempt("test@gmail.com");
    assert!(!rate_limiter.check_rate_limit("test@gmail.com"));

    std::thread::sleep(Duration::from_millis(40));
    rate_limiter.record_failed_attempt("test@gmail.com");
    assert!(rate_limiter.check_rate_limit("test@gmail.com"));
}
