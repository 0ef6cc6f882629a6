// ============================
// tests/unit/password_tests.rs
// ============================
//! Unit tests for password hashing and policy
use carelink_backend_lib::auth::password::{hash_password_with_cost, hash_password_secure};
use carelink_backend_lib::auth::{validate_password_strength, verify_password, PasswordRequirements};

use crate::test_utils::TEST_HASH_LOG_N;

#[test]
fn test_password_hashing_and_verification() {
    let password = "SecureP@ssw0rd";
    let hash = hash_password_with_cost(password, TEST_HASH_LOG_N).unwrap();

    assert_ne!(password, hash);
    assert!(verify_password(&hash, password));
    assert!(!verify_password(&hash, "SecureP@ssw0rD"));
}

#[test]
fn test_cost_is_read_back_from_the_hash() {
    let hash = hash_password_with_cost("SecureP@ssw0rd", 11).unwrap();
    assert!(hash.contains("ln=11"));
    assert!(verify_password(&hash, "SecureP@ssw0rd"));
}

#[test]
fn test_secure_hash_clears_input() {
    let mut password = "SecureP@ssw0rd".to_string();
    let hash = hash_password_secure(&mut password, TEST_HASH_LOG_N).unwrap();
    assert!(password.is_empty());
    assert!(verify_password(&hash, "SecureP@ssw0rd"));
}

#[test]
fn test_password_strength_validation() {
    let requirements = PasswordRequirements::default();

    assert!(validate_password_strength("SecureP@ssw0rd", &requirements));

    // Too short
    assert!(!validate_password_strength("Sh0rt!", &requirements));

    // Missing uppercase
    assert!(!validate_password_strength("securep@ssw0rd", &requirements));

    // Missing lowercase
    assert!(!validate_password_strength("SECUREP@SSW0RD", &requirements));

    // Missing digit
    assert!(!validate_password_strength("SecureP@ssword", &requirements));

    // Missing special character
    assert!(!validate_password_strength("SecurePassw0rd", &requirements));

    let relaxed = PasswordRequirements { require_special: false, ..PasswordRequirements::default() };
    assert!(validate_password_strength("SecurePassw0rd", &relaxed));
}
