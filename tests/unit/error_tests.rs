// =========================
// tests/unit/error_tests.rs
// =========================
//! Unit tests for the error module
use axum::http::StatusCode;
use carelink_backend_lib::error::AppError;
use carelink_common::Role;
use std::io::{Error as IoError, ErrorKind};

#[test]
fn test_app_error_display() {
    let mismatch = AppError::RoleMismatch { requested: Role::Patient, stored: Role::Doctor };
    assert_eq!(mismatch.to_string(), "Role mismatch: requested PATIENT, account is DOCTOR");

    let io_error = AppError::Io(IoError::new(ErrorKind::NotFound, "File not found"));
    assert!(io_error.to_string().contains("IO error"));

    assert_eq!(AppError::AuthRateLimited.to_string(), "Authentication rate limit exceeded");
}

#[test]
fn test_app_error_codes() {
    assert_eq!(AppError::UserNotFound.error_code(), "USER_NOT_FOUND");
    assert_eq!(AppError::InvalidSecret.error_code(), "INVALID_PASSWORD");
    assert_eq!(AppError::AccountDeactivated.error_code(), "ACCOUNT_DEACTIVATED");
    assert_eq!(AppError::Unauthenticated.error_code(), "UNAUTHENTICATED");
    assert_eq!(
        AppError::Io(IoError::new(ErrorKind::Other, "disk")).status_code(),
        StatusCode::INTERNAL_SERVER_ERROR
    );
}

#[test]
fn test_internal_details_are_not_exposed() {
    let err = AppError::BackendUnavailable("user store is corrupt at /srv/users.json".to_string());
    assert_eq!(err.sanitized_message(), "An internal server error occurred");
    assert!(err.details().is_none());
}

#[test]
fn test_not_found_and_wrong_password_share_a_message() {
    assert_eq!(
        AppError::UserNotFound.sanitized_message(),
        AppError::InvalidSecret.sanitized_message()
    );
}
