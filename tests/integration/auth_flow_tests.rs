// =========================
// tests/integration/auth_flow_tests.rs
// =========================
//! End-to-end flows over the HTTP router in fallback mode
use crate::test_utils::*;
use axum::http::StatusCode;
use serde_json::{json, Value};

async fn register(router: &axum::Router, email: &str, role: &str) -> String {
    let (status, body) = call(
        router,
        json_request(
            "POST",
            "/register",
            json!({ "email": email, "name": "Test User", "password": TEST_PASSWORD, "role": role }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
    body["userId"].as_str().unwrap().to_string()
}

async fn sign_in(router: &axum::Router, body: Value) -> (StatusCode, Value) {
    call(router, json_request("POST", "/session", body)).await
}

#[tokio::test]
async fn test_health_reports_fallback_backend() {
    let (_state, router, _temp_dir) = setup_test_env().await;

    let (status, body) = call(&router, empty_request("GET", "/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["backend"], "in-memory");
    assert_eq!(body["reason"], "no connection string configured");
}

#[tokio::test]
async fn test_full_patient_flow() {
    let (_state, router, _temp_dir) = setup_test_env().await;
    let user_id = register(&router, "test@gmail.com", "PATIENT").await;

    let (status, body) = sign_in(
        &router,
        json!({ "identifier": "test@gmail.com", "secret": TEST_PASSWORD, "role": "PATIENT" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "PATIENT");
    assert_eq!(body["userId"], user_id.as_str());
    assert_eq!(body["name"], "Test User");
    let token = body["token"].as_str().unwrap().to_string();

    let (status, body) = call(&router, empty_request("GET", &format!("/session?token={token}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["valid"], true);
    assert_eq!(body["session"]["email"], "test@gmail.com");
    assert_eq!(body["session"]["role"], "PATIENT");

    let (status, body) = call(&router, bearer_request("/whoami/patient", &token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["userId"], user_id.as_str());

    let (status, _) = call(&router, empty_request("DELETE", &format!("/session?token={token}"))).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = call(&router, empty_request("GET", &format!("/session?token={token}"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "UNAUTHENTICATED");

    // sign-out is idempotent
    let (status, _) = call(&router, empty_request("DELETE", &format!("/session?token={token}"))).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_role_mismatch_reports_both_roles() {
    let (_state, router, _temp_dir) = setup_test_env().await;
    register(&router, "test@gmail.com", "DOCTOR").await;

    let (status, body) = sign_in(
        &router,
        json!({ "identifier": "test@gmail.com", "secret": TEST_PASSWORD, "role": "PATIENT" }),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "ROLE_MISMATCH");
    assert_eq!(body["error"]["details"]["requestedRole"], "PATIENT");
    assert_eq!(body["error"]["details"]["storedRole"], "DOCTOR");
}

#[tokio::test]
async fn test_unknown_user_and_wrong_password_look_alike() {
    let (_state, router, _temp_dir) = setup_test_env().await;
    register(&router, "test@gmail.com", "PATIENT").await;

    let (unknown_status, unknown) =
        sign_in(&router, json!({ "identifier": "nobody@gmail.com", "secret": TEST_PASSWORD })).await;
    let (wrong_status, wrong) =
        sign_in(&router, json!({ "identifier": "test@gmail.com", "secret": "Wrong-passw0rd" })).await;

    assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown["error"]["message"], wrong["error"]["message"]);
    assert_eq!(unknown["error"]["code"], "USER_NOT_FOUND");
    assert_eq!(wrong["error"]["code"], "INVALID_PASSWORD");
}

#[tokio::test]
async fn test_missing_fields_are_bad_requests() {
    let (_state, router, _temp_dir) = setup_test_env().await;

    let (status, body) = sign_in(&router, json!({ "identifier": "test@gmail.com" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_INPUT");

    let (status, _) = sign_in(&router, json!({ "identifier": "  ", "secret": "x" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = call(&router, empty_request("GET", "/session")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_INPUT");

    let (status, _) = call(&router, empty_request("DELETE", "/session?token=")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_malformed_json_uses_error_shape() {
    let (_state, router, _temp_dir) = setup_test_env().await;

    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/session")
        .header("content-type", "application/json")
        .body(axum::body::Body::from("{not json"))
        .unwrap();
    let (status, body) = call(&router, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_INPUT");
}

#[tokio::test]
async fn test_one_account_holds_sessions_for_both_roles() {
    let (_state, router, _temp_dir) = setup_test_env().await;
    register(&router, "patient@gmail.com", "PATIENT").await;
    register(&router, "doctor@gmail.com", "DOCTOR").await;

    let (_, patient) = sign_in(
        &router,
        json!({ "identifier": "patient@gmail.com", "secret": TEST_PASSWORD, "role": "PATIENT", "multiSession": true }),
    )
    .await;
    let (_, doctor) = sign_in(
        &router,
        json!({ "identifier": "doctor@gmail.com", "secret": TEST_PASSWORD, "role": "DOCTOR", "multiSession": true }),
    )
    .await;
    let patient_token = patient["token"].as_str().unwrap();
    let doctor_token = doctor["token"].as_str().unwrap();
    assert_ne!(patient_token, doctor_token);

    let (status, _) = call(&router, bearer_request("/whoami/PATIENT", patient_token)).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = call(&router, bearer_request("/whoami/DOCTOR", doctor_token)).await;
    assert_eq!(status, StatusCode::OK);

    // signing the patient out leaves the doctor session alone
    call(&router, empty_request("DELETE", &format!("/session?token={patient_token}"))).await;
    let (status, _) = call(&router, bearer_request("/whoami/PATIENT", patient_token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = call(&router, bearer_request("/whoami/DOCTOR", doctor_token)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_gate_deny_matches_unauthenticated() {
    let (_state, router, _temp_dir) = setup_test_env().await;
    register(&router, "test@gmail.com", "PATIENT").await;
    let (_, body) = sign_in(&router, json!({ "identifier": "test@gmail.com", "secret": TEST_PASSWORD })).await;
    let token = body["token"].as_str().unwrap();

    let denied = call(&router, bearer_request("/whoami/doctor", token)).await;
    let anonymous = call(&router, empty_request("GET", "/whoami/doctor")).await;
    let bogus = call(&router, bearer_request("/whoami/doctor", "not-a-token")).await;

    assert_eq!(denied.0, StatusCode::UNAUTHORIZED);
    assert_eq!(denied, anonymous);
    assert_eq!(denied, bogus);

    let (status, _) = call(&router, bearer_request("/whoami/nurse", token)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_duplicate_registration_conflicts() {
    let (_state, router, _temp_dir) = setup_test_env().await;
    register(&router, "test@gmail.com", "PATIENT").await;

    let (status, body) = call(
        &router,
        json_request(
            "POST",
            "/register",
            json!({ "email": "TEST@gmail.com", "name": "Again", "password": TEST_PASSWORD, "role": "DOCTOR" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "ALREADY_REGISTERED");
}

#[tokio::test]
async fn test_sessions_survive_restart_on_the_same_data_dir() {
    let temp_dir = tempfile::TempDir::new().unwrap();
    let settings = test_settings(&temp_dir);

    let token = {
        let (_state, router) = build(settings.clone()).await;
        register(&router, "test@gmail.com", "PATIENT").await;
        let (_, body) = sign_in(&router, json!({ "identifier": "test@gmail.com", "secret": TEST_PASSWORD })).await;
        body["token"].as_str().unwrap().to_string()
    };

    // the in-memory accounts are gone, the token store is not
    let (_state, router) = build(settings).await;
    let (status, body) = call(&router, empty_request("GET", &format!("/session?token={token}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["session"]["email"], "test@gmail.com");

    let (status, _) = sign_in(&router, json!({ "identifier": "test@gmail.com", "secret": TEST_PASSWORD })).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
