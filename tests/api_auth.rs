mod common;

use axum::http::StatusCode;

use common::{body_json, mint_token, send, test_router, TEST_SECRET};

#[tokio::test]
async fn health_is_open() {
    let response = send(test_router(), "GET", "/health", None).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn missing_token_is_unauthorized() {
    let response = send(test_router(), "GET", "/get_run_list", None).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["Response"], "Error - Not authorized.");
}

#[tokio::test]
async fn garbage_token_is_unauthorized() {
    let response = send(
        test_router(),
        "GET",
        "/get_run_list",
        Some("not-a-real-token"),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn token_signed_with_wrong_secret_is_unauthorized() {
    let token = mint_token("some-other-secret");
    let response = send(test_router(), "GET", "/get_run_list", Some(&token)).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn valid_token_reaches_the_handler() {
    let token = mint_token(TEST_SECRET);
    let response = send(test_router(), "GET", "/get_run_list", Some(&token)).await;

    // past the gate; the unreachable test database turns into a 500, not a 401
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(
        body["Response"],
        "Exception detected trying to gather run data."
    );
}
