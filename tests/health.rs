mod common;

use axum::http::StatusCode;

#[tokio::test]
async fn health_check_returns_ok_without_database() {
    let test = common::offline_app();
    let (status, body) = common::send(&test.app, common::get_request("/health", None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["Status"], true);
    assert_eq!(body["message"], "Health check");
    assert_eq!(body["data"]["status"], "ok");
    assert_eq!(body["data"]["database"], "unavailable");
}

#[tokio::test]
async fn unknown_route_uses_error_envelope() {
    let test = common::offline_app();
    let (status, body) = common::send(&test.app, common::get_request("/nope", None)).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["Status"], false);
    assert!(body["Errors"].is_string());
}
