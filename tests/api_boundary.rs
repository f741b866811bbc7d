//! Request validation that happens before any database access.

mod common;

use axum::http::StatusCode;
use orders_api::{
    entity::enums::UserType,
    error::MISSING_ARGUMENTS,
    routes::extract::{FILE_NEEDS_MULTIPART, NO_CATALOG_SOURCE},
};
use serde_json::json;

use common::{bearer, json_request, multipart_request, offline_app, send};

#[tokio::test]
async fn protected_routes_require_a_token() {
    let test = offline_app();
    for uri in ["/api/basket", "/api/orders", "/api/contacts", "/api/user/details"] {
        let (status, body) = send(&test.app, common::get_request(uri, None)).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{uri}");
        assert_eq!(body["Status"], false);
    }

    let (status, _) = send(
        &test.app,
        common::get_request("/api/basket", Some("Bearer not-a-jwt")),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn upload_is_for_shops_only() {
    let test = offline_app();
    let token = bearer(1, UserType::Customer);
    let (status, body) = send(
        &test.app,
        json_request(
            "POST",
            "/api/upload",
            Some(&token),
            json!({ "url": "https://example.com/shop1.yaml" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["Errors"], "Только для магазинов");
}

#[tokio::test]
async fn upload_needs_exactly_one_valid_source() {
    let test = offline_app();
    let token = bearer(1, UserType::Shop);

    let (status, body) = send(
        &test.app,
        json_request("POST", "/api/upload", Some(&token), json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["Errors"], NO_CATALOG_SOURCE);

    let (status, body) = send(
        &test.app,
        json_request("POST", "/api/upload", Some(&token), json!({ "url": "not a url" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["Errors"], "Введите правильный URL.");

    let (status, _) = send(
        &test.app,
        multipart_request(
            &token,
            &[("url", "https://example.com/shop1.yaml")],
            Some(("shop1.yaml", "shop: x")),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &test.app,
        json_request(
            "POST",
            "/api/upload",
            Some(&token),
            json!({ "filename": "shop1.yaml" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["Errors"], FILE_NEEDS_MULTIPART);
}

#[tokio::test]
async fn malformed_yaml_upload_is_a_parse_error() {
    let test = offline_app();
    let token = bearer(1, UserType::Shop);
    let name = format!("broken_{}.yaml", uuid::Uuid::new_v4().simple());
    let (status, body) = send(
        &test.app,
        multipart_request(&token, &[], Some((name.as_str(), "shop: [unclosed"))),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["Status"], false);

    let media_dir = &test.state.config.media_dir;
    let leftovers = std::fs::read_dir(media_dir)
        .map(|entries| {
            entries
                .filter_map(Result::ok)
                .filter(|e| e.file_name().to_string_lossy().ends_with(&name))
                .count()
        })
        .unwrap_or(0);
    assert_eq!(leftovers, 0, "rejected upload left in {}", media_dir.display());
}

#[tokio::test]
async fn checkout_needs_a_numeric_id() {
    let test = offline_app();
    let token = bearer(1, UserType::Customer);
    for body in [json!({}), json!({ "id": "abc" })] {
        let (status, resp) = send(
            &test.app,
            json_request("POST", "/api/orders", Some(&token), body),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(resp["Errors"], MISSING_ARGUMENTS);
    }
}

#[tokio::test]
async fn basket_rejects_empty_and_malformed_requests() {
    let test = offline_app();
    let token = bearer(1, UserType::Customer);

    let (status, body) = send(
        &test.app,
        json_request("POST", "/api/basket", Some(&token), json!([])),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["Errors"], MISSING_ARGUMENTS);

    let (status, body) = send(
        &test.app,
        json_request("POST", "/api/basket", Some(&token), json!({ "product": "x" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["Errors"], "Некорректный формат данных");

    let (status, body) = send(
        &test.app,
        json_request("DELETE", "/api/basket", Some(&token), json!({ "items": "abc" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["Errors"], MISSING_ARGUMENTS);
}

#[tokio::test]
async fn contacts_are_validated() {
    let test = offline_app();
    let token = bearer(1, UserType::Customer);

    let (status, body) = send(
        &test.app,
        json_request(
            "POST",
            "/api/contacts",
            Some(&token),
            json!({ "type": "phone", "value": "abc" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["Errors"], "Некорректный формат номера");

    let (status, body) = send(
        &test.app,
        json_request("PUT", "/api/contacts", Some(&token), json!({ "value": "дом 1" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["Errors"], MISSING_ARGUMENTS);
}

#[tokio::test]
async fn registration_checks_passwords_first() {
    let test = offline_app();
    let (status, body) = send(
        &test.app,
        json_request(
            "POST",
            "/api/registration",
            None,
            json!({
                "first_name": "Иван",
                "last_name": "Петров",
                "email": "ivan@example.com",
                "password": "s3cret-pass",
                "password2": "other-pass",
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["Errors"], "Пароли не совпадают");
}
