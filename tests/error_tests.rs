// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::http::StatusCode;
use axum::response::IntoResponse;
use reflexy_diary::error::AppError;

async fn status_and_body(err: AppError) -> (StatusCode, String) {
    let response = err.into_response();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

#[tokio::test]
async fn test_not_found_and_access_denied_have_empty_bodies() {
    let (status, body) = status_and_body(AppError::story_not_found(5)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.is_empty());

    let (status, body) = status_and_body(AppError::AccessDenied("nope".to_string())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body.is_empty());
}

#[tokio::test]
async fn test_bad_request_carries_details() {
    let (status, body) = status_and_body(AppError::BadRequest("title".to_string())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"error":"bad_request","details":"title"}"#);
}

#[tokio::test]
async fn test_internal_errors_hide_details() {
    let (status, body) =
        status_and_body(AppError::Internal(anyhow::anyhow!("story has no id"))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, r#"{"error":"internal_error"}"#);

    let (status, body) = status_and_body(AppError::Database("down".to_string())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, r#"{"error":"database_error"}"#);
}

#[test]
fn test_not_found_message_names_story() {
    let err = AppError::story_not_found(42);
    assert_eq!(
        err.to_string(),
        "Resource not found: Could not find story with id 42"
    );
}
