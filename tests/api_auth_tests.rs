// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API authentication and CORS tests.
//!
//! These tests verify that:
//! 1. Protected routes reject requests without valid tokens
//! 2. Protected routes accept Bearer and bare tokens
//! 3. CORS preflight requests return correct headers

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use tower::ServiceExt;

mod common;

use common::{create_test_app, register, send};

#[tokio::test]
async fn test_protected_route_without_token() {
    let (app, _) = create_test_app();

    let (status, body) = send(&app, Method::GET, "/users/me", None, None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["status"], false);
    assert_eq!(body["message"], "Missing token");
}

#[tokio::test]
async fn test_protected_route_with_unknown_token() {
    let (app, _) = create_test_app();
    register(&app, "alice").await;

    let (status, body) = send(
        &app,
        Method::GET,
        "/friends",
        Some("AAAAAAAAAA-BBBBBBBBBB-CCCCCCCCCC-DDDDDDDDDD"),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["status"], false);
}

#[tokio::test]
async fn test_protected_route_with_bearer_token() {
    let (app, _) = create_test_app();
    let (id, token) = register(&app, "alice").await;

    let (status, body) = send(&app, Method::GET, "/users/me", Some(token.as_str()), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], true);
    assert_eq!(body["result"]["id"], id);
    assert_eq!(body["result"]["username"], "alice");
    assert!(body["result"].get("password").is_none());
    assert!(body["result"].get("token").is_none());
}

#[tokio::test]
async fn test_protected_route_with_bare_token() {
    let (app, _) = create_test_app();
    let (_, token) = register(&app, "alice").await;

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/users/me")
                .header(header::AUTHORIZATION, token)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_rotated_token_is_rejected() {
    let (app, state) = create_test_app();
    let (id, old_token) = register(&app, "alice").await;

    let new_token = state.identity.create_token(id).await.unwrap();

    let (status, _) = send(&app, Method::GET, "/users/me", Some(old_token.as_str()), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, Method::GET, "/users/me", Some(new_token.as_str()), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_cors_preflight() {
    let (app, _) = create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/friends")
                .header(header::ORIGIN, "http://localhost:5173")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    // OPTIONS should return 200 (CORS preflight success)
    assert_eq!(response.status(), StatusCode::OK);

    // Should have CORS headers
    assert!(response
        .headers()
        .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
    assert!(response
        .headers()
        .contains_key(header::ACCESS_CONTROL_ALLOW_METHODS));
}

#[tokio::test]
async fn test_public_route_no_auth_required() {
    let (app, _) = create_test_app();

    let (status, body) = send(&app, Method::GET, "/health", None, None).await;

    // Health should be accessible without auth
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["store"], "ok");
}
