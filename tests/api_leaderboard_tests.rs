// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Match submission and leaderboard pagination.

use axum::http::{Method, StatusCode};
use serde_json::{json, Value};

mod common;

use common::{create_test_app, register, send};

async fn play(app: &axum::Router, token: &str, first: u64, second: u64, a: i64, b: i64) -> (StatusCode, Value) {
    send(
        app,
        Method::POST,
        "/matches",
        Some(token),
        Some(json!({
            "firstUserId": first,
            "secondUserId": second,
            "firstUserScore": a,
            "secondUserScore": b
        })),
    )
    .await
}

#[tokio::test]
async fn test_match_updates_scores() {
    let (app, _) = create_test_app();
    let (alice, token) = register(&app, "alice").await;
    let (bob, _) = register(&app, "bob").await;

    let (status, body) = play(&app, &token, alice, bob, 3, 1).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"]["firstUserScore"], 4);
    assert_eq!(body["result"]["secondUserScore"], 1);

    // Draw: participation only.
    let (_, body) = play(&app, &token, alice, bob, 2, 2).await;
    assert_eq!(body["result"]["firstUserScore"], 5);
    assert_eq!(body["result"]["secondUserScore"], 2);

    let (_, body) = send(&app, Method::GET, &format!("/users/{}", bob), None, None).await;
    assert_eq!(body["result"]["score"], 2);
}

#[tokio::test]
async fn test_match_validation() {
    let (app, _) = create_test_app();
    let (alice, token) = register(&app, "alice").await;

    let (status, body) = play(&app, &token, alice, alice, 3, 1).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "User IDs are the same");

    let (status, _) = play(&app, &token, alice, 42, 3, 1).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_match_requires_auth() {
    let (app, _) = create_test_app();
    let (status, _) = send(
        &app,
        Method::POST,
        "/matches",
        None,
        Some(json!({ "firstUserId": 1, "secondUserId": 2, "firstUserScore": 1, "secondUserScore": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_leaderboard_pagination() {
    let (app, _) = create_test_app();
    let mut players = Vec::new();
    for name in ["p1", "p2", "p3", "p4", "p5"] {
        players.push(register(&app, name).await);
    }
    let token = players[0].1.clone();

    // p5 beats everyone, p4 beats p1..p3, p3 beats p1 and p2.
    for (winner, _) in players.iter().rev().take(3) {
        for (loser, _) in players.iter().take(2) {
            play(&app, &token, *winner, *loser, 1, 0).await;
        }
    }

    let (status, body) = send(&app, Method::GET, "/leaderboard?page=1&count=2", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let first_page = body["result"].as_array().unwrap();
    assert_eq!(first_page.len(), 2);
    assert_eq!(first_page[0]["rank"], 1);
    assert_eq!(first_page[1]["rank"], 2);
    assert!(first_page[0]["score"].as_u64() >= first_page[1]["score"].as_u64());

    let (_, body) = send(&app, Method::GET, "/leaderboard?page=2&count=2", None, None).await;
    let second_page = body["result"].as_array().unwrap();
    assert_eq!(second_page.len(), 2);
    assert_eq!(second_page[0]["rank"], 3);
    assert_eq!(second_page[1]["rank"], 4);

    let (_, body) = send(&app, Method::GET, "/leaderboard?page=3&count=2", None, None).await;
    assert_eq!(body["result"].as_array().unwrap().len(), 1);

    let (status, body) = send(&app, Method::GET, "/leaderboard?page=9&count=2", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["result"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_leaderboard_defaults_and_bad_pages() {
    let (app, _) = create_test_app();
    register(&app, "alice").await;

    let (status, body) = send(&app, Method::GET, "/leaderboard", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"][0]["username"], "alice");
    assert_eq!(body["result"][0]["score"], 0);

    for query in ["page=0&count=10", "page=1&count=0", "page=-2&count=5"] {
        let (status, body) =
            send(&app, Method::GET, &format!("/leaderboard?{}", query), None, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", query);
        assert_eq!(body["status"], false);
    }
}
