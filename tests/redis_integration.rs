// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Integration tests against a real Redis server.
//!
//! Run with: REDIS_URL=redis://127.0.0.1:6379 cargo test --test redis_integration
//! Each test works under keys derived from a random prefix so runs do not
//! collide, but the server should be a scratch instance.

use game_backend::db::{keys, Command, Reply};
use game_backend::services::token::generate_token;

mod common;

fn scratch_key(name: &str) -> String {
    format!("test:{}:{}", generate_token(), name)
}

#[tokio::test]
async fn test_redis_ping() {
    require_redis!();
    let db = common::test_redis_db().await;
    db.ping().await.unwrap();
}

#[tokio::test]
async fn test_redis_claims_are_exclusive() {
    require_redis!();
    let db = common::test_redis_db().await;
    let key = scratch_key("claim");

    assert!(db.set_nx(&key, "1").await.unwrap());
    assert!(!db.set_nx(&key, "2").await.unwrap());
    assert_eq!(db.get(&key).await.unwrap().as_deref(), Some("1"));

    assert!(db.del(&key).await.unwrap());
}

#[tokio::test]
async fn test_redis_transaction_returns_every_reply() {
    require_redis!();
    let db = common::test_redis_db().await;
    let profile = scratch_key("user");
    let ranking = scratch_key("leaderboard");

    let replies = db
        .transaction(vec![
            Command::hset(&profile, [("id", "1"), ("score", "0")]),
            Command::HIncrBy {
                key: profile.clone(),
                field: "score".to_string(),
                delta: 4,
            },
            Command::ZIncrBy {
                key: ranking.clone(),
                member: "1".to_string(),
                delta: 4.0,
            },
        ])
        .await
        .unwrap();

    assert_eq!(replies[1], Reply::Int(4));
    assert_eq!(replies[2], Reply::Float(4.0));

    db.del(&profile).await.unwrap();
    db.del(&ranking).await.unwrap();
}

#[tokio::test]
async fn test_redis_sorted_set_ordering() {
    require_redis!();
    let db = common::test_redis_db().await;
    let key = scratch_key(keys::LEADERBOARD);

    for (member, score) in [("1", 5.0), ("2", 9.0), ("3", 5.0)] {
        db.execute(Command::zadd(&key, member, score)).await.unwrap();
    }
    assert!(!db.zadd_new(&key, "2", 0.0).await.unwrap());

    let top = db.zrange_with_scores(&key, 0, -1, true).await.unwrap();
    let members: Vec<&str> = top.iter().map(|(m, _)| m.as_str()).collect();
    assert_eq!(members, vec!["2", "3", "1"]);
    assert_eq!(db.zrank(&key, "1", true).await.unwrap(), Some(2));
    assert_eq!(db.zscore(&key, "missing").await.unwrap(), None);

    db.del(&key).await.unwrap();
}
