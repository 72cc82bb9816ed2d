// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Match submission and leaderboard routes.

use crate::error::Result;
use crate::models::{LeaderboardEntry, MatchResult, PageRequest};
use crate::routes::ApiResponse;
use crate::services::MatchOutcome;
use crate::AppState;
use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/leaderboard", get(get_leaderboard))
}

/// Auth is applied in routes/mod.rs.
pub fn protected_routes() -> Router<Arc<AppState>> {
    Router::new().route("/matches", post(post_match))
}

async fn get_leaderboard(
    State(state): State<Arc<AppState>>,
    Query(page): Query<PageRequest>,
) -> Result<Json<ApiResponse<Vec<LeaderboardEntry>>>> {
    let page = state.scores.leaderboard_page(page).await?;
    Ok(ApiResponse::ok(page.entries().collect()))
}

async fn post_match(
    State(state): State<Arc<AppState>>,
    Json(result): Json<MatchResult>,
) -> Result<Json<ApiResponse<MatchOutcome>>> {
    let outcome = state.scores.apply_match_result(result).await?;
    Ok(ApiResponse::ok(outcome))
}
