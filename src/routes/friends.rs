// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Friend search, requests and friend lists. All routes require auth,
//! applied in routes/mod.rs.

use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::models::{Decision, Friend, FriendRequest, PageRequest};
use crate::routes::{ApiResponse, MessageResponse};
use crate::AppState;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/friends", get(list_friends))
        .route("/friends/search", post(search_user))
        .route(
            "/friends/requests",
            get(list_requests).post(send_request),
        )
        .route("/friends/requests/respond", post(respond))
}

// ─── Search ──────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub username: String,
}

#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SearchResponse {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub id: u64,
}

async fn search_user(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(body): Json<SearchRequest>,
) -> Result<Json<ApiResponse<SearchResponse>>> {
    let id = state.friends.search_user(&auth.user, &body.username).await?;
    Ok(ApiResponse::ok(SearchResponse { id }))
}

// ─── Requests ────────────────────────────────────────────────

/// Target user of a new request.
#[derive(Debug, Deserialize)]
pub struct SendRequest {
    pub id: u64,
}

async fn send_request(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(body): Json<SendRequest>,
) -> Result<(StatusCode, Json<ApiResponse<MessageResponse>>)> {
    let recipient = state.friends.send_request(auth.id(), body.id).await?;
    Ok(ApiResponse::created(MessageResponse {
        message: format!("Friend request sent to {}", recipient),
    }))
}

async fn list_requests(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Query(page): Query<PageRequest>,
) -> Result<Json<ApiResponse<Vec<FriendRequest>>>> {
    let pending = state.friends.list_requests(auth.id(), page).await?;
    Ok(ApiResponse::ok(pending))
}

/// Answer to a pending request from user `id`.
#[derive(Debug, Deserialize)]
pub struct RespondRequest {
    pub id: u64,
    pub status: Decision,
}

async fn respond(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(body): Json<RespondRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>> {
    state
        .friends
        .respond(auth.id(), body.id, body.status)
        .await?;
    let message = match body.status {
        Decision::Accept => "Friend request accepted",
        Decision::Reject => "Friend request rejected",
    };
    Ok(ApiResponse::ok(MessageResponse {
        message: message.to_string(),
    }))
}

// ─── Friends ─────────────────────────────────────────────────

async fn list_friends(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Query(page): Query<PageRequest>,
) -> Result<Json<ApiResponse<Vec<Friend>>>> {
    let friends = state.friends.list_friends(auth.id(), page).await?;
    Ok(ApiResponse::ok(friends))
}
