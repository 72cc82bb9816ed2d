// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Account routes: registration, login and profiles.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{NewUser, ProfileUpdate, PublicUser};
use crate::routes::ApiResponse;
use crate::services::Session;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Public account routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/users", post(register))
        .route("/users/login", post(login))
        .route("/users/{id}", get(get_user))
}

/// Routes for the signed-in user. Auth is applied in routes/mod.rs.
pub fn protected_routes() -> Router<Arc<AppState>> {
    Router::new().route("/users/me", get(get_me).put(update_me))
}

// ─── Registration & Login ────────────────────────────────────

async fn register(
    State(state): State<Arc<AppState>>,
    Json(body): Json<NewUser>,
) -> Result<(StatusCode, Json<ApiResponse<Session>>)> {
    let session = state.identity.register(body).await?;
    Ok(ApiResponse::created(session))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

async fn login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<ApiResponse<Session>>> {
    let session = state.identity.login(&body.username, &body.password).await?;
    Ok(ApiResponse::ok(session))
}

// ─── Profiles ────────────────────────────────────────────────

/// Public profile with the user's current leaderboard position.
#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ProfileResponse {
    #[serde(flatten)]
    #[cfg_attr(feature = "binding-generation", ts(flatten))]
    pub user: PublicUser,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "binding-generation", ts(type = "number | null"))]
    pub rank: Option<u64>,
}

async fn profile(state: &AppState, user: PublicUser) -> Result<ProfileResponse> {
    let rank = state.scores.rank_of(user.id).await?;
    Ok(ProfileResponse { user, rank })
}

async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<ProfileResponse>>> {
    let id: u64 = id
        .parse()
        .map_err(|_| AppError::validation("User ID must be a positive integer"))?;
    let user = state
        .identity
        .get_user(id)
        .await?
        .ok_or_else(|| AppError::not_found("User does not exist"))?;

    Ok(ApiResponse::ok(profile(&state, user.public()).await?))
}

async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<ApiResponse<ProfileResponse>>> {
    Ok(ApiResponse::ok(profile(&state, auth.user.public()).await?))
}

async fn update_me(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(body): Json<ProfileUpdate>,
) -> Result<Json<ApiResponse<PublicUser>>> {
    let user = state.identity.update_profile(auth.id(), body).await?;
    Ok(ApiResponse::ok(user.public()))
}
