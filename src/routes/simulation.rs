// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Operator route that seeds players and plays a round robin.
//! Only mounted when `ENABLE_SIMULATION` is set.

use crate::error::Result;
use crate::routes::ApiResponse;
use crate::services::SimulationSummary;
use crate::AppState;
use axum::{extract::State, routing::post, Json, Router};
use serde::Deserialize;
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/simulate", post(simulate))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulateRequest {
    #[serde(default)]
    pub user_count: u32,
}

async fn simulate(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SimulateRequest>,
) -> Result<Json<ApiResponse<SimulationSummary>>> {
    tracing::info!(user_count = body.user_count, "Starting simulation");
    let summary = state.simulation.run(body.user_count).await?;
    Ok(ApiResponse::ok(summary))
}
