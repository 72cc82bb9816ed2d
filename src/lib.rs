// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Game backend: accounts and session tokens, match scoring with a global
//! leaderboard, and a friend graph, all kept in Redis.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::Db;
use services::{FriendService, IdentityService, ScoreService, SimulationService};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: Db,
    pub identity: IdentityService,
    pub scores: ScoreService,
    pub friends: FriendService,
    pub simulation: SimulationService,
}

impl AppState {
    /// Wire every service to the same store handle.
    pub fn new(config: Config, db: Db) -> Self {
        let identity = IdentityService::new(db.clone(), &config);
        let scores = ScoreService::new(db.clone(), identity.clone());
        let friends = FriendService::new(db.clone(), identity.clone());
        let simulation = SimulationService::new(identity.clone(), scores.clone());

        Self {
            config,
            db,
            identity,
            scores,
            friends,
            simulation,
        }
    }
}
