// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Load simulation: bulk-creates players and plays a round robin between
//! every registered user. Only reachable when simulation is enabled.

use crate::error::{AppError, Result};
use crate::models::{MatchResult, User};
use crate::services::identity::IdentityService;
use crate::services::password;
use crate::services::scores::ScoreService;
use futures_util::{stream, StreamExt, TryStreamExt};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;

/// Password given to every simulated player.
pub const SIMULATED_PASSWORD: &str = "123456";

/// Round robin cost grows quadratically, so the batch size is capped.
pub const MAX_SIMULATED_USERS: u32 = 500;

const MAX_CONCURRENT_MATCHES: usize = 32;

/// Raw match scores are drawn from `0..MAX_RAW_SCORE`.
const MAX_RAW_SCORE: i64 = 10;

const FIRST_NAMES: &[&str] = &[
    "Ada", "Alan", "Barbara", "Dennis", "Edsger", "Frances", "Grace", "Ken", "Linus", "Margaret",
    "Niklaus", "Radia", "Tony", "Yukihiro",
];

const SURNAMES: &[&str] = &[
    "Allen", "Dijkstra", "Hamilton", "Hoare", "Hopper", "Kay", "Knuth", "Liskov", "Lovelace",
    "Perlman", "Ritchie", "Thompson", "Turing", "Wirth",
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationSummary {
    pub users_created: u64,
    pub matches_played: u64,
    pub matches_skipped: u64,
}

#[derive(Clone)]
pub struct SimulationService {
    identity: IdentityService,
    scores: ScoreService,
}

impl SimulationService {
    pub fn new(identity: IdentityService, scores: ScoreService) -> Self {
        Self { identity, scores }
    }

    /// Create `user_count` players, then play every pair once.
    pub async fn run(&self, user_count: u32) -> Result<SimulationSummary> {
        if user_count > MAX_SIMULATED_USERS {
            return Err(AppError::validation(format!(
                "At most {} users can be simulated at once",
                MAX_SIMULATED_USERS
            )));
        }

        let users_created = self.create_sim_users(user_count).await?.len() as u64;
        let (matches_played, matches_skipped) = self.run_round_robin().await?;

        let summary = SimulationSummary {
            users_created,
            matches_played,
            matches_skipped,
        };
        tracing::info!(
            users_created,
            matches_played,
            matches_skipped,
            "Simulation finished"
        );
        Ok(summary)
    }

    /// Register `count` players named `player_{id}` with random names.
    /// Returns the ids that were created.
    pub async fn create_sim_users(&self, count: u32) -> Result<Vec<u64>> {
        if count == 0 {
            return Ok(Vec::new());
        }
        // Every simulated player shares a password, so hash it once.
        let password_hash =
            password::hash_password(SIMULATED_PASSWORD, self.identity.bcrypt_cost()).await?;

        let mut created = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let id = self.identity.allocate_id().await?;
            let (name, surname) = random_name();
            let user = User {
                id,
                username: format!("player_{}", id),
                password_hash: password_hash.clone(),
                name,
                surname,
                score: 0,
                token: None,
            };
            match self.identity.store_new_user(user).await {
                Ok(_) => created.push(id),
                Err(AppError::Conflict(_)) => {
                    tracing::warn!(user_id = id, "Simulated username taken, skipping");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(created)
    }

    /// Play one match between every pair of ids up to the last allocated
    /// one, up to `MAX_CONCURRENT_MATCHES` at a time. Ids without a profile
    /// (failed registrations) are skipped; a store error stops the run.
    pub async fn run_round_robin(&self) -> Result<(u64, u64)> {
        let last = self.identity.last_allocated_id().await?;
        let pairs = (1..=last)
            .flat_map(move |first| ((first + 1)..=last).map(move |second| (first, second)));

        let (played, skipped) = stream::iter(pairs)
            .map(|(first, second)| async move {
                let (a, b) = random_scores();
                match self
                    .scores
                    .apply_match_result(MatchResult::new(first, second, a, b))
                    .await
                {
                    Ok(_) => Ok(true),
                    Err(AppError::NotFound(reason)) => {
                        tracing::warn!(first, second, %reason, "Skipping simulated match");
                        Ok(false)
                    }
                    Err(e) => Err(e),
                }
            })
            .buffer_unordered(MAX_CONCURRENT_MATCHES)
            .try_fold((0u64, 0u64), |(played, skipped), was_played| async move {
                Ok::<_, AppError>(if was_played {
                    (played + 1, skipped)
                } else {
                    (played, skipped + 1)
                })
            })
            .await?;
        Ok((played, skipped))
    }
}

fn random_name() -> (String, String) {
    let mut rng = rand::thread_rng();
    (
        FIRST_NAMES.choose(&mut rng).copied().unwrap_or("Player").to_string(),
        SURNAMES.choose(&mut rng).copied().unwrap_or_default().to_string(),
    )
}

fn random_scores() -> (i64, i64) {
    let mut rng = rand::thread_rng();
    (
        rng.gen_range(0..MAX_RAW_SCORE),
        rng.gen_range(0..MAX_RAW_SCORE),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::db::memory::FailingStore;
    use crate::db::Db;
    use crate::models::{NewUser, PageRequest};
    use std::sync::atomic::Ordering;

    fn setup() -> (IdentityService, ScoreService, SimulationService) {
        let db = Db::memory();
        let identity = IdentityService::new(db.clone(), &Config::test_default());
        let scores = ScoreService::new(db, identity.clone());
        let simulation = SimulationService::new(identity.clone(), scores.clone());
        (identity, scores, simulation)
    }

    #[tokio::test]
    async fn test_run_creates_and_plays_everyone() {
        let (identity, scores, simulation) = setup();

        let summary = simulation.run(4).await.unwrap();
        assert_eq!(
            summary,
            SimulationSummary {
                users_created: 4,
                matches_played: 6,
                matches_skipped: 0,
            }
        );

        let player = identity.get_user(3).await.unwrap().unwrap();
        assert_eq!(player.username, "player_3");
        assert!(identity.login("player_3", SIMULATED_PASSWORD).await.is_ok());

        // Each player played 3 matches, earning at least 1 point per match.
        let page = scores
            .leaderboard_page(PageRequest::new(1, 10))
            .await
            .unwrap();
        assert_eq!(page.len(), 4);
        assert!(page.entries().all(|e| e.score >= 3));
    }

    #[tokio::test]
    async fn test_round_robin_skips_missing_ids() {
        let (identity, _scores, simulation) = setup();
        identity
            .register(NewUser {
                username: "alice".to_string(),
                password: "pw".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        // Reserve an id that never gets a profile.
        identity.allocate_id().await.unwrap();
        identity
            .register(NewUser {
                username: "bob".to_string(),
                password: "pw".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();

        let (played, skipped) = simulation.run_round_robin().await.unwrap();
        assert_eq!(played, 1);
        assert_eq!(skipped, 2);
    }

    #[tokio::test]
    async fn test_round_robin_stops_on_store_error() {
        let (store, fail_transactions) = FailingStore::new();
        let db = Db::new(store);
        let identity = IdentityService::new(db.clone(), &Config::test_default());
        let scores = ScoreService::new(db, identity.clone());
        let simulation = SimulationService::new(identity.clone(), scores);
        simulation.create_sim_users(3).await.unwrap();

        fail_transactions.store(true, Ordering::SeqCst);
        assert!(matches!(
            simulation.run_round_robin().await,
            Err(AppError::Store(_))
        ));
    }

    #[tokio::test]
    async fn test_rejects_oversized_batch() {
        let (_identity, _scores, simulation) = setup();
        assert!(matches!(
            simulation.run(MAX_SIMULATED_USERS + 1).await,
            Err(AppError::Validation(_))
        ));
    }
}
