// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Match scoring and the global leaderboard.
//!
//! A user's score lives twice: in the profile hash and as their score in
//! the `leaderboard` sorted set. Both are incremented in one transaction and
//! the committed values are compared afterwards.

use crate::db::{keys, Command, Db};
use crate::error::{AppError, Result};
use crate::models::user::fields;
use crate::models::{LeaderboardPage, MatchResult, PageRequest};
use crate::services::identity::{parse_id, IdentityService};

/// Scores of both players after a match was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchOutcome {
    pub first_user_score: u64,
    pub second_user_score: u64,
}

#[derive(Clone)]
pub struct ScoreService {
    db: Db,
    identity: IdentityService,
}

impl ScoreService {
    pub fn new(db: Db, identity: IdentityService) -> Self {
        Self { db, identity }
    }

    /// Award match points to both players.
    pub async fn apply_match_result(&self, result: MatchResult) -> Result<MatchOutcome> {
        let (first, second) = (result.first_user_id, result.second_user_id);
        if first == second {
            return Err(AppError::validation("User IDs are the same"));
        }
        for id in [first, second] {
            if !self.identity.user_exists(id).await? {
                return Err(AppError::not_found(format!("User {} does not exist", id)));
            }
        }

        let (first_points, second_points) = result.points();
        let replies = self
            .db
            .transaction(vec![
                increment_profile(first, first_points),
                increment_rank(first, first_points),
                increment_profile(second, second_points),
                increment_rank(second, second_points),
            ])
            .await?;

        let mut replies = replies.into_iter();
        let mut committed = Vec::with_capacity(2);
        for id in [first, second] {
            let (Some(profile), Some(ranked)) = (replies.next(), replies.next()) else {
                return Err(AppError::drift("score transaction returned too few replies"));
            };
            let profile = profile.into_int("HINCRBY")?;
            let ranked = ranked.into_float("ZINCRBY")?;
            committed.push(self.reconcile(id, profile, ranked).await?);
        }

        tracing::info!(
            first_user_id = first,
            second_user_id = second,
            first_points,
            second_points,
            "Match result applied"
        );

        Ok(MatchOutcome {
            first_user_score: committed[0],
            second_user_score: committed[1],
        })
    }

    /// Bring the leaderboard score back in line with the profile score if
    /// the two disagree after an update. The profile is authoritative.
    async fn reconcile(&self, id: u64, profile: i64, ranked: f64) -> Result<u64> {
        let score = u64::try_from(profile)
            .map_err(|_| AppError::drift(format!("user {} has negative score {}", id, profile)))?;
        if ranked != score as f64 {
            tracing::warn!(
                user_id = id,
                profile_score = score,
                leaderboard_score = ranked,
                "Leaderboard score diverged from profile, repairing"
            );
            self.db
                .execute(Command::zadd(keys::LEADERBOARD, id, score as f64))
                .await?;
        }
        Ok(score)
    }

    /// One page of the leaderboard, highest score first.
    ///
    /// A page past the last ranked user is empty, not an error.
    pub async fn leaderboard_page(&self, page: PageRequest) -> Result<LeaderboardPage> {
        let (start, end) = page.window()?;
        let ranked = self
            .db
            .zrange_with_scores(keys::LEADERBOARD, start, end, true)
            .await?;

        let offset = u64::try_from(start).unwrap_or_default();
        if ranked.is_empty() {
            return Ok(LeaderboardPage::new(offset, Vec::new()));
        }

        let ids = ranked
            .iter()
            .map(|(member, _)| parse_id(member))
            .collect::<Result<Vec<u64>>>()?;
        let usernames = self.identity.usernames(&ids).await?;

        let rows = ids
            .into_iter()
            .zip(usernames)
            .zip(ranked)
            .map(|((id, username), (_, score))| (id, username, score.max(0.0) as u64))
            .collect();

        Ok(LeaderboardPage::new(offset, rows))
    }

    /// 1-based leaderboard position of `user_id`, if ranked.
    pub async fn rank_of(&self, user_id: u64) -> Result<Option<u64>> {
        let rank = self
            .db
            .zrank(keys::LEADERBOARD, &user_id.to_string(), true)
            .await?;
        Ok(rank.and_then(|r| u64::try_from(r).ok()).map(|r| r + 1))
    }
}

fn increment_profile(id: u64, points: u64) -> Command {
    Command::HIncrBy {
        key: keys::user(id),
        field: fields::SCORE.to_string(),
        delta: points as i64,
    }
}

fn increment_rank(id: u64, points: u64) -> Command {
    Command::ZIncrBy {
        key: keys::LEADERBOARD.to_string(),
        member: id.to_string(),
        delta: points as f64,
    }
}
