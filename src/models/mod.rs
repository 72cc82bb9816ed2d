// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod friend;
pub mod leaderboard;
pub mod match_result;
pub mod page;
pub mod user;

pub use friend::{Decision, Friend, FriendRequest};
pub use leaderboard::{LeaderboardEntry, LeaderboardPage};
pub use match_result::MatchResult;
pub use page::PageRequest;
pub use user::{NewUser, ProfileUpdate, PublicUser, User};
