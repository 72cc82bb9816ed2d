// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod friends;
pub mod identity;
pub mod password;
pub mod scores;
pub mod simulation;
pub mod token;

pub use friends::FriendService;
pub use identity::{IdentityService, Session};
pub use scores::{MatchOutcome, ScoreService};
pub use simulation::{SimulationService, SimulationSummary};
