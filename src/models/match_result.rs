//! Match outcomes and the scoring rule.

use serde::Deserialize;

/// Points for the player with the strictly higher raw score.
pub const WIN_POINTS: u64 = 3;
/// Points every participant earns, win, lose or draw.
pub const PARTICIPATION_POINTS: u64 = 1;

/// Result of one match between two players. Only its score effect is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    #[serde(alias = "firstuserid")]
    pub first_user_id: u64,
    #[serde(alias = "seconduserid")]
    pub second_user_id: u64,
    #[serde(alias = "firstuserscore")]
    pub first_user_score: i64,
    #[serde(alias = "seconduserscore")]
    pub second_user_score: i64,
}

impl MatchResult {
    pub fn new(first_user_id: u64, second_user_id: u64, first: i64, second: i64) -> Self {
        Self {
            first_user_id,
            second_user_id,
            first_user_score: first,
            second_user_score: second,
        }
    }

    /// Score increments `(first, second)` for this result.
    pub fn points(&self) -> (u64, u64) {
        let bonus = |mine: i64, theirs: i64| if mine > theirs { WIN_POINTS } else { 0 };
        (
            PARTICIPATION_POINTS + bonus(self.first_user_score, self.second_user_score),
            PARTICIPATION_POINTS + bonus(self.second_user_score, self.first_user_score),
        )
    }
}
