//! Ranked leaderboard entries.

use serde::Serialize;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// One row of the leaderboard. Derived from the ranking index, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LeaderboardEntry {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub rank: u64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub id: u64,
    pub username: String,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub score: u64,
}

/// A fetched leaderboard page.
///
/// Holds the joined rows of one index window; [`entries`](Self::entries)
/// numbers them lazily and can be iterated any number of times.
#[derive(Debug, Clone, Default)]
pub struct LeaderboardPage {
    start: u64,
    rows: Vec<(u64, String, u64)>,
}

impl LeaderboardPage {
    /// `start` is the zero-based index of the first row within the whole index.
    pub fn new(start: u64, rows: Vec<(u64, String, u64)>) -> Self {
        Self { start, rows }
    }

    /// Entries with absolute ranks: `rank = start + position + 1`.
    pub fn entries(&self) -> impl Iterator<Item = LeaderboardEntry> + '_ {
        self.rows
            .iter()
            .enumerate()
            .map(move |(position, (id, username, score))| LeaderboardEntry {
                rank: self.start + position as u64 + 1,
                id: *id,
                username: username.clone(),
                score: *score,
            })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
