// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Store layer (Redis, or an in-process keyspace for tests).
//!
//! Services talk to the store through [`Db`], a cloneable handle over any
//! [`Store`] implementation. Every store operation is modelled as a
//! [`Command`] so that single commands, batches and `MULTI/EXEC`
//! transactions share one code path.

pub mod memory;
pub mod redis;

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

pub use self::memory::MemoryStore;
pub use self::redis::RedisStore;

/// Key names and key builders.
pub mod keys {
    /// Counter holding the last assigned user id.
    pub const USER_ID_COUNTER: &str = "user_id";
    /// Sorted set: member = user id, score = cumulative score.
    pub const LEADERBOARD: &str = "leaderboard";

    /// Hash with the user's profile fields.
    pub fn user(id: u64) -> String {
        format!("user:{}", id)
    }

    /// Username claim, value = owning user id.
    pub fn username(username: &str) -> String {
        format!("username:{}", username)
    }

    /// Token claim, value = owning user id.
    pub fn token(token: &str) -> String {
        format!("token:{}", token)
    }

    /// Pending friend requests addressed to `recipient_id`, scored by send time.
    pub fn requests(recipient_id: u64) -> String {
        format!("requests:{}", recipient_id)
    }

    /// Friends of `user_id`, scored by acceptance time.
    pub fn friends(user_id: u64) -> String {
        format!("friends:{}", user_id)
    }
}

/// Store adapter errors.
///
/// Absent keys are not errors; reads return `None` or empty collections.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Store connection failed: {0}")]
    Connection(String),

    #[error("Store command failed: {0}")]
    Command(String),

    #[error("Unexpected reply for {command}: {detail}")]
    UnexpectedReply {
        command: &'static str,
        detail: String,
    },

    #[error("Transaction aborted: expected {expected} results, got {actual}")]
    TransactionAborted { expected: usize, actual: usize },
}

/// A single store operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Ping,
    Get {
        key: String,
    },
    Set {
        key: String,
        value: String,
    },
    /// Set only if the key does not exist. Replies 1 when the key was set.
    SetNx {
        key: String,
        value: String,
    },
    Del {
        key: String,
    },
    Incr {
        key: String,
    },
    HGet {
        key: String,
        field: String,
    },
    HGetAll {
        key: String,
    },
    HSet {
        key: String,
        fields: Vec<(String, String)>,
    },
    HIncrBy {
        key: String,
        field: String,
        delta: i64,
    },
    SAdd {
        key: String,
        member: String,
    },
    SIsMember {
        key: String,
        member: String,
    },
    /// With `only_new`, existing members keep their score (`ZADD NX`).
    ZAdd {
        key: String,
        member: String,
        score: f64,
        only_new: bool,
    },
    ZIncrBy {
        key: String,
        member: String,
        delta: f64,
    },
    ZRem {
        key: String,
        member: String,
    },
    /// Inclusive rank range, always returned with scores.
    ZRange {
        key: String,
        start: i64,
        stop: i64,
        rev: bool,
    },
    ZRank {
        key: String,
        member: String,
        rev: bool,
    },
    ZScore {
        key: String,
        member: String,
    },
}

impl Command {
    /// Store command name, used in logs and error messages.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Ping => "PING",
            Command::Get { .. } => "GET",
            Command::Set { .. } => "SET",
            Command::SetNx { .. } => "SETNX",
            Command::Del { .. } => "DEL",
            Command::Incr { .. } => "INCR",
            Command::HGet { .. } => "HGET",
            Command::HGetAll { .. } => "HGETALL",
            Command::HSet { .. } => "HSET",
            Command::HIncrBy { .. } => "HINCRBY",
            Command::SAdd { .. } => "SADD",
            Command::SIsMember { .. } => "SISMEMBER",
            Command::ZAdd { .. } => "ZADD",
            Command::ZIncrBy { .. } => "ZINCRBY",
            Command::ZRem { .. } => "ZREM",
            Command::ZRange { rev: false, .. } => "ZRANGE",
            Command::ZRange { rev: true, .. } => "ZREVRANGE",
            Command::ZRank { rev: false, .. } => "ZRANK",
            Command::ZRank { rev: true, .. } => "ZREVRANK",
            Command::ZScore { .. } => "ZSCORE",
        }
    }

    pub fn hset<K, F, V>(key: K, fields: impl IntoIterator<Item = (F, V)>) -> Self
    where
        K: Into<String>,
        F: Into<String>,
        V: Into<String>,
    {
        Command::HSet {
            key: key.into(),
            fields: fields
                .into_iter()
                .map(|(f, v)| (f.into(), v.into()))
                .collect(),
        }
    }

    pub fn del(key: impl Into<String>) -> Self {
        Command::Del { key: key.into() }
    }

    pub fn zadd(key: impl Into<String>, member: impl ToString, score: f64) -> Self {
        Command::ZAdd {
            key: key.into(),
            member: member.to_string(),
            score,
            only_new: false,
        }
    }

    pub fn zadd_new(key: impl Into<String>, member: impl ToString, score: f64) -> Self {
        Command::ZAdd {
            key: key.into(),
            member: member.to_string(),
            score,
            only_new: true,
        }
    }
}

/// Decoded store reply.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Nil,
    Ok,
    Int(i64),
    Float(f64),
    Text(String),
    Map(HashMap<String, String>),
    Scored(Vec<(String, f64)>),
}

impl Reply {
    fn unexpected(self, command: &'static str) -> StoreError {
        StoreError::UnexpectedReply {
            command,
            detail: format!("{:?}", self),
        }
    }

    pub fn into_int(self, command: &'static str) -> Result<i64, StoreError> {
        match self {
            Reply::Int(v) => Ok(v),
            other => Err(other.unexpected(command)),
        }
    }

    /// Integer replies used as flags (`SETNX`, `SISMEMBER`, `ZADD`, `ZREM`, `DEL`).
    pub fn into_bool(self, command: &'static str) -> Result<bool, StoreError> {
        self.into_int(command).map(|v| v > 0)
    }

    pub fn into_float(self, command: &'static str) -> Result<f64, StoreError> {
        match self {
            Reply::Float(v) => Ok(v),
            Reply::Int(v) => Ok(v as f64),
            other => Err(other.unexpected(command)),
        }
    }

    pub fn into_opt_int(self, command: &'static str) -> Result<Option<i64>, StoreError> {
        match self {
            Reply::Nil => Ok(None),
            Reply::Int(v) => Ok(Some(v)),
            other => Err(other.unexpected(command)),
        }
    }

    pub fn into_opt_float(self, command: &'static str) -> Result<Option<f64>, StoreError> {
        match self {
            Reply::Nil => Ok(None),
            Reply::Float(v) => Ok(Some(v)),
            Reply::Int(v) => Ok(Some(v as f64)),
            other => Err(other.unexpected(command)),
        }
    }

    pub fn into_opt_text(self, command: &'static str) -> Result<Option<String>, StoreError> {
        match self {
            Reply::Nil => Ok(None),
            Reply::Text(v) => Ok(Some(v)),
            other => Err(other.unexpected(command)),
        }
    }

    pub fn into_map(self, command: &'static str) -> Result<HashMap<String, String>, StoreError> {
        match self {
            Reply::Map(v) => Ok(v),
            Reply::Nil => Ok(HashMap::new()),
            other => Err(other.unexpected(command)),
        }
    }

    pub fn into_scored(self, command: &'static str) -> Result<Vec<(String, f64)>, StoreError> {
        match self {
            Reply::Scored(v) => Ok(v),
            Reply::Nil => Ok(Vec::new()),
            other => Err(other.unexpected(command)),
        }
    }
}

/// Store adapter.
///
/// Single commands are atomic. `pipeline` batches commands without any
/// atomicity guarantee; `transaction` runs them as one `MULTI/EXEC` unit and
/// returns every command's reply so callers can verify what was committed.
#[async_trait]
pub trait Store: Send + Sync {
    async fn execute(&self, command: Command) -> Result<Reply, StoreError>;

    async fn pipeline(&self, commands: Vec<Command>) -> Result<Vec<Reply>, StoreError>;

    async fn transaction(&self, commands: Vec<Command>) -> Result<Vec<Reply>, StoreError>;
}

/// Cloneable store handle with typed operations.
#[derive(Clone)]
pub struct Db {
    store: Arc<dyn Store>,
}

impl Db {
    pub fn new<S: Store + 'static>(store: S) -> Self {
        Self {
            store: Arc::new(store),
        }
    }

    /// Handle over a fresh in-process keyspace.
    pub fn memory() -> Self {
        Self::new(MemoryStore::new())
    }

    /// Connect to Redis at `url`.
    pub async fn connect_redis(url: &str) -> Result<Self, StoreError> {
        Ok(Self::new(RedisStore::connect(url).await?))
    }

    pub async fn ping(&self) -> Result<(), StoreError> {
        match self.store.execute(Command::Ping).await? {
            Reply::Text(_) | Reply::Ok => Ok(()),
            other => Err(other.unexpected("PING")),
        }
    }

    pub async fn execute(&self, command: Command) -> Result<Reply, StoreError> {
        self.store.execute(command).await
    }

    pub async fn pipeline(&self, commands: Vec<Command>) -> Result<Vec<Reply>, StoreError> {
        if commands.is_empty() {
            return Ok(Vec::new());
        }
        let expected = commands.len();
        let replies = self.store.pipeline(commands).await?;
        check_len(expected, replies)
    }

    pub async fn transaction(&self, commands: Vec<Command>) -> Result<Vec<Reply>, StoreError> {
        if commands.is_empty() {
            return Ok(Vec::new());
        }
        let expected = commands.len();
        let replies = self.store.transaction(commands).await?;
        check_len(expected, replies)
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.execute(Command::Get {
            key: key.to_string(),
        })
        .await?
        .into_opt_text("GET")
    }

    /// Claim `key` for `value`. Returns false if the key already exists.
    pub async fn set_nx(&self, key: &str, value: &str) -> Result<bool, StoreError> {
        self.execute(Command::SetNx {
            key: key.to_string(),
            value: value.to_string(),
        })
        .await?
        .into_bool("SETNX")
    }

    pub async fn del(&self, key: &str) -> Result<bool, StoreError> {
        self.execute(Command::del(key)).await?.into_bool("DEL")
    }

    pub async fn incr(&self, key: &str) -> Result<i64, StoreError> {
        self.execute(Command::Incr {
            key: key.to_string(),
        })
        .await?
        .into_int("INCR")
    }

    pub async fn hget(&self, key: &str, field: &str) -> Result<Option<String>, StoreError> {
        self.execute(Command::HGet {
            key: key.to_string(),
            field: field.to_string(),
        })
        .await?
        .into_opt_text("HGET")
    }

    pub async fn hgetall(&self, key: &str) -> Result<HashMap<String, String>, StoreError> {
        self.execute(Command::HGetAll {
            key: key.to_string(),
        })
        .await?
        .into_map("HGETALL")
    }

    pub async fn hset(&self, key: &str, field: &str, value: &str) -> Result<(), StoreError> {
        self.execute(Command::hset(key, [(field, value)]))
            .await?
            .into_int("HSET")?;
        Ok(())
    }

    /// Add `member` only if absent. Returns false if it was already present.
    pub async fn zadd_new(&self, key: &str, member: &str, score: f64) -> Result<bool, StoreError> {
        self.execute(Command::zadd_new(key, member, score))
            .await?
            .into_bool("ZADD")
    }

    pub async fn zrem(&self, key: &str, member: &str) -> Result<bool, StoreError> {
        self.execute(Command::ZRem {
            key: key.to_string(),
            member: member.to_string(),
        })
        .await?
        .into_bool("ZREM")
    }

    pub async fn zscore(&self, key: &str, member: &str) -> Result<Option<f64>, StoreError> {
        self.execute(Command::ZScore {
            key: key.to_string(),
            member: member.to_string(),
        })
        .await?
        .into_opt_float("ZSCORE")
    }

    pub async fn zrank(
        &self,
        key: &str,
        member: &str,
        rev: bool,
    ) -> Result<Option<i64>, StoreError> {
        self.execute(Command::ZRank {
            key: key.to_string(),
            member: member.to_string(),
            rev,
        })
        .await?
        .into_opt_int("ZRANK")
    }

    pub async fn zrange_with_scores(
        &self,
        key: &str,
        start: i64,
        stop: i64,
        rev: bool,
    ) -> Result<Vec<(String, f64)>, StoreError> {
        self.execute(Command::ZRange {
            key: key.to_string(),
            start,
            stop,
            rev,
        })
        .await?
        .into_scored("ZRANGE")
    }
}

fn check_len(expected: usize, replies: Vec<Reply>) -> Result<Vec<Reply>, StoreError> {
    if replies.len() != expected {
        return Err(StoreError::TransactionAborted {
            expected,
            actual: replies.len(),
        });
    }
    Ok(replies)
}
