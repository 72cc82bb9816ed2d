// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process keyspace with Redis command semantics.
//!
//! Used by tests and by local runs with `STORE_BACKEND=memory`. One mutex
//! guards the whole keyspace, so every `transaction` is applied atomically.

use super::{Command, Reply, Store, StoreError};
use async_trait::async_trait;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Clone)]
enum Value {
    Text(String),
    Hash(HashMap<String, String>),
    Set(HashSet<String>),
    Sorted(HashMap<String, f64>),
}

impl Value {
    fn type_name(&self) -> &'static str {
        match self {
            Value::Text(_) => "string",
            Value::Hash(_) => "hash",
            Value::Set(_) => "set",
            Value::Sorted(_) => "zset",
        }
    }
}

/// In-memory [`Store`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    keyspace: Mutex<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, Value>>, StoreError> {
        self.keyspace
            .lock()
            .map_err(|_| StoreError::Connection("memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn execute(&self, command: Command) -> Result<Reply, StoreError> {
        let mut keyspace = self.lock()?;
        apply(&mut keyspace, command)
    }

    async fn pipeline(&self, commands: Vec<Command>) -> Result<Vec<Reply>, StoreError> {
        let mut replies = Vec::with_capacity(commands.len());
        for command in commands {
            let mut keyspace = self.lock()?;
            replies.push(apply(&mut keyspace, command)?);
        }
        Ok(replies)
    }

    async fn transaction(&self, commands: Vec<Command>) -> Result<Vec<Reply>, StoreError> {
        let mut keyspace = self.lock()?;
        commands
            .into_iter()
            .map(|command| apply(&mut keyspace, command))
            .collect()
    }
}

fn wrong_type(command: &Command, found: &Value) -> StoreError {
    StoreError::Command(format!(
        "WRONGTYPE {} against a key holding a {}",
        command.name(),
        found.type_name()
    ))
}

fn not_integer(command: &Command) -> StoreError {
    StoreError::Command(format!(
        "{}: value is not an integer or out of range",
        command.name()
    ))
}

fn apply(keyspace: &mut HashMap<String, Value>, command: Command) -> Result<Reply, StoreError> {
    match &command {
        Command::Ping => Ok(Reply::Text("PONG".to_string())),

        Command::Get { key } => match keyspace.get(key) {
            None => Ok(Reply::Nil),
            Some(Value::Text(v)) => Ok(Reply::Text(v.clone())),
            Some(other) => Err(wrong_type(&command, other)),
        },

        Command::Set { key, value } => {
            keyspace.insert(key.clone(), Value::Text(value.clone()));
            Ok(Reply::Ok)
        }

        Command::SetNx { key, value } => {
            if keyspace.contains_key(key) {
                return Ok(Reply::Int(0));
            }
            keyspace.insert(key.clone(), Value::Text(value.clone()));
            Ok(Reply::Int(1))
        }

        Command::Del { key } => Ok(Reply::Int(keyspace.remove(key).is_some() as i64)),

        Command::Incr { key } => {
            let current = match keyspace.get(key) {
                None => 0,
                Some(Value::Text(v)) => v.parse::<i64>().map_err(|_| not_integer(&command))?,
                Some(other) => return Err(wrong_type(&command, other)),
            };
            let next = current.checked_add(1).ok_or_else(|| not_integer(&command))?;
            keyspace.insert(key.clone(), Value::Text(next.to_string()));
            Ok(Reply::Int(next))
        }

        Command::HGet { key, field } => match keyspace.get(key) {
            None => Ok(Reply::Nil),
            Some(Value::Hash(h)) => Ok(h
                .get(field)
                .map(|v| Reply::Text(v.clone()))
                .unwrap_or(Reply::Nil)),
            Some(other) => Err(wrong_type(&command, other)),
        },

        Command::HGetAll { key } => match keyspace.get(key) {
            None => Ok(Reply::Map(HashMap::new())),
            Some(Value::Hash(h)) => Ok(Reply::Map(h.clone())),
            Some(other) => Err(wrong_type(&command, other)),
        },

        Command::HSet { key, fields } => {
            let entry = keyspace
                .entry(key.clone())
                .or_insert_with(|| Value::Hash(HashMap::new()));
            let hash = match entry {
                Value::Hash(hash) => hash,
                other => return Err(wrong_type(&command, other)),
            };
            let mut added = 0;
            for (field, value) in fields {
                if hash.insert(field.clone(), value.clone()).is_none() {
                    added += 1;
                }
            }
            Ok(Reply::Int(added))
        }

        Command::HIncrBy { key, field, delta } => {
            let entry = keyspace
                .entry(key.clone())
                .or_insert_with(|| Value::Hash(HashMap::new()));
            let hash = match entry {
                Value::Hash(hash) => hash,
                other => return Err(wrong_type(&command, other)),
            };
            let current = match hash.get(field) {
                None => 0,
                Some(v) => v.parse::<i64>().map_err(|_| not_integer(&command))?,
            };
            let next = current
                .checked_add(*delta)
                .ok_or_else(|| not_integer(&command))?;
            hash.insert(field.clone(), next.to_string());
            Ok(Reply::Int(next))
        }

        Command::SAdd { key, member } => {
            let entry = keyspace
                .entry(key.clone())
                .or_insert_with(|| Value::Set(HashSet::new()));
            let set = match entry {
                Value::Set(set) => set,
                other => return Err(wrong_type(&command, other)),
            };
            Ok(Reply::Int(set.insert(member.clone()) as i64))
        }

        Command::SIsMember { key, member } => match keyspace.get(key) {
            None => Ok(Reply::Int(0)),
            Some(Value::Set(set)) => Ok(Reply::Int(set.contains(member) as i64)),
            Some(other) => Err(wrong_type(&command, other)),
        },

        Command::ZAdd {
            key,
            member,
            score,
            only_new,
        } => {
            let entry = keyspace
                .entry(key.clone())
                .or_insert_with(|| Value::Sorted(HashMap::new()));
            let zset = match entry {
                Value::Sorted(zset) => zset,
                other => return Err(wrong_type(&command, other)),
            };
            if zset.contains_key(member) {
                if !only_new {
                    zset.insert(member.clone(), *score);
                }
                return Ok(Reply::Int(0));
            }
            zset.insert(member.clone(), *score);
            Ok(Reply::Int(1))
        }

        Command::ZIncrBy { key, member, delta } => {
            let entry = keyspace
                .entry(key.clone())
                .or_insert_with(|| Value::Sorted(HashMap::new()));
            let zset = match entry {
                Value::Sorted(zset) => zset,
                other => return Err(wrong_type(&command, other)),
            };
            let score = zset.entry(member.clone()).or_insert(0.0);
            *score += delta;
            Ok(Reply::Float(*score))
        }

        Command::ZRem { key, member } => {
            let removed = match keyspace.get_mut(key) {
                None => false,
                Some(Value::Sorted(zset)) => zset.remove(member).is_some(),
                Some(other) => return Err(wrong_type(&command, other)),
            };
            if matches!(keyspace.get(key), Some(Value::Sorted(z)) if z.is_empty()) {
                keyspace.remove(key);
            }
            Ok(Reply::Int(removed as i64))
        }

        Command::ZRange {
            key,
            start,
            stop,
            rev,
        } => match keyspace.get(key) {
            None => Ok(Reply::Scored(Vec::new())),
            Some(Value::Sorted(zset)) => {
                let ordered = ordered_members(zset, *rev);
                Ok(Reply::Scored(slice_range(&ordered, *start, *stop)))
            }
            Some(other) => Err(wrong_type(&command, other)),
        },

        Command::ZRank { key, member, rev } => match keyspace.get(key) {
            None => Ok(Reply::Nil),
            Some(Value::Sorted(zset)) => Ok(ordered_members(zset, *rev)
                .iter()
                .position(|(m, _)| m == member)
                .map(|rank| Reply::Int(rank as i64))
                .unwrap_or(Reply::Nil)),
            Some(other) => Err(wrong_type(&command, other)),
        },

        Command::ZScore { key, member } => match keyspace.get(key) {
            None => Ok(Reply::Nil),
            Some(Value::Sorted(zset)) => Ok(zset
                .get(member)
                .map(|s| Reply::Float(*s))
                .unwrap_or(Reply::Nil)),
            Some(other) => Err(wrong_type(&command, other)),
        },
    }
}

/// Members ordered by (score, member) ascending, or the exact reverse.
fn ordered_members(zset: &HashMap<String, f64>, rev: bool) -> Vec<(String, f64)> {
    let mut members: Vec<(String, f64)> = zset.iter().map(|(m, s)| (m.clone(), *s)).collect();
    members.sort_by(|a, b| {
        a.1.partial_cmp(&b.1)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });
    if rev {
        members.reverse();
    }
    members
}

/// Inclusive rank range with Redis index rules (negative = from the end).
fn slice_range(members: &[(String, f64)], start: i64, stop: i64) -> Vec<(String, f64)> {
    let len = members.len() as i64;
    let start = if start < 0 { (len + start).max(0) } else { start };
    let stop = if stop < 0 { len + stop } else { stop.min(len - 1) };
    if len == 0 || start > stop || start >= len {
        return Vec::new();
    }
    members[start as usize..=stop as usize].to_vec()
}

/// Memory store whose transactions can be switched to fail, for exercising
/// compensation paths.
#[cfg(test)]
pub(crate) struct FailingStore {
    inner: MemoryStore,
    fail_transactions: std::sync::Arc<std::sync::atomic::AtomicBool>,
}

#[cfg(test)]
impl FailingStore {
    /// Returns the store and the switch that makes `transaction` fail.
    pub(crate) fn new() -> (Self, std::sync::Arc<std::sync::atomic::AtomicBool>) {
        let switch = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(false));
        let store = Self {
            inner: MemoryStore::new(),
            fail_transactions: switch.clone(),
        };
        (store, switch)
    }
}

#[cfg(test)]
#[async_trait]
impl Store for FailingStore {
    async fn execute(&self, command: Command) -> Result<Reply, StoreError> {
        self.inner.execute(command).await
    }

    async fn pipeline(&self, commands: Vec<Command>) -> Result<Vec<Reply>, StoreError> {
        self.inner.pipeline(commands).await
    }

    async fn transaction(&self, commands: Vec<Command>) -> Result<Vec<Reply>, StoreError> {
        if self
            .fail_transactions
            .load(std::sync::atomic::Ordering::SeqCst)
        {
            return Err(StoreError::Connection("down".to_string()));
        }
        self.inner.transaction(commands).await
    }
}
