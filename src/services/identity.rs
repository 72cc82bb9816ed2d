// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Identity and session tokens.
//!
//! Usernames and tokens are claimed with `SETNX` on their lookup keys before
//! anything else is written, so two concurrent callers can never both own
//! the same name or token. Multi-key updates run as one transaction; claims
//! taken before a failed transaction are released again.

use crate::config::Config;
use crate::db::{keys, Command, Db};
use crate::error::{AppError, Result};
use crate::models::user::fields;
use crate::models::{NewUser, ProfileUpdate, PublicUser, User};
use crate::services::{password, token};
use serde::Serialize;
use std::sync::Arc;
use subtle::ConstantTimeEq;

type TokenSource = Arc<dyn Fn() -> String + Send + Sync>;

/// A user together with their current session token.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    #[serde(flatten)]
    pub user: PublicUser,
    pub token: String,
}

#[derive(Clone)]
pub struct IdentityService {
    db: Db,
    bcrypt_cost: u32,
    token_max_attempts: u32,
    token_source: TokenSource,
}

impl IdentityService {
    pub fn new(db: Db, config: &Config) -> Self {
        Self {
            db,
            bcrypt_cost: config.bcrypt_cost,
            token_max_attempts: config.token_max_attempts,
            token_source: Arc::new(token::generate_token),
        }
    }

    /// Replace the token generator (used to force collisions in tests).
    pub fn with_token_source<F>(mut self, source: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        self.token_source = Arc::new(source);
        self
    }

    pub fn bcrypt_cost(&self) -> u32 {
        self.bcrypt_cost
    }

    /// Create a user with score 0 and issue their first token.
    pub async fn register(&self, new_user: NewUser) -> Result<Session> {
        if new_user.username.is_empty() || new_user.password.is_empty() {
            return Err(AppError::validation("Username and password are required"));
        }
        if self.find_user_id(&new_user.username).await?.is_some() {
            return Err(AppError::conflict("Username already exists"));
        }

        let password_hash = password::hash_password(&new_user.password, self.bcrypt_cost).await?;
        let id = self.allocate_id().await?;

        self.store_new_user(User {
            id,
            username: new_user.username,
            password_hash,
            name: new_user.name,
            surname: new_user.surname,
            score: 0,
            token: None,
        })
        .await
    }

    /// Reserve the next user id. Ids are never reused, even if the
    /// registration that reserved one fails later.
    pub async fn allocate_id(&self) -> Result<u64> {
        let raw = self.db.incr(keys::USER_ID_COUNTER).await?;
        u64::try_from(raw)
            .map_err(|_| AppError::drift(format!("user id counter is negative: {}", raw)))
    }

    /// Highest id handed out so far (0 if none).
    pub async fn last_allocated_id(&self) -> Result<u64> {
        match self.db.get(keys::USER_ID_COUNTER).await? {
            Some(raw) => raw
                .parse()
                .map_err(|_| AppError::drift(format!("user id counter is not numeric: {}", raw))),
            None => Ok(0),
        }
    }

    /// Persist a user whose id was already allocated and whose password is
    /// already hashed, then issue a token.
    pub(crate) async fn store_new_user(&self, user: User) -> Result<Session> {
        let id = user.id;
        if !self
            .db
            .set_nx(&keys::username(&user.username), &id.to_string())
            .await?
        {
            tracing::warn!(
                user_id = id,
                username = %user.username,
                "Username claimed concurrently, user id left unused"
            );
            return Err(AppError::conflict("Username already exists"));
        }

        let stored = self
            .db
            .transaction(vec![
                Command::hset(keys::user(id), user.to_fields()),
                Command::zadd(keys::LEADERBOARD, id, user.score as f64),
            ])
            .await;
        if let Err(e) = stored {
            self.release_username(&user.username, id).await;
            return Err(e.into());
        }

        let token = self.create_token(id).await?;
        tracing::info!(user_id = id, username = %user.username, "User registered");

        Ok(Session {
            user: user.public(),
            token,
        })
    }

    /// Verify credentials and return the user's session token, issuing one
    /// if none is bound.
    pub async fn login(&self, username: &str, password: &str) -> Result<Session> {
        if username.is_empty() || password.is_empty() {
            return Err(AppError::validation("Username and password are required"));
        }
        let id = self
            .find_user_id(username)
            .await?
            .ok_or_else(|| AppError::not_found("Username does not exist"))?;
        let user = self
            .get_user(id)
            .await?
            .ok_or_else(|| AppError::drift(format!("username {} maps to missing user {}", username, id)))?;

        if !password::verify_password(password, &user.password_hash).await? {
            tracing::info!(user_id = id, "Login rejected: wrong password");
            return Err(AppError::unauthorized("Incorrect password"));
        }

        let token = match &user.token {
            Some(token) if self.token_owner(token).await? == Some(id) => token.clone(),
            _ => self.create_token(id).await?,
        };

        tracing::info!(user_id = id, "User logged in");
        Ok(Session {
            user: user.public(),
            token,
        })
    }

    /// Resolve a presented token to its user.
    ///
    /// Fails with `Unauthorized` unless the token key exists and the owning
    /// profile still has this exact token bound.
    pub async fn validate_token(&self, presented: &str) -> Result<User> {
        let presented = presented.trim();
        if presented.is_empty() {
            return Err(AppError::unauthorized("Missing token"));
        }
        if !token::is_well_formed(presented) {
            return Err(AppError::unauthorized("Invalid token"));
        }

        let id = self
            .token_owner(presented)
            .await?
            .ok_or_else(|| AppError::unauthorized("Invalid token"))?;

        let hash = self.db.hgetall(&keys::user(id)).await?;
        let user = User::from_hash(&hash).ok_or_else(|| {
            tracing::warn!(user_id = id, "Token maps to an incomplete profile");
            AppError::unauthorized("Invalid token")
        })?;

        let bound = user.token.as_deref().unwrap_or_default();
        if !bool::from(bound.as_bytes().ct_eq(presented.as_bytes())) {
            tracing::debug!(user_id = id, "Token superseded");
            return Err(AppError::unauthorized("Invalid token"));
        }

        Ok(user)
    }

    /// Issue a fresh token for `user_id` and retire the previous one.
    pub async fn create_token(&self, user_id: u64) -> Result<String> {
        let previous = self.db.hget(&keys::user(user_id), fields::TOKEN).await?;

        for attempt in 1..=self.token_max_attempts {
            let token = (self.token_source)();
            if !self
                .db
                .set_nx(&keys::token(&token), &user_id.to_string())
                .await?
            {
                tracing::warn!(user_id, attempt, "Token collision, regenerating");
                continue;
            }

            // The HGET reports the token this transaction actually replaces,
            // which differs from `previous` if another rotation got there first.
            let mut commands = vec![
                Command::HGet {
                    key: keys::user(user_id),
                    field: fields::TOKEN.to_string(),
                },
                Command::hset(keys::user(user_id), [(fields::TOKEN, token.clone())]),
            ];
            if let Some(old) = previous.as_deref().filter(|old| *old != token) {
                commands.push(Command::del(keys::token(old)));
            }

            let replies = match self.db.transaction(commands).await {
                Ok(replies) => replies,
                Err(e) => {
                    if let Err(cleanup) = self.db.del(&keys::token(&token)).await {
                        tracing::error!(user_id, error = %cleanup, "Failed to release token claim");
                    }
                    return Err(e.into());
                }
            };

            let replaced = match replies.into_iter().next() {
                Some(reply) => reply.into_opt_text("HGET")?,
                None => None,
            };
            if let Some(stale) = replaced.filter(|r| Some(r) != previous.as_ref() && *r != token) {
                tracing::debug!(user_id, "Token rotated concurrently, retiring replaced token");
                self.db.del(&keys::token(&stale)).await?;
            }

            tracing::debug!(user_id, "Session token issued");
            return Ok(token);
        }

        tracing::error!(
            user_id,
            attempts = self.token_max_attempts,
            "Token generation exhausted"
        );
        Err(AppError::Internal(anyhow::anyhow!(
            "no unique token after {} attempts",
            self.token_max_attempts
        )))
    }

    /// Apply a partial profile update and return the refreshed user.
    ///
    /// A username change claims the new name first and drops the old claim
    /// in the same transaction that rewrites the profile. Passwords are
    /// re-hashed before storage.
    pub async fn update_profile(&self, user_id: u64, update: ProfileUpdate) -> Result<User> {
        let user = self
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User does not exist"))?;

        let mut changes: Vec<(&'static str, String)> = Vec::new();
        let mut commands = Vec::new();
        let mut claimed: Option<String> = None;

        if let Some(new_name) = ProfileUpdate::provided(&update.username) {
            if new_name != user.username {
                let taken = !self
                    .db
                    .set_nx(&keys::username(new_name), &user_id.to_string())
                    .await?;
                if taken {
                    if self.find_user_id(new_name).await? != Some(user_id) {
                        return Err(AppError::conflict("Username already exists"));
                    }
                } else {
                    claimed = Some(new_name.to_string());
                }
                changes.push((fields::USERNAME, new_name.to_string()));
                commands.push(Command::del(keys::username(&user.username)));
            }
        }

        let result = self
            .write_profile_changes(user_id, &update, changes, commands)
            .await;

        if let Err(e) = result {
            if let Some(name) = claimed {
                self.release_username(&name, user_id).await;
            }
            return Err(e);
        }

        tracing::info!(user_id, "Profile updated");
        self.get_user(user_id)
            .await?
            .ok_or_else(|| AppError::drift(format!("user {} vanished during update", user_id)))
    }

    async fn write_profile_changes(
        &self,
        user_id: u64,
        update: &ProfileUpdate,
        mut changes: Vec<(&'static str, String)>,
        mut commands: Vec<Command>,
    ) -> Result<()> {
        if let Some(new_password) = ProfileUpdate::provided(&update.password) {
            let hash = password::hash_password(new_password, self.bcrypt_cost).await?;
            changes.push((fields::PASSWORD, hash));
        }
        if let Some(name) = ProfileUpdate::provided(&update.name) {
            changes.push((fields::NAME, name.to_string()));
        }
        if let Some(surname) = ProfileUpdate::provided(&update.surname) {
            changes.push((fields::SURNAME, surname.to_string()));
        }
        if changes.is_empty() {
            return Ok(());
        }

        commands.insert(0, Command::hset(keys::user(user_id), changes));
        self.db.transaction(commands).await?;
        Ok(())
    }

    /// Full profile of `id`, `None` if no such user.
    pub async fn get_user(&self, id: u64) -> Result<Option<User>> {
        let hash = self.db.hgetall(&keys::user(id)).await?;
        if hash.is_empty() {
            return Ok(None);
        }
        User::from_hash(&hash)
            .map(Some)
            .ok_or_else(|| AppError::drift(format!("user {} has an incomplete profile", id)))
    }

    pub async fn user_exists(&self, id: u64) -> Result<bool> {
        Ok(self
            .db
            .hget(&keys::user(id), fields::ID)
            .await?
            .is_some())
    }

    pub async fn find_user_id(&self, username: &str) -> Result<Option<u64>> {
        self.db
            .get(&keys::username(username))
            .await?
            .map(|raw| parse_id(&raw))
            .transpose()
    }

    pub async fn username_of(&self, id: u64) -> Result<Option<String>> {
        Ok(self.db.hget(&keys::user(id), fields::USERNAME).await?)
    }

    /// Usernames of `ids` in order, fetched in one batch.
    ///
    /// Every id is expected to have a profile; a missing one is reported as
    /// index/profile drift.
    pub async fn usernames(&self, ids: &[u64]) -> Result<Vec<String>> {
        let replies = self
            .db
            .pipeline(
                ids.iter()
                    .map(|id| Command::HGet {
                        key: keys::user(*id),
                        field: fields::USERNAME.to_string(),
                    })
                    .collect(),
            )
            .await?;

        ids.iter()
            .zip(replies)
            .map(|(id, reply)| {
                reply
                    .into_opt_text("HGET")?
                    .ok_or_else(|| AppError::drift(format!("user {} is indexed but has no profile", id)))
            })
            .collect()
    }

    async fn token_owner(&self, token: &str) -> Result<Option<u64>> {
        match self.db.get(&keys::token(token)).await? {
            Some(raw) => Ok(raw.parse().ok()),
            None => Ok(None),
        }
    }

    /// Drop a username claim if it still points at `owner`.
    async fn release_username(&self, username: &str, owner: u64) {
        if let Err(e) = self.try_release_username(username, owner).await {
            tracing::error!(username, user_id = owner, error = %e, "Failed to release username claim");
        }
    }

    async fn try_release_username(&self, username: &str, owner: u64) -> Result<()> {
        let key = keys::username(username);
        if self.db.get(&key).await? == Some(owner.to_string()) {
            self.db.del(&key).await?;
        }
        Ok(())
    }
}

/// Parse a user id stored as a key value or set member.
pub(crate) fn parse_id(raw: &str) -> Result<u64> {
    raw.parse()
        .map_err(|_| AppError::drift(format!("stored user id is not numeric: {:?}", raw)))
}
