// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Friend requests and the friendship graph.
//!
//! Pending requests for a user live in `requests:{recipient}` scored by the
//! time they were sent. Friendships are stored in both directions in
//! `friends:{id}`, scored by the time the request was accepted.

use crate::db::{keys, Command, Db};
use crate::error::{AppError, Result};
use crate::models::{Decision, Friend, FriendRequest, PageRequest, User};
use crate::services::identity::{parse_id, IdentityService};
use crate::time_utils;

#[derive(Clone)]
pub struct FriendService {
    db: Db,
    identity: IdentityService,
}

impl FriendService {
    pub fn new(db: Db, identity: IdentityService) -> Self {
        Self { db, identity }
    }

    /// Look up another user's id by username.
    pub async fn search_user(&self, caller: &User, username: &str) -> Result<u64> {
        if username.is_empty() {
            return Err(AppError::validation("Username is required"));
        }
        if username == caller.username {
            return Err(AppError::validation("You cannot search for yourself"));
        }
        self.identity
            .find_user_id(username)
            .await?
            .ok_or_else(|| AppError::not_found("Username does not exist"))
    }

    /// Queue a request from `sender_id` to `recipient_id`.
    ///
    /// Returns the recipient's username.
    pub async fn send_request(&self, sender_id: u64, recipient_id: u64) -> Result<String> {
        if sender_id == recipient_id {
            return Err(AppError::validation(
                "You cannot send a friend request to yourself",
            ));
        }
        let recipient = self
            .identity
            .username_of(recipient_id)
            .await?
            .ok_or_else(|| AppError::not_found("User does not exist"))?;

        if self.are_friends(sender_id, recipient_id).await? {
            return Err(AppError::conflict("Already friends"));
        }

        let queued = self
            .db
            .zadd_new(
                &keys::requests(recipient_id),
                &sender_id.to_string(),
                time_utils::now_unix() as f64,
            )
            .await?;
        if !queued {
            return Err(AppError::conflict("Friend request already sent"));
        }

        tracing::info!(sender_id, recipient_id, "Friend request sent");
        Ok(recipient)
    }

    /// Pending requests addressed to `recipient_id`, oldest first.
    pub async fn list_requests(
        &self,
        recipient_id: u64,
        page: PageRequest,
    ) -> Result<Vec<FriendRequest>> {
        let (start, end) = page.window()?;
        let pending = self
            .db
            .zrange_with_scores(&keys::requests(recipient_id), start, end, false)
            .await?;

        let (ids, sent) = split_members(pending)?;
        let usernames = self.identity.usernames(&ids).await?;

        Ok(ids
            .into_iter()
            .zip(usernames)
            .zip(sent)
            .map(|((id, username), sent_at)| FriendRequest {
                id,
                username,
                sent_at: time_utils::format_unix_rfc3339(sent_at as i64),
            })
            .collect())
    }

    /// Accept or reject the pending request from `sender_id`.
    ///
    /// The request is consumed either way. Accepting links both users; if
    /// that write fails, the request is put back as it was.
    pub async fn respond(
        &self,
        recipient_id: u64,
        sender_id: u64,
        decision: Decision,
    ) -> Result<()> {
        let requests_key = keys::requests(recipient_id);
        let sender = sender_id.to_string();

        let sent_at = self
            .db
            .zscore(&requests_key, &sender)
            .await?
            .ok_or_else(|| AppError::not_found("Friend request does not exist"))?;
        if !self.db.zrem(&requests_key, &sender).await? {
            // Answered concurrently.
            return Err(AppError::not_found("Friend request does not exist"));
        }

        if decision == Decision::Reject {
            tracing::info!(recipient_id, sender_id, "Friend request rejected");
            return Ok(());
        }

        let now = time_utils::now_unix() as f64;
        let linked = self
            .db
            .transaction(vec![
                Command::zadd_new(keys::friends(recipient_id), sender_id, now),
                Command::zadd_new(keys::friends(sender_id), recipient_id, now),
            ])
            .await;

        let replies = match linked {
            Ok(replies) => replies,
            Err(e) => {
                if let Err(restore) = self
                    .db
                    .execute(Command::zadd_new(&requests_key, sender_id, sent_at))
                    .await
                {
                    tracing::error!(
                        recipient_id,
                        sender_id,
                        error = %restore,
                        "Failed to restore friend request"
                    );
                }
                return Err(e.into());
            }
        };

        let mut added = Vec::with_capacity(2);
        for reply in replies {
            added.push(reply.into_bool("ZADD")?);
        }
        if added.iter().any(|a| !a) {
            if added.iter().any(|a| *a) {
                tracing::warn!(recipient_id, sender_id, "Repaired one-sided friendship");
            }
            return Err(AppError::conflict("Already friends"));
        }

        tracing::info!(recipient_id, sender_id, "Friend request accepted");
        Ok(())
    }

    /// Friends of `user_id`, most recently added first.
    pub async fn list_friends(&self, user_id: u64, page: PageRequest) -> Result<Vec<Friend>> {
        let (start, end) = page.window()?;
        let friends = self
            .db
            .zrange_with_scores(&keys::friends(user_id), start, end, true)
            .await?;

        let (ids, _) = split_members(friends)?;
        let usernames = self.identity.usernames(&ids).await?;

        Ok(ids
            .into_iter()
            .zip(usernames)
            .map(|(id, username)| Friend { id, username })
            .collect())
    }

    pub async fn are_friends(&self, a: u64, b: u64) -> Result<bool> {
        Ok(self
            .db
            .zscore(&keys::friends(a), &b.to_string())
            .await?
            .is_some())
    }
}

fn split_members(scored: Vec<(String, f64)>) -> Result<(Vec<u64>, Vec<f64>)> {
    let mut ids = Vec::with_capacity(scored.len());
    let mut scores = Vec::with_capacity(scored.len());
    for (member, score) in scored {
        ids.push(parse_id(&member)?);
        scores.push(score);
    }
    Ok((ids, scores))
}
