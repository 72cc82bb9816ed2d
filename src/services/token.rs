// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Opaque session token generation.
//!
//! Tokens are four 10-character alphanumeric groups joined by `-`. The
//! grouping is for readability only.

use rand::Rng;

pub const TOKEN_ALPHABET: &[u8] =
    b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";
pub const TOKEN_GROUPS: usize = 4;
pub const TOKEN_GROUP_LEN: usize = 10;
pub const TOKEN_SEPARATOR: char = '-';
pub const TOKEN_LEN: usize = TOKEN_GROUPS * TOKEN_GROUP_LEN + TOKEN_GROUPS - 1;

/// Generate a random token using the thread-local RNG.
pub fn generate_token() -> String {
    generate_token_with(&mut rand::thread_rng())
}

pub fn generate_token_with<R: Rng + ?Sized>(rng: &mut R) -> String {
    let mut token = String::with_capacity(TOKEN_LEN);
    for group in 0..TOKEN_GROUPS {
        if group > 0 {
            token.push(TOKEN_SEPARATOR);
        }
        for _ in 0..TOKEN_GROUP_LEN {
            let idx = rng.gen_range(0..TOKEN_ALPHABET.len());
            token.push(TOKEN_ALPHABET[idx] as char);
        }
    }
    token
}

/// Cheap shape check before touching the store.
pub fn is_well_formed(token: &str) -> bool {
    token.len() == TOKEN_LEN
        && token.split(TOKEN_SEPARATOR).count() == TOKEN_GROUPS
        && token.split(TOKEN_SEPARATOR).all(|group| {
            group.len() == TOKEN_GROUP_LEN && group.bytes().all(|b| b.is_ascii_alphanumeric())
        })
}
