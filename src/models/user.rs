//! User model for storage and API.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Field names of the `user:{id}` hash.
pub mod fields {
    pub const ID: &str = "id";
    pub const USERNAME: &str = "username";
    pub const PASSWORD: &str = "password";
    pub const NAME: &str = "name";
    pub const SURNAME: &str = "surname";
    pub const SCORE: &str = "score";
    pub const TOKEN: &str = "token";
}

/// User profile stored in the `user:{id}` hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: u64,
    pub username: String,
    /// bcrypt hash; never serialized into responses
    pub password_hash: String,
    pub name: String,
    pub surname: String,
    pub score: u64,
    /// Currently bound session token, if one has been issued
    pub token: Option<String>,
}

impl User {
    /// Build a user from its stored hash.
    ///
    /// Returns `None` if any required field (`id`, `username`, `password`)
    /// is missing or malformed.
    pub fn from_hash(hash: &HashMap<String, String>) -> Option<Self> {
        let id = hash.get(fields::ID)?.parse().ok()?;
        let username = hash.get(fields::USERNAME).filter(|u| !u.is_empty())?;
        let password_hash = hash.get(fields::PASSWORD).filter(|p| !p.is_empty())?;
        let text = |field: &str| hash.get(field).cloned().unwrap_or_default();

        Some(Self {
            id,
            username: username.clone(),
            password_hash: password_hash.clone(),
            name: text(fields::NAME),
            surname: text(fields::SURNAME),
            score: hash
                .get(fields::SCORE)
                .and_then(|s| s.parse().ok())
                .unwrap_or(0),
            token: hash.get(fields::TOKEN).filter(|t| !t.is_empty()).cloned(),
        })
    }

    /// Hash fields written when the user is first stored.
    pub fn to_fields(&self) -> Vec<(&'static str, String)> {
        let mut out = vec![
            (fields::ID, self.id.to_string()),
            (fields::USERNAME, self.username.clone()),
            (fields::PASSWORD, self.password_hash.clone()),
            (fields::NAME, self.name.clone()),
            (fields::SURNAME, self.surname.clone()),
            (fields::SCORE, self.score.to_string()),
        ];
        if let Some(token) = &self.token {
            out.push((fields::TOKEN, token.clone()));
        }
        out
    }

    pub fn public(&self) -> PublicUser {
        PublicUser::from(self)
    }
}

/// Profile fields safe to return to any caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct PublicUser {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub id: u64,
    pub username: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub surname: String,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub score: u64,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            name: user.name.clone(),
            surname: user.surname.clone(),
            score: user.score,
        }
    }
}

/// Registration input.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewUser {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub surname: String,
}

/// Partial profile update. Absent or empty fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub username: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
    pub surname: Option<String>,
}

impl ProfileUpdate {
    /// Returns the value only if present and non-empty.
    pub fn provided(value: &Option<String>) -> Option<&str> {
        value.as_deref().filter(|v| !v.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored_hash() -> HashMap<String, String> {
        [
            ("id", "7"),
            ("username", "alice"),
            ("password", "$2b$04$hash"),
            ("name", "Alice"),
            ("score", "12"),
            ("token", "tok"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    #[test]
    fn test_from_hash_reads_all_fields() {
        let user = User::from_hash(&stored_hash()).expect("complete hash");
        assert_eq!(user.id, 7);
        assert_eq!(user.username, "alice");
        assert_eq!(user.name, "Alice");
        assert_eq!(user.surname, "");
        assert_eq!(user.score, 12);
        assert_eq!(user.token.as_deref(), Some("tok"));
    }

    #[test]
    fn test_from_hash_requires_identity_fields() {
        for missing in ["id", "username", "password"] {
            let mut hash = stored_hash();
            hash.remove(missing);
            assert!(User::from_hash(&hash).is_none(), "missing {}", missing);
        }
        assert!(User::from_hash(&HashMap::new()).is_none());
    }

    #[test]
    fn test_public_user_omits_secrets() {
        let user = User::from_hash(&stored_hash()).unwrap();
        let json = serde_json::to_value(user.public()).unwrap();
        assert!(json.get("password").is_none());
        assert!(json.get("token").is_none());
        assert!(json.get("surname").is_none());
        assert_eq!(json["score"], 12);
    }

    #[test]
    fn test_profile_update_treats_empty_as_absent() {
        let update: ProfileUpdate =
            serde_json::from_str(r#"{"username": "", "surname": "X"}"#).unwrap();
        assert_eq!(ProfileUpdate::provided(&update.username), None);
        assert_eq!(ProfileUpdate::provided(&update.surname), Some("X"));
        assert_eq!(ProfileUpdate::provided(&update.name), None);
    }
}
