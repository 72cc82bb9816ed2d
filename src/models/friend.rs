//! Friend requests and friendships.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Pending request as listed to its recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct FriendRequest {
    /// Sender id
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub id: u64,
    /// Sender username
    pub username: String,
    /// When the request was sent (RFC3339, UTC)
    pub sent_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Friend {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub id: u64,
    pub username: String,
}

/// Recipient's answer to a pending request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum Decision {
    Accept,
    Reject,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decision_wire_format() {
        let d: Decision = serde_json::from_str(r#""Accept""#).unwrap();
        assert_eq!(d, Decision::Accept);
        assert!(serde_json::from_str::<Decision>(r#""Maybe""#).is_err());
    }

    #[test]
    fn test_request_serializes_camel_case() {
        let req = FriendRequest {
            id: 3,
            username: "carol".to_string(),
            sent_at: "2026-01-01T00:00:00Z".to_string(),
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["sentAt"], "2026-01-01T00:00:00Z");
    }
}
