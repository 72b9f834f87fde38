// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request bodies accepted by the routes and the discriminator read from
//! Auth Armor auth results. Invite and auth payloads themselves stay opaque
//! (`serde_json::Value`) and are returned to clients unchanged.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

/// Body of the invite route.
#[derive(Debug, Clone, Deserialize, ToSchema, PartialEq, Eq)]
pub struct InviteBody {
    /// Nickname to register with Auth Armor.
    pub nickname: String,
    /// Caller-chosen reference; a UUID is generated when absent.
    #[serde(default, rename = "referenceId", alias = "reference_id")]
    pub reference_id: Option<String>,
    /// Overrides the configured reset-and-reinvite default.
    #[serde(default)]
    pub reset_and_reinvite: Option<bool>,
}

/// Body of the invite confirmation route.
#[derive(Debug, Clone, Deserialize, ToSchema, PartialEq, Eq)]
pub struct InviteConfirmBody {
    pub nickname: String,
}

/// Body of the login route.
#[derive(Debug, Clone, Deserialize, ToSchema, PartialEq, Eq)]
pub struct AuthBody {
    /// Login identifier; an `authRequest` validator may remap it.
    pub username: String,
}

#[derive(Debug, Clone, Serialize, ToSchema, PartialEq, Eq)]
pub struct LogoutResponse {
    pub message: String,
}

/// Result of an auth request, read from its `response_message`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    Success,
    Declined,
    Timeout,
    Unrecognized(Option<String>),
}

impl AuthOutcome {
    pub fn from_payload(payload: &Value) -> Self {
        let Some(raw) = payload.get("response_message").and_then(Value::as_str) else {
            return AuthOutcome::Unrecognized(None);
        };
        match raw {
            "Success" => AuthOutcome::Success,
            "Declined" => AuthOutcome::Declined,
            "Timeout" => AuthOutcome::Timeout,
            _ => AuthOutcome::Unrecognized(Some(raw.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn auth_outcome_mapping_is_stable() {
        assert_eq!(
            AuthOutcome::from_payload(&json!({ "response_message": "Success" })),
            AuthOutcome::Success
        );
        assert_eq!(
            AuthOutcome::from_payload(&json!({ "response_message": "Declined" })),
            AuthOutcome::Declined
        );
        assert_eq!(
            AuthOutcome::from_payload(&json!({ "response_message": "Timeout" })),
            AuthOutcome::Timeout
        );
        assert_eq!(
            AuthOutcome::from_payload(&json!({ "response_message": "declined" })),
            AuthOutcome::Unrecognized(Some("declined".to_string()))
        );
        assert_eq!(
            AuthOutcome::from_payload(&json!({ "response_message": " Timeout " })),
            AuthOutcome::Unrecognized(Some(" Timeout ".to_string()))
        );
        assert_eq!(
            AuthOutcome::from_payload(&json!({ "response_message": "Pending" })),
            AuthOutcome::Unrecognized(Some("Pending".to_string()))
        );
        assert_eq!(
            AuthOutcome::from_payload(&json!({ "auth_request_id": "x" })),
            AuthOutcome::Unrecognized(None)
        );
    }

    #[test]
    fn invite_body_accepts_both_reference_spellings() {
        let camel: InviteBody =
            serde_json::from_value(json!({ "nickname": "alice", "referenceId": "r1" })).unwrap();
        let snake: InviteBody =
            serde_json::from_value(json!({ "nickname": "alice", "reference_id": "r1" })).unwrap();
        assert_eq!(camel, snake);
        assert_eq!(camel.reset_and_reinvite, None);
    }
}
