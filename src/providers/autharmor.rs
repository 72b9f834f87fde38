// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Auth Armor API client: client-credentials token exchange, invite
//! generation and auth requests.

use std::collections::HashMap;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

pub const DEFAULT_API_BASE_URL: &str = "https://api.autharmor.com/v1";
pub const DEFAULT_AUTH_BASE_URL: &str = "https://login.autharmor.com";
const API_SCOPE: &str = "aarmor.api.generate_invite_code aarmor.api.request_auth";

#[derive(Debug, thiserror::Error)]
pub enum AuthArmorError {
    #[error("Auth Armor token request failed: {message}")]
    Auth {
        message: String,
        body: Option<Value>,
    },

    #[error("Auth Armor {path} returned {status}")]
    Upstream {
        path: String,
        status: u16,
        body: Value,
    },

    #[error("Auth Armor request failed: {0}")]
    Request(String),

    #[error("Auth Armor response was invalid: {0}")]
    InvalidResponse(String),
}

impl AuthArmorError {
    pub fn upstream_body(&self) -> Option<&Value> {
        match self {
            AuthArmorError::Auth { body, .. } => body.as_ref(),
            AuthArmorError::Upstream { body, .. } => Some(body),
            AuthArmorError::Request(_) | AuthArmorError::InvalidResponse(_) => None,
        }
    }

    /// Take the forwarded body out of the error, or hand the error back.
    pub fn into_upstream_body(self) -> Result<Value, Self> {
        match self {
            AuthArmorError::Auth {
                body: Some(body), ..
            }
            | AuthArmorError::Upstream { body, .. } => Ok(body),
            other => Err(other),
        }
    }
}

/// Body of `POST /invite/request`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct InviteRequest<'a> {
    pub nickname: &'a str,
    pub reference_id: &'a str,
    pub reset_and_reinvite: bool,
}

/// Body of `POST /auth/request`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AuthRequest<'a> {
    pub nickname: &'a str,
    pub action_name: &'a str,
    pub short_msg: &'a str,
    pub timeout_in_seconds: u64,
}

#[derive(Debug, Deserialize)]
struct OAuthTokenResponse {
    access_token: String,
}

#[derive(Debug, Clone)]
pub struct AuthArmorClient {
    api_base_url: String,
    auth_base_url: String,
    client_id: String,
    client_secret: String,
    http: Client,
}

impl AuthArmorClient {
    pub fn new(
        api_base_url: impl Into<String>,
        auth_base_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            auth_base_url: auth_base_url.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            http: Client::new(),
        }
    }

    /// Exchange the client credentials for a bearer token.
    ///
    /// Tokens are never cached: every inbound request fetches its own.
    pub async fn access_token(&self) -> Result<String, AuthArmorError> {
        let mut form = HashMap::new();
        form.insert("grant_type", "client_credentials");
        form.insert("client_id", self.client_id.as_str());
        form.insert("client_secret", self.client_secret.as_str());
        form.insert("scope", API_SCOPE);

        let response = self
            .http
            .post(format!(
                "{}/connect/token",
                self.auth_base_url.trim_end_matches('/')
            ))
            .form(&form)
            .send()
            .await
            .map_err(|e| AuthArmorError::Auth {
                message: format!("token request failed: {e}"),
                body: None,
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = read_body(response).await;
            return Err(AuthArmorError::Auth {
                message: format!("token request returned {status}"),
                body: Some(body),
            });
        }

        let token_response: OAuthTokenResponse =
            response.json().await.map_err(|e| AuthArmorError::Auth {
                message: format!("invalid token response: {e}"),
                body: None,
            })?;

        if token_response.access_token.trim().is_empty() {
            return Err(AuthArmorError::Auth {
                message: "token response did not include access_token".to_string(),
                body: None,
            });
        }

        Ok(token_response.access_token)
    }

    pub async fn create_invite(
        &self,
        token: &str,
        request: &InviteRequest<'_>,
    ) -> Result<Value, AuthArmorError> {
        self.post_json("/invite/request", token, request).await
    }

    pub async fn request_auth(
        &self,
        token: &str,
        request: &AuthRequest<'_>,
    ) -> Result<Value, AuthArmorError> {
        self.post_json("/auth/request", token, request).await
    }

    async fn post_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        token: &str,
        payload: &T,
    ) -> Result<Value, AuthArmorError> {
        debug!(path, "Auth Armor POST");
        let response = self
            .http
            .post(format!(
                "{}{}",
                self.api_base_url.trim_end_matches('/'),
                path
            ))
            .bearer_auth(token)
            .json(payload)
            .send()
            .await
            .map_err(|e| AuthArmorError::Request(format!("POST {path} failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = read_body(response).await;
            return Err(AuthArmorError::Upstream {
                path: path.to_string(),
                status,
                body,
            });
        }

        response.json().await.map_err(|e| {
            AuthArmorError::InvalidResponse(format!("POST {path} invalid JSON: {e}"))
        })
    }
}

/// Error bodies are forwarded to callers as-is; non-JSON text is kept as a
/// JSON string.
async fn read_body(response: reqwest::Response) -> Value {
    let text = response.text().await.unwrap_or_default();
    serde_json::from_str(&text).unwrap_or(Value::String(text))
}
