// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Error types shared by the route handlers and the hook layer.
//!
//! A validator rejection, an upstream failure and a configuration problem
//! each map to their own [`ApiError`] variant with its own body and status.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;
use tracing::{error, warn};

use crate::providers::autharmor::AuthArmorError;

/// Status used when a rejection does not name one.
pub const DEFAULT_ERROR_CODE: u16 = 400;

/// Raised at construction or first use when the router is misconfigured.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Auth Armor client id is required")]
    MissingClientId,

    #[error("Auth Armor client secret is required")]
    MissingClientSecret,

    #[error("a getUser callback is required for the current-user route")]
    MissingGetUser,

    #[error("unknown validator '{0}'")]
    UnknownValidator(String),

    #[error("unknown event '{0}'")]
    UnknownEvent(String),

    #[error("unknown hook '{0}'")]
    UnknownHook(String),

    #[error("route '{name}' must start with '/', got '{path}'")]
    InvalidRoute { name: &'static str, path: String },

    #[error("routes '{first}' and '{second}' both answer {method} {path}")]
    DuplicateRoute {
        method: &'static str,
        path: String,
        first: &'static str,
        second: &'static str,
    },

    #[error("{name} is not a valid http(s) URL: {value}")]
    InvalidUrl { name: &'static str, value: String },
}

/// A structured refusal returned by a validator or a `getUser` callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub code: Option<u16>,
    pub message: String,
}

impl Rejection {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }

    pub fn with_code(mut self, code: u16) -> Self {
        self.code = Some(code);
        self
    }

    pub fn code(&self) -> u16 {
        self.code.unwrap_or(DEFAULT_ERROR_CODE)
    }
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for Rejection {}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Configuration(#[from] ConfigError),

    #[error("rejected: {0}")]
    Rejected(Rejection),

    #[error("upstream error ({status})")]
    Upstream { status: StatusCode, body: Value },

    #[error("{message}")]
    Status { status: StatusCode, message: String },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    error_message: String,
    error_code: u16,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    /// Map a remote call failure onto `status`, forwarding the upstream body
    /// when the remote API produced one.
    pub fn from_remote(err: AuthArmorError, status: StatusCode) -> Self {
        match err.into_upstream_body() {
            Ok(body) => Self::Upstream { status, body },
            Err(err) => Self::new(status, err.to_string()),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Rejected(rejection) => StatusCode::from_u16(rejection.code())
                .ok()
                .filter(|status| status.is_client_error() || status.is_server_error())
                .unwrap_or(StatusCode::BAD_REQUEST),
            ApiError::Upstream { status, .. } | ApiError::Status { status, .. } => *status,
        }
    }
}

impl From<Rejection> for ApiError {
    fn from(rejection: Rejection) -> Self {
        ApiError::Rejected(rejection)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            ApiError::Configuration(err) => {
                error!(error = %err, "Auth Armor router misconfigured");
                let body = ErrorBody {
                    error_message: err.to_string(),
                    error_code: status.as_u16(),
                };
                (status, Json(body)).into_response()
            }
            ApiError::Rejected(rejection) => {
                warn!(code = rejection.code(), message = %rejection.message, "Request rejected");
                let body = ErrorBody {
                    error_code: rejection.code(),
                    error_message: rejection.message,
                };
                (status, Json(body)).into_response()
            }
            ApiError::Upstream { body, .. } => {
                warn!(status = status.as_u16(), body = %body, "Auth Armor request failed");
                (status, Json(body)).into_response()
            }
            ApiError::Status { message, .. } => {
                warn!(status = status.as_u16(), message = %message, "Request failed");
                let body = ErrorBody {
                    error_message: message,
                    error_code: status.as_u16(),
                };
                (status, Json(body)).into_response()
            }
        }
    }
}
