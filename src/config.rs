// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! The router is configured once at startup. [`Config::new`] starts from the
//! defaults below and the `with_*` methods merge caller overrides on top;
//! the result is never mutated afterwards.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `AUTHARMOR_CLIENT_ID` | OAuth client id | Required |
//! | `AUTHARMOR_CLIENT_SECRET` | OAuth client secret | Required |
//! | `AUTHARMOR_API_BASE_URL` | Invite/auth API base | `https://api.autharmor.com/v1` |
//! | `AUTHARMOR_AUTH_BASE_URL` | Token endpoint base | `https://login.autharmor.com` |
//! | `AUTHARMOR_AUTH_TIMEOUT_SECONDS` | Auth request timeout | `60` |
//! | `AUTHARMOR_AUTH_ACTION_NAME` | Auth request action name | `Login` |
//! | `AUTHARMOR_AUTH_SHORT_MSG` | Auth request prompt | `Login request` |
//! | `AUTHARMOR_RESET_AND_REINVITE` | Default invite reset flag | `false` |
//! | `AUTHARMOR_ROUTE_*` | Route overrides (`INVITE`, `INVITE_CONFIRM`, `AUTH`, `ME`, `LOGOUT`) | see [`RouteConfig`] |
//! | `AUTHARMOR_SESSION_COOKIE` | Session cookie name | `autharmor.sid` |
//! | `AUTHARMOR_SESSION_COOKIE_SECURE` | Mark the cookie `Secure` | `false` |
//! | `HOST` | Server bind address (binary only) | `0.0.0.0` |
//! | `PORT` | Server bind port (binary only) | `8080` |
//! | `TLS_CERT_PATH` / `TLS_KEY_PATH` | PEM files; HTTPS when both are set | unset |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::hooks::GetUserFn;
use crate::providers::autharmor::{DEFAULT_API_BASE_URL, DEFAULT_AUTH_BASE_URL};

pub const CLIENT_ID_ENV: &str = "AUTHARMOR_CLIENT_ID";
pub const CLIENT_SECRET_ENV: &str = "AUTHARMOR_CLIENT_SECRET";
pub const API_BASE_URL_ENV: &str = "AUTHARMOR_API_BASE_URL";
pub const AUTH_BASE_URL_ENV: &str = "AUTHARMOR_AUTH_BASE_URL";
pub const AUTH_TIMEOUT_ENV: &str = "AUTHARMOR_AUTH_TIMEOUT_SECONDS";
pub const AUTH_ACTION_NAME_ENV: &str = "AUTHARMOR_AUTH_ACTION_NAME";
pub const AUTH_SHORT_MSG_ENV: &str = "AUTHARMOR_AUTH_SHORT_MSG";
pub const RESET_AND_REINVITE_ENV: &str = "AUTHARMOR_RESET_AND_REINVITE";
pub const SESSION_COOKIE_ENV: &str = "AUTHARMOR_SESSION_COOKIE";
pub const SESSION_COOKIE_SECURE_ENV: &str = "AUTHARMOR_SESSION_COOKIE_SECURE";

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const TLS_CERT_PATH_ENV: &str = "TLS_CERT_PATH";
pub const TLS_KEY_PATH_ENV: &str = "TLS_KEY_PATH";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_SESSION_COOKIE: &str = "autharmor.sid";
pub const DEFAULT_AUTH_TIMEOUT_SECONDS: u64 = 60;
pub const DEFAULT_AUTH_ACTION_NAME: &str = "Login";
pub const DEFAULT_AUTH_SHORT_MSG: &str = "Login request";

/// Paths the router answers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteConfig {
    pub invite: String,
    pub invite_confirm: String,
    pub auth: String,
    pub me: String,
    pub logout: String,
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            invite: "/auth/autharmor/invite".to_string(),
            invite_confirm: "/auth/autharmor/invite/confirm".to_string(),
            auth: "/auth/autharmor/auth".to_string(),
            me: "/auth/autharmor/me".to_string(),
            logout: "/auth/autharmor/logout".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteOverrides {
    pub invite: Option<String>,
    pub invite_confirm: Option<String>,
    pub auth: Option<String>,
    pub me: Option<String>,
    pub logout: Option<String>,
}

impl RouteConfig {
    pub fn merge(self, overrides: RouteOverrides) -> Self {
        Self {
            invite: overrides.invite.unwrap_or(self.invite),
            invite_confirm: overrides.invite_confirm.unwrap_or(self.invite_confirm),
            auth: overrides.auth.unwrap_or(self.auth),
            me: overrides.me.unwrap_or(self.me),
            logout: overrides.logout.unwrap_or(self.logout),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let named = [
            ("invite", &self.invite),
            ("inviteConfirm", &self.invite_confirm),
            ("auth", &self.auth),
            ("me", &self.me),
            ("logout", &self.logout),
        ];
        for (name, path) in named {
            if !path.starts_with('/') {
                return Err(ConfigError::InvalidRoute {
                    name,
                    path: path.clone(),
                });
            }
        }

        // Routes sharing a method must not share a path.
        let post = [
            ("invite", &self.invite),
            ("inviteConfirm", &self.invite_confirm),
            ("auth", &self.auth),
        ];
        let get = [("me", &self.me), ("logout", &self.logout)];
        check_unique("POST", &post)?;
        check_unique("GET", &get)
    }
}

fn check_unique(
    method: &'static str,
    routes: &[(&'static str, &String)],
) -> Result<(), ConfigError> {
    for (i, &(first, path)) in routes.iter().enumerate() {
        if let Some(&(second, _)) = routes[i + 1..].iter().find(|(_, other)| *other == path) {
            return Err(ConfigError::DuplicateRoute {
                method,
                path: path.clone(),
                first,
                second,
            });
        }
    }
    Ok(())
}

/// Parameters sent with every login auth request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthSettings {
    pub timeout_in_seconds: u64,
    pub action_name: String,
    pub short_msg: String,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            timeout_in_seconds: DEFAULT_AUTH_TIMEOUT_SECONDS,
            action_name: DEFAULT_AUTH_ACTION_NAME.to_string(),
            short_msg: DEFAULT_AUTH_SHORT_MSG.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthOverrides {
    pub timeout_in_seconds: Option<u64>,
    pub action_name: Option<String>,
    pub short_msg: Option<String>,
}

impl AuthSettings {
    pub fn merge(self, overrides: AuthOverrides) -> Self {
        Self {
            timeout_in_seconds: overrides
                .timeout_in_seconds
                .unwrap_or(self.timeout_in_seconds),
            action_name: overrides.action_name.unwrap_or(self.action_name),
            short_msg: overrides.short_msg.unwrap_or(self.short_msg),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InviteSettings {
    pub reset_and_reinvite: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InviteOverrides {
    pub reset_and_reinvite: Option<bool>,
}

impl InviteSettings {
    pub fn merge(self, overrides: InviteOverrides) -> Self {
        Self {
            reset_and_reinvite: overrides
                .reset_and_reinvite
                .unwrap_or(self.reset_and_reinvite),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    pub cookie_name: String,
    pub secure: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            cookie_name: DEFAULT_SESSION_COOKIE.to_string(),
            secure: false,
        }
    }
}

#[derive(Clone)]
pub struct Config {
    pub client_id: String,
    pub client_secret: String,
    pub api_base_url: String,
    pub auth_base_url: String,
    pub routes: RouteConfig,
    pub auth: AuthSettings,
    pub invite: InviteSettings,
    pub session: SessionSettings,
    pub get_user: Option<GetUserFn>,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("api_base_url", &self.api_base_url)
            .field("auth_base_url", &self.auth_base_url)
            .field("routes", &self.routes)
            .field("auth", &self.auth)
            .field("invite", &self.invite)
            .field("session", &self.session)
            .field("get_user", &self.get_user.is_some())
            .finish()
    }
}

impl Config {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            auth_base_url: DEFAULT_AUTH_BASE_URL.to_string(),
            routes: RouteConfig::default(),
            auth: AuthSettings::default(),
            invite: InviteSettings::default(),
            session: SessionSettings::default(),
            get_user: None,
        }
    }

    /// Load configuration from the environment.
    ///
    /// Missing credentials are left empty here and rejected when the router
    /// is constructed.
    pub fn from_env() -> Self {
        let mut config = Self::new(
            env_optional(CLIENT_ID_ENV).unwrap_or_default(),
            env_optional(CLIENT_SECRET_ENV).unwrap_or_default(),
        )
        .with_api_base_url(env_or_default(API_BASE_URL_ENV, DEFAULT_API_BASE_URL))
        .with_auth_base_url(env_or_default(AUTH_BASE_URL_ENV, DEFAULT_AUTH_BASE_URL))
        .with_routes(RouteOverrides {
            invite: env_optional("AUTHARMOR_ROUTE_INVITE"),
            invite_confirm: env_optional("AUTHARMOR_ROUTE_INVITE_CONFIRM"),
            auth: env_optional("AUTHARMOR_ROUTE_AUTH"),
            me: env_optional("AUTHARMOR_ROUTE_ME"),
            logout: env_optional("AUTHARMOR_ROUTE_LOGOUT"),
        })
        .with_auth(AuthOverrides {
            timeout_in_seconds: env_optional(AUTH_TIMEOUT_ENV).and_then(|v| v.parse().ok()),
            action_name: env_optional(AUTH_ACTION_NAME_ENV),
            short_msg: env_optional(AUTH_SHORT_MSG_ENV),
        })
        .with_invite(InviteOverrides {
            reset_and_reinvite: env_optional(RESET_AND_REINVITE_ENV).and_then(|v| parse_bool(&v)),
        });

        config.session = SessionSettings {
            cookie_name: env_or_default(SESSION_COOKIE_ENV, DEFAULT_SESSION_COOKIE),
            secure: env_optional(SESSION_COOKIE_SECURE_ENV)
                .and_then(|v| parse_bool(&v))
                .unwrap_or(false),
        };
        config
    }

    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    pub fn with_auth_base_url(mut self, url: impl Into<String>) -> Self {
        self.auth_base_url = url.into();
        self
    }

    pub fn with_routes(mut self, overrides: RouteOverrides) -> Self {
        self.routes = self.routes.merge(overrides);
        self
    }

    pub fn with_auth(mut self, overrides: AuthOverrides) -> Self {
        self.auth = self.auth.merge(overrides);
        self
    }

    pub fn with_invite(mut self, overrides: InviteOverrides) -> Self {
        self.invite = self.invite.merge(overrides);
        self
    }

    pub fn with_session(mut self, session: SessionSettings) -> Self {
        self.session = session;
        self
    }

    pub fn with_get_user(mut self, get_user: GetUserFn) -> Self {
        self.get_user = Some(get_user);
        self
    }

    /// Checks run when the router is built, so a bad deployment fails at
    /// startup rather than on the first request.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.client_id.trim().is_empty() {
            return Err(ConfigError::MissingClientId);
        }
        if self.client_secret.trim().is_empty() {
            return Err(ConfigError::MissingClientSecret);
        }
        validate_url("api_base_url", &self.api_base_url)?;
        validate_url("auth_base_url", &self.auth_base_url)?;
        self.routes.validate()
    }
}

fn validate_url(name: &'static str, value: &str) -> Result<(), ConfigError> {
    match url::Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => Ok(()),
        _ => Err(ConfigError::InvalidUrl {
            name,
            value: value.to_string(),
        }),
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

pub(crate) fn env_optional(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub(crate) fn env_or_default(name: &str, default: &str) -> String {
    env_optional(name).unwrap_or_else(|| default.to_string())
}
