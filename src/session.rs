// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Per-request session wrapper handed to hooks and `getUser`.
//!
//! The session store itself belongs to the host application and is reached
//! through [`SessionStore`]. A session is identified by an opaque id carried
//! in an `HttpOnly` cookie; the wrapper loads the stored user when the
//! request arrives and tracks whether the response must issue or clear the
//! cookie.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{
        header::{InvalidHeaderValue, COOKIE, SET_COOKIE},
        request::Parts,
        HeaderMap, HeaderValue, StatusCode,
    },
    response::Response,
};
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{error, warn};
use uuid::Uuid;

use crate::config::SessionSettings;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("no session store is configured")]
    Unavailable,

    #[error("session store failed: {0}")]
    Store(String),
}

/// Host-provided persistence for session user data.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self, id: &str) -> Result<Option<Value>, SessionError>;

    async fn save(&self, id: &str, user: &Value) -> Result<(), SessionError>;

    async fn destroy(&self, id: &str) -> Result<(), SessionError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CookieChange {
    Unchanged,
    Issued,
    Cleared,
}

struct SessionState {
    id: Option<String>,
    user: Option<Value>,
    cookie: CookieChange,
}

/// Cheap to clone; clones share the same underlying state.
#[derive(Clone)]
pub struct Session {
    state: Arc<Mutex<SessionState>>,
    store: Option<Arc<dyn SessionStore>>,
}

impl Session {
    fn with_state(
        store: Option<Arc<dyn SessionStore>>,
        id: Option<String>,
        user: Option<Value>,
    ) -> Self {
        Self {
            state: Arc::new(Mutex::new(SessionState {
                id,
                user,
                cookie: CookieChange::Unchanged,
            })),
            store,
        }
    }

    /// A session with no backing store. `save` and `clear` fail.
    pub fn detached() -> Self {
        Self::with_state(None, None, None)
    }

    /// Resolve the session for `id`. Unknown ids start an empty session.
    pub async fn load(
        store: Option<Arc<dyn SessionStore>>,
        id: Option<String>,
    ) -> Result<Self, SessionError> {
        let Some(id) = id else {
            return Ok(Self::with_state(store, None, None));
        };
        let Some(backend) = store.clone() else {
            return Ok(Self::with_state(None, None, None));
        };
        match backend.load(&id).await? {
            Some(user) => Ok(Self::with_state(store, Some(id), Some(user))),
            None => Ok(Self::with_state(store, None, None)),
        }
    }

    /// Snapshot of the stored user, if any.
    pub async fn user(&self) -> Option<Value> {
        self.state.lock().await.user.clone()
    }

    pub async fn id(&self) -> Option<String> {
        self.state.lock().await.id.clone()
    }

    pub async fn is_active(&self) -> bool {
        self.state.lock().await.user.is_some()
    }

    pub fn can_destroy(&self) -> bool {
        self.store.is_some()
    }

    /// Overwrite the stored user and persist it under a fresh session id.
    ///
    /// An id carried in by the request is destroyed and replaced. Ids
    /// issued earlier in the same request are reused.
    pub async fn save(&self, user: Value) -> Result<(), SessionError> {
        let store = self.store.as_ref().ok_or(SessionError::Unavailable)?;
        let mut state = self.state.lock().await;
        let id = match (state.cookie, state.id.take()) {
            (CookieChange::Issued, Some(id)) => id,
            (_, previous) => {
                if let Some(previous) = previous {
                    store.destroy(&previous).await?;
                }
                Uuid::new_v4().to_string()
            }
        };
        store.save(&id, &user).await?;
        state.cookie = CookieChange::Issued;
        state.id = Some(id);
        state.user = Some(user);
        Ok(())
    }

    /// Terminate the session.
    pub async fn clear(&self) -> Result<(), SessionError> {
        let store = self.store.as_ref().ok_or(SessionError::Unavailable)?;
        let mut state = self.state.lock().await;
        if let Some(id) = state.id.take() {
            store.destroy(&id).await?;
        }
        state.user = None;
        state.cookie = CookieChange::Cleared;
        Ok(())
    }

    /// Add a `Set-Cookie` header when the session was created or cleared
    /// while handling this request.
    pub(crate) async fn attach_cookie(
        &self,
        settings: &SessionSettings,
        mut response: Response,
    ) -> Response {
        let state = self.state.lock().await;
        let cookie = match (state.cookie, state.id.as_deref()) {
            (CookieChange::Issued, Some(id)) => session_cookie(settings, id),
            (CookieChange::Cleared, _) => clear_session_cookie(settings),
            _ => return response,
        };
        match cookie {
            Ok(value) => {
                response.headers_mut().append(SET_COOKIE, value);
            }
            Err(err) => error!("Failed to build session cookie: {err}"),
        }
        response
    }
}

impl FromRequestParts<AppState> for Session {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let id = extract_session_id(&parts.headers, &state.config.session.cookie_name);
        Session::load(state.sessions.clone(), id).await.map_err(|err| {
            warn!(error = %err, "Failed to load session");
            ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        })
    }
}

pub(crate) fn session_cookie(
    settings: &SessionSettings,
    id: &str,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie = format!(
        "{}={id}; Path=/; HttpOnly; SameSite=Lax",
        settings.cookie_name
    );
    if settings.secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

pub(crate) fn clear_session_cookie(
    settings: &SessionSettings,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie = format!(
        "{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0",
        settings.cookie_name
    );
    if settings.secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

fn extract_session_id(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    for header in headers.get_all(COOKIE) {
        let Ok(value) = header.to_str() else {
            continue;
        };
        for pair in value.split(';') {
            let Some((key, val)) = pair.trim().split_once('=') else {
                continue;
            };
            let val = val.trim();
            if key.trim() == cookie_name && !val.is_empty() {
                return Some(val.to_string());
            }
        }
    }
    None
}
