// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Entry point for host applications.
//!
//! ```rust,ignore
//! let armor = AuthArmor::new(Config::from_env())?
//!     .with_session_store(Arc::new(InMemorySessionStore::new()));
//!
//! armor.validate("authRequest", |input, _session| async move {
//!     Ok(ValidatorOutput::nickname(lookup_nickname(input.nickname()).await?))
//! })?;
//! armor.on("authSuccess", |event, session| async move {
//!     if let Event::AuthSuccess { nickname, .. } = event {
//!         if let Err(err) = session.save(json!({ "nickname": nickname })).await {
//!             warn!(error = %err, "Failed to persist login in session");
//!         }
//!     }
//! })?;
//!
//! let app = armor.mount(Router::new());
//! ```

use std::{future::Future, sync::Arc};

use axum::Router;

use crate::{
    api,
    config::{Config, RouteConfig},
    error::{ConfigError, Rejection},
    hooks::{self, Event, HookRegistry, ValidatorInput, ValidatorOutput},
    session::{Session, SessionStore},
    state::AppState,
};

#[derive(Clone)]
pub struct AuthArmor {
    state: AppState,
}

impl AuthArmor {
    /// Validate `config` and build the router state. Fails immediately on
    /// missing credentials or malformed routes.
    pub fn new(config: Config) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            state: AppState::new(config, None),
        })
    }

    pub fn with_session_store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.state.sessions = Some(store);
        self
    }

    /// Register a validator (`inviteRequest` or `authRequest`).
    pub fn validate<F, Fut>(&self, name: &str, callback: F) -> Result<(), ConfigError>
    where
        F: Fn(ValidatorInput, Session) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<ValidatorOutput, Rejection>> + Send + 'static,
    {
        self.state.hooks.validate(name, hooks::validator(callback))
    }

    /// Register an event handler.
    pub fn on<F, Fut>(&self, name: &str, callback: F) -> Result<(), ConfigError>
    where
        F: Fn(Event, Session) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.state.hooks.on(name, hooks::event_handler(callback))
    }

    /// Reset a validator or event to its no-op binding.
    pub fn remove(&self, name: &str) -> Result<(), ConfigError> {
        self.state.hooks.remove(name)
    }

    pub fn hooks(&self) -> &HookRegistry {
        &self.state.hooks
    }

    /// Paths the routes are served on.
    pub fn routes(&self) -> &RouteConfig {
        &self.state.config.routes
    }

    pub fn router(&self) -> Router {
        api::router(self.state.clone())
    }

    /// Merge the routes into a host router.
    pub fn mount(&self, router: Router) -> Router {
        router.merge(self.router())
    }
}
