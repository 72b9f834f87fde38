// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Validators and Events
//!
//! Host applications plug business rules into the routes through two kinds
//! of hooks:
//!
//! - **Validators** run before a remote call. They may reject the request
//!   with a [`Rejection`] or, for `authRequest`, remap the login identifier
//!   to the nickname registered with Auth Armor.
//! - **Events** run after a remote call and are told the outcome. They are
//!   typically used to persist session state; they cannot fail the request.
//!
//! The set of hook names is closed. Every name is bound to a no-op when the
//! registry is created, so dispatch never has to handle a missing listener.
//! Replacing a binding swaps a single `Arc`, so a request that already
//! picked up a callback keeps running it even if it is replaced meanwhile.

use std::{
    collections::HashMap,
    future::Future,
    pin::Pin,
    sync::{Arc, PoisonError, RwLock},
};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{ConfigError, Rejection};
use crate::session::Session;

pub type HookFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

pub type ValidatorResult = Result<ValidatorOutput, Rejection>;

pub type ValidatorFn =
    Arc<dyn Fn(ValidatorInput, Session) -> HookFuture<ValidatorResult> + Send + Sync>;

pub type EventFn = Arc<dyn Fn(Event, Session) -> HookFuture<()> + Send + Sync>;

/// Resolves the current user for the `me` route.
pub type GetUserFn = Arc<dyn Fn(Session) -> HookFuture<Result<Value, Rejection>> + Send + Sync>;

pub fn validator<F, Fut>(f: F) -> ValidatorFn
where
    F: Fn(ValidatorInput, Session) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<ValidatorOutput, Rejection>> + Send + 'static,
{
    Arc::new(move |input, session| Box::pin(f(input, session)))
}

pub fn event_handler<F, Fut>(f: F) -> EventFn
where
    F: Fn(Event, Session) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    Arc::new(move |event, session| Box::pin(f(event, session)))
}

pub fn get_user<F, Fut>(f: F) -> GetUserFn
where
    F: Fn(Session) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, Rejection>> + Send + 'static,
{
    Arc::new(move |session| Box::pin(f(session)))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HookName {
    InviteRequest,
    AuthRequest,
    InviteGenerated,
    InviteConfirmSuccess,
    InviteConfirmError,
    AuthSuccess,
    AuthTimeout,
    AuthDeclined,
    AuthError,
}

impl HookName {
    pub const VALIDATORS: [HookName; 2] = [HookName::InviteRequest, HookName::AuthRequest];

    pub const EVENTS: [HookName; 7] = [
        HookName::InviteGenerated,
        HookName::InviteConfirmSuccess,
        HookName::InviteConfirmError,
        HookName::AuthSuccess,
        HookName::AuthTimeout,
        HookName::AuthDeclined,
        HookName::AuthError,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HookName::InviteRequest => "inviteRequest",
            HookName::AuthRequest => "authRequest",
            HookName::InviteGenerated => "inviteGenerated",
            HookName::InviteConfirmSuccess => "inviteConfirmSuccess",
            HookName::InviteConfirmError => "inviteConfirmError",
            HookName::AuthSuccess => "authSuccess",
            HookName::AuthTimeout => "authTimeout",
            HookName::AuthDeclined => "authDeclined",
            HookName::AuthError => "authError",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::VALIDATORS
            .into_iter()
            .chain(Self::EVENTS)
            .find(|hook| hook.as_str() == name)
    }

    pub fn is_validator(&self) -> bool {
        Self::VALIDATORS.contains(self)
    }
}

impl std::fmt::Display for HookName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Input handed to a validator, tagged by the validator it is meant for.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "hook", rename_all = "camelCase")]
pub enum ValidatorInput {
    #[serde(rename_all = "camelCase")]
    InviteRequest {
        nickname: String,
        reference_id: Option<String>,
    },
    AuthRequest { nickname: String },
}

impl ValidatorInput {
    pub fn hook(&self) -> HookName {
        match self {
            ValidatorInput::InviteRequest { .. } => HookName::InviteRequest,
            ValidatorInput::AuthRequest { .. } => HookName::AuthRequest,
        }
    }

    pub fn nickname(&self) -> &str {
        match self {
            ValidatorInput::InviteRequest { nickname, .. }
            | ValidatorInput::AuthRequest { nickname } => nickname,
        }
    }
}

/// What a validator hands back on success.
///
/// Only `authRequest` reads it: `nickname` replaces the submitted username
/// for the remote call and `metadata` is passed through to the auth events.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidatorOutput {
    pub nickname: Option<String>,
    pub metadata: Option<Value>,
}

impl ValidatorOutput {
    pub fn nickname(nickname: impl Into<String>) -> Self {
        Self {
            nickname: Some(nickname.into()),
            metadata: None,
        }
    }

    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// Outcome notifications, tagged by event name.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum Event {
    #[serde(rename_all = "camelCase")]
    InviteGenerated {
        invite: Value,
        username: String,
        reference_id: String,
    },
    InviteConfirmSuccess { auth: Value, nickname: String },
    InviteConfirmError { error: Value, nickname: String },
    AuthSuccess {
        auth: Value,
        metadata: Option<Value>,
        nickname: String,
    },
    AuthTimeout {
        auth: Value,
        metadata: Option<Value>,
        nickname: String,
    },
    AuthDeclined {
        auth: Value,
        metadata: Option<Value>,
        nickname: String,
    },
    AuthError { error: Value, nickname: String },
}

impl Event {
    pub fn hook(&self) -> HookName {
        match self {
            Event::InviteGenerated { .. } => HookName::InviteGenerated,
            Event::InviteConfirmSuccess { .. } => HookName::InviteConfirmSuccess,
            Event::InviteConfirmError { .. } => HookName::InviteConfirmError,
            Event::AuthSuccess { .. } => HookName::AuthSuccess,
            Event::AuthTimeout { .. } => HookName::AuthTimeout,
            Event::AuthDeclined { .. } => HookName::AuthDeclined,
            Event::AuthError { .. } => HookName::AuthError,
        }
    }
}

fn noop_validator() -> ValidatorFn {
    validator(|_, _| async { Ok(ValidatorOutput::default()) })
}

fn noop_event() -> EventFn {
    event_handler(|_, _| async {})
}

/// Per-router table of hook bindings.
pub struct HookRegistry {
    validators: RwLock<HashMap<HookName, ValidatorFn>>,
    events: RwLock<HashMap<HookName, EventFn>>,
}

impl Default for HookRegistry {
    fn default() -> Self {
        Self {
            validators: RwLock::new(
                HookName::VALIDATORS
                    .into_iter()
                    .map(|name| (name, noop_validator()))
                    .collect(),
            ),
            events: RwLock::new(
                HookName::EVENTS
                    .into_iter()
                    .map(|name| (name, noop_event()))
                    .collect(),
            ),
        }
    }
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a validator, replacing any previous one.
    pub fn validate(&self, name: &str, callback: ValidatorFn) -> Result<(), ConfigError> {
        let hook = HookName::parse(name)
            .filter(HookName::is_validator)
            .ok_or_else(|| ConfigError::UnknownValidator(name.to_string()))?;
        self.validators
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(hook, callback);
        debug!(hook = %hook, "Validator registered");
        Ok(())
    }

    /// Bind an event handler, replacing any previous one.
    pub fn on(&self, name: &str, callback: EventFn) -> Result<(), ConfigError> {
        let hook = HookName::parse(name)
            .filter(|hook| !hook.is_validator())
            .ok_or_else(|| ConfigError::UnknownEvent(name.to_string()))?;
        self.events
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(hook, callback);
        debug!(hook = %hook, "Event handler registered");
        Ok(())
    }

    /// Reset a hook to its no-op binding.
    pub fn remove(&self, name: &str) -> Result<(), ConfigError> {
        let hook =
            HookName::parse(name).ok_or_else(|| ConfigError::UnknownHook(name.to_string()))?;
        if hook.is_validator() {
            self.validators
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(hook, noop_validator());
        } else {
            self.events
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(hook, noop_event());
        }
        debug!(hook = %hook, "Hook reset");
        Ok(())
    }

    fn validator_for(&self, hook: HookName) -> ValidatorFn {
        self.validators
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&hook)
            .cloned()
            .unwrap_or_else(noop_validator)
    }

    fn event_for(&self, hook: HookName) -> EventFn {
        self.events
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&hook)
            .cloned()
            .unwrap_or_else(noop_event)
    }

    pub async fn run_validator(
        &self,
        input: ValidatorInput,
        session: &Session,
    ) -> Result<ValidatorOutput, Rejection> {
        let callback = self.validator_for(input.hook());
        callback(input, session.clone()).await
    }

    /// Fire an event. Handlers cannot fail the request.
    pub async fn emit(&self, event: Event, session: &Session) {
        let hook = event.hook();
        debug!(hook = %hook, "Dispatching event");
        let callback = self.event_for(hook);
        callback(event, session.clone()).await;
    }
}
