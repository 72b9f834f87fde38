// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Auth Armor Router - passwordless authentication routes for Axum
//!
//! This crate binds a small set of HTTP routes (invite generation, invite
//! confirmation, login, current user, logout) to the Auth Armor API. All
//! cryptographic and biometric verification happens remotely; the crate
//! sequences the remote calls and lets the host application hook in:
//! validators gate and remap requests before a remote call, events observe
//! the outcome afterwards and usually persist session state.
//!
//! ## Modules
//!
//! - `armor` - `AuthArmor` facade: construction, hook registration, mounting
//! - `api` - HTTP handlers (Axum)
//! - `hooks` - validator/event names, payloads and registry
//! - `session` - per-request session wrapper and the `SessionStore` trait
//! - `providers` - Auth Armor API client

pub mod api;
pub mod armor;
pub mod config;
pub mod error;
pub mod hooks;
pub mod models;
pub mod providers;
pub mod session;
pub mod state;
pub mod store;

pub use armor::AuthArmor;
pub use config::{AuthOverrides, Config, InviteOverrides, RouteConfig, RouteOverrides};
pub use error::{ApiError, ConfigError, Rejection};
pub use hooks::{Event, HookName, ValidatorInput, ValidatorOutput};
pub use session::{Session, SessionError, SessionStore};
pub use store::InMemorySessionStore;
