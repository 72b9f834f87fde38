// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::{json, Value};
use utoipa::OpenApi;

use crate::{
    error::ApiError,
    models::{AuthBody, InviteBody, InviteConfirmBody, LogoutResponse},
    providers::AuthArmorError,
    session::Session,
    state::AppState,
};

pub mod auth;
pub mod body;
pub mod invites;
pub mod users;

#[cfg(test)]
pub(crate) mod test_support;

/// Routes at the configured paths, bound to `state`.
pub fn router(state: AppState) -> Router {
    let routes = state.config.routes.clone();
    Router::new()
        .route(&routes.invite, post(invites::create_invite))
        .route(&routes.invite_confirm, post(invites::confirm_invite))
        .route(&routes.auth, post(auth::authenticate))
        .route(&routes.me, get(users::get_current_user))
        .route(&routes.logout, get(users::logout))
        .with_state(state)
}

/// Render a flow result and attach any session cookie change.
async fn finish<T: Serialize>(
    state: &AppState,
    session: &Session,
    result: Result<Json<T>, ApiError>,
) -> Response {
    session
        .attach_cookie(&state.config.session, result.into_response())
        .await
}

/// Payload handed to error events: the upstream body when there is one.
fn error_payload(err: &AuthArmorError) -> Value {
    err.upstream_body()
        .cloned()
        .unwrap_or_else(|| json!({ "errorMessage": err.to_string() }))
}

#[derive(OpenApi)]
#[openapi(
    paths(
        invites::create_invite,
        invites::confirm_invite,
        auth::authenticate,
        users::get_current_user,
        users::logout
    ),
    components(schemas(InviteBody, InviteConfirmBody, AuthBody, LogoutResponse)),
    tags(
        (name = "Invites", description = "Invite generation and confirmation"),
        (name = "Auth", description = "Passwordless login"),
        (name = "Session", description = "Current user and logout")
    )
)]
pub struct ApiDoc;
