// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Current-user and logout endpoints.

use axum::{extract::State, http::StatusCode, response::Response, Json};
use serde_json::Value;
use tracing::info;

use super::finish;
use crate::{
    error::{ApiError, ConfigError},
    models::LogoutResponse,
    session::Session,
    state::AppState,
};

/// Return the user resolved by the host's `getUser` callback.
#[utoipa::path(
    get,
    path = "/auth/autharmor/me",
    tag = "Session",
    responses(
        (status = 200, description = "User object from getUser"),
        (status = 401, description = "No active session"),
        (status = 500, description = "No getUser callback configured")
    )
)]
pub async fn get_current_user(State(state): State<AppState>, session: Session) -> Response {
    let result = current_user(&state, &session).await;
    finish(&state, &session, result).await
}

async fn current_user(state: &AppState, session: &Session) -> Result<Json<Value>, ApiError> {
    let get_user = state
        .config
        .get_user
        .clone()
        .ok_or(ConfigError::MissingGetUser)?;

    if !session.is_active().await {
        return Err(ApiError::unauthorized("No active session"));
    }

    let user = get_user(session.clone()).await?;
    Ok(Json(user))
}

#[utoipa::path(
    get,
    path = "/auth/autharmor/logout",
    tag = "Session",
    responses(
        (status = 200, description = "Session destroyed", body = LogoutResponse),
        (status = 401, description = "Session cannot be destroyed")
    )
)]
pub async fn logout(State(state): State<AppState>, session: Session) -> Response {
    let result = end_session(&session).await;
    finish(&state, &session, result).await
}

async fn end_session(session: &Session) -> Result<Json<LogoutResponse>, ApiError> {
    if !session.can_destroy() {
        return Err(ApiError::unauthorized("Session does not support logout"));
    }
    session
        .clear()
        .await
        .map_err(|e| ApiError::new(StatusCode::BAD_REQUEST, e.to_string()))?;
    info!("Session destroyed");
    Ok(Json(LogoutResponse {
        message: "Successfully logged out".to_string(),
    }))
}
