// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Invite generation and confirmation.

use axum::{extract::State, http::StatusCode, response::Response, Json};
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use super::{body::JsonBody, error_payload, finish};
use crate::{
    error::ApiError,
    hooks::{Event, ValidatorInput},
    models::{InviteBody, InviteConfirmBody},
    providers::autharmor::{AuthRequest, InviteRequest},
    session::Session,
    state::AppState,
};

pub const CONFIRM_ACTION_NAME: &str = "Confirm Invite";
pub const CONFIRM_SHORT_MSG: &str = "Confirm your Auth Armor invite";

#[utoipa::path(
    post,
    path = "/auth/autharmor/invite",
    request_body = InviteBody,
    tag = "Invites",
    responses(
        (status = 200, description = "Invite payload from Auth Armor"),
        (status = 400, description = "Rejected by the inviteRequest validator or by Auth Armor"),
        (status = 401, description = "Token exchange failed")
    )
)]
pub async fn create_invite(
    State(state): State<AppState>,
    session: Session,
    JsonBody(body): JsonBody<InviteBody>,
) -> Response {
    let result = generate_invite(&state, &session, body).await;
    finish(&state, &session, result).await
}

async fn generate_invite(
    state: &AppState,
    session: &Session,
    body: InviteBody,
) -> Result<Json<Value>, ApiError> {
    let token = state
        .client
        .access_token()
        .await
        .map_err(|e| ApiError::from_remote(e, StatusCode::UNAUTHORIZED))?;

    state
        .hooks
        .run_validator(
            ValidatorInput::InviteRequest {
                nickname: body.nickname.clone(),
                reference_id: body.reference_id.clone(),
            },
            session,
        )
        .await?;

    let reference_id = body
        .reference_id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let reset_and_reinvite = body
        .reset_and_reinvite
        .unwrap_or(state.config.invite.reset_and_reinvite);

    let invite = state
        .client
        .create_invite(
            &token,
            &InviteRequest {
                nickname: &body.nickname,
                reference_id: &reference_id,
                reset_and_reinvite,
            },
        )
        .await
        .map_err(|e| ApiError::from_remote(e, StatusCode::BAD_REQUEST))?;

    info!(nickname = %body.nickname, reference_id = %reference_id, "Invite generated");

    state
        .hooks
        .emit(
            Event::InviteGenerated {
                invite: invite.clone(),
                username: body.nickname,
                reference_id,
            },
            session,
        )
        .await;

    Ok(Json(invite))
}

#[utoipa::path(
    post,
    path = "/auth/autharmor/invite/confirm",
    request_body = InviteConfirmBody,
    tag = "Invites",
    responses(
        (status = 200, description = "Auth payload for the confirmation request"),
        (status = 401, description = "Token exchange or confirmation failed")
    )
)]
pub async fn confirm_invite(
    State(state): State<AppState>,
    session: Session,
    JsonBody(body): JsonBody<InviteConfirmBody>,
) -> Response {
    let result = confirm(&state, &session, body).await;
    finish(&state, &session, result).await
}

async fn confirm(
    state: &AppState,
    session: &Session,
    body: InviteConfirmBody,
) -> Result<Json<Value>, ApiError> {
    let token = state
        .client
        .access_token()
        .await
        .map_err(|e| ApiError::from_remote(e, StatusCode::UNAUTHORIZED))?;

    let request = AuthRequest {
        nickname: &body.nickname,
        action_name: CONFIRM_ACTION_NAME,
        short_msg: CONFIRM_SHORT_MSG,
        timeout_in_seconds: state.config.auth.timeout_in_seconds,
    };

    match state.client.request_auth(&token, &request).await {
        Ok(auth) => {
            info!(nickname = %body.nickname, "Invite confirmation requested");
            state
                .hooks
                .emit(
                    Event::InviteConfirmSuccess {
                        auth: auth.clone(),
                        nickname: body.nickname,
                    },
                    session,
                )
                .await;
            Ok(Json(auth))
        }
        Err(err) => {
            warn!(nickname = %body.nickname, error = %err, "Invite confirmation failed");
            state
                .hooks
                .emit(
                    Event::InviteConfirmError {
                        error: error_payload(&err),
                        nickname: body.nickname,
                    },
                    session,
                )
                .await;
            Err(ApiError::from_remote(err, StatusCode::UNAUTHORIZED))
        }
    }
}
