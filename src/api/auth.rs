// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Passwordless login.
//!
//! The `authRequest` validator resolves the nickname sent to Auth Armor,
//! then the `response_message` of the auth result selects the event:
//!
//! | `response_message` | Event | Status |
//! |--------------------|-------|--------|
//! | `Success` | `authSuccess` | 200 |
//! | `Declined` | `authDeclined` | 200 |
//! | `Timeout` | `authTimeout` | 200 |
//! | anything else | `authError` | 400 |
//!
//! Declined and timed-out requests still answer 200 with the raw payload;
//! clients read `response_message` themselves.

use axum::{extract::State, http::StatusCode, response::Response, Json};
use serde_json::Value;
use tracing::{info, warn};

use super::{body::JsonBody, finish};
use crate::{
    error::ApiError,
    hooks::{Event, ValidatorInput},
    models::{AuthBody, AuthOutcome},
    providers::autharmor::AuthRequest,
    session::Session,
    state::AppState,
};

#[utoipa::path(
    post,
    path = "/auth/autharmor/auth",
    request_body = AuthBody,
    tag = "Auth",
    responses(
        (status = 200, description = "Auth payload; inspect response_message"),
        (status = 400, description = "Rejected by the authRequest validator or by Auth Armor"),
        (status = 401, description = "Token exchange failed")
    )
)]
pub async fn authenticate(
    State(state): State<AppState>,
    session: Session,
    JsonBody(body): JsonBody<AuthBody>,
) -> Response {
    let result = login(&state, &session, body).await;
    finish(&state, &session, result).await
}

async fn login(
    state: &AppState,
    session: &Session,
    body: AuthBody,
) -> Result<Json<Value>, ApiError> {
    let token = state
        .client
        .access_token()
        .await
        .map_err(|e| ApiError::from_remote(e, StatusCode::UNAUTHORIZED))?;

    let resolved = state
        .hooks
        .run_validator(
            ValidatorInput::AuthRequest {
                nickname: body.username.clone(),
            },
            session,
        )
        .await?;
    let nickname = resolved.nickname.unwrap_or(body.username);
    let metadata = resolved.metadata;

    let settings = &state.config.auth;
    let request = AuthRequest {
        nickname: &nickname,
        action_name: &settings.action_name,
        short_msg: &settings.short_msg,
        timeout_in_seconds: settings.timeout_in_seconds,
    };

    let auth = match state.client.request_auth(&token, &request).await {
        Ok(auth) => auth,
        Err(err) => {
            if let Some(error) = err.upstream_body() {
                state
                    .hooks
                    .emit(
                        Event::AuthError {
                            error: error.clone(),
                            nickname,
                        },
                        session,
                    )
                    .await;
            }
            return Err(ApiError::from_remote(err, StatusCode::BAD_REQUEST));
        }
    };

    match AuthOutcome::from_payload(&auth) {
        AuthOutcome::Success => {
            info!(nickname = %nickname, "Auth request approved");
            state
                .hooks
                .emit(
                    Event::AuthSuccess {
                        auth: auth.clone(),
                        metadata,
                        nickname,
                    },
                    session,
                )
                .await;
            Ok(Json(auth))
        }
        AuthOutcome::Declined => {
            state
                .hooks
                .emit(
                    Event::AuthDeclined {
                        auth: auth.clone(),
                        metadata,
                        nickname: nickname.clone(),
                    },
                    session,
                )
                .await;
            warn!(nickname = %nickname, "Auth request declined");
            Ok(Json(auth))
        }
        AuthOutcome::Timeout => {
            state
                .hooks
                .emit(
                    Event::AuthTimeout {
                        auth: auth.clone(),
                        metadata,
                        nickname: nickname.clone(),
                    },
                    session,
                )
                .await;
            warn!(nickname = %nickname, "Auth request timed out");
            Ok(Json(auth))
        }
        AuthOutcome::Unrecognized(message) => {
            warn!(
                nickname = %nickname,
                response_message = ?message,
                "Auth request returned an unrecognized response"
            );
            state
                .hooks
                .emit(
                    Event::AuthError {
                        error: auth.clone(),
                        nickname,
                    },
                    session,
                )
                .await;
            Err(ApiError::Upstream {
                status: StatusCode::BAD_REQUEST,
                body: auth,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{router, test_support::*};
    use crate::error::Rejection;
    use crate::hooks::{event_handler, validator, ValidatorOutput};
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const AUTH: &str = "/auth/autharmor/auth";

    async fn mock_auth_result(server: &MockServer, nickname: &str, result: Value) {
        Mock::given(method("POST"))
            .and(path("/auth/request"))
            .and(body_partial_json(json!({
                "nickname": nickname,
                "action_name": "Login",
                "short_msg": "Login request",
                "timeout_in_seconds": 60
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(result))
            .expect(1)
            .mount(server)
            .await;
    }

    fn remap_validator() -> crate::hooks::ValidatorFn {
        validator(|input, _| async move {
            Ok(ValidatorOutput::nickname(format!("aa-{}", input.nickname()))
                .with_metadata(json!({ "userId": 7 })))
        })
    }

    #[tokio::test]
    async fn success_fires_only_auth_success_with_resolved_nickname() {
        let server = MockServer::start().await;
        mock_token(&server).await;
        let auth = json!({ "auth_request_id": "req-1", "response_message": "Success" });
        mock_auth_result(&server, "aa-alice", auth.clone()).await;

        let state = test_state(&server);
        state.hooks.validate("authRequest", remap_validator()).unwrap();
        let events = record_all_events(&state);

        let response = post_json(router(state), AUTH, json!({ "username": "alice" })).await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body, auth);
        assert_eq!(
            events.lock().unwrap().as_slice(),
            &[Event::AuthSuccess {
                auth,
                metadata: Some(json!({ "userId": 7 })),
                nickname: "aa-alice".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn declined_still_answers_200_with_raw_payload() {
        let server = MockServer::start().await;
        mock_token(&server).await;
        let auth = json!({ "auth_request_id": "req-2", "response_message": "Declined" });
        mock_auth_result(&server, "alice", auth.clone()).await;

        let state = test_state(&server);
        let events = record_all_events(&state);

        let response = post_json(router(state), AUTH, json!({ "username": "alice" })).await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body, auth);
        assert_eq!(
            events.lock().unwrap().as_slice(),
            &[Event::AuthDeclined {
                auth,
                metadata: None,
                nickname: "alice".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn timeout_fires_auth_timeout() {
        let server = MockServer::start().await;
        mock_token(&server).await;
        let auth = json!({ "response_message": "Timeout" });
        mock_auth_result(&server, "alice", auth.clone()).await;

        let state = test_state(&server);
        let events = record_all_events(&state);

        let response = post_json(router(state), AUTH, json!({ "username": "alice" })).await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body, auth);
        assert_eq!(
            events.lock().unwrap().as_slice(),
            &[Event::AuthTimeout {
                auth,
                metadata: None,
                nickname: "alice".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn outcome_match_is_case_sensitive() {
        let server = MockServer::start().await;
        mock_token(&server).await;
        let auth = json!({ "auth_request_id": "req-3", "response_message": "success" });
        mock_auth_result(&server, "alice", auth.clone()).await;

        let state = test_state(&server);
        let events = record_all_events(&state);

        let response = post_json(router(state), AUTH, json!({ "username": "alice" })).await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(response.body, auth);
        assert!(response.cookie().is_none());
        assert_eq!(
            events.lock().unwrap().as_slice(),
            &[Event::AuthError {
                error: auth,
                nickname: "alice".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn each_request_fetches_a_fresh_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/connect/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": TEST_TOKEN,
                "token_type": "Bearer",
                "expires_in": 3600
            })))
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/auth/request"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "response_message": "Success" })),
            )
            .expect(2)
            .mount(&server)
            .await;

        let app = router(test_state(&server));
        for _ in 0..2 {
            let response = post_json(app.clone(), AUTH, json!({ "username": "alice" })).await;
            assert_eq!(response.status, StatusCode::OK);
        }
        server.verify().await;
    }

    #[tokio::test]
    async fn unrecognized_response_maps_to_auth_error() {
        let server = MockServer::start().await;
        mock_token(&server).await;
        let auth = json!({ "response_message": "Pending" });
        mock_auth_result(&server, "alice", auth.clone()).await;

        let state = test_state(&server);
        let events = record_all_events(&state);

        let response = post_json(router(state), AUTH, json!({ "username": "alice" })).await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(response.body, auth);
        assert_eq!(
            events.lock().unwrap().as_slice(),
            &[Event::AuthError {
                error: auth,
                nickname: "alice".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn validator_rejection_skips_remote_call_and_events() {
        let server = MockServer::start().await;
        mock_token(&server).await;
        Mock::given(method("POST"))
            .and(path("/auth/request"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(0)
            .mount(&server)
            .await;

        let state = test_state(&server);
        state
            .hooks
            .validate(
                "authRequest",
                validator(|_, _| async { Err(Rejection::new("Unknown user").with_code(404)) }),
            )
            .unwrap();
        let events = record_all_events(&state);

        let response = post_json(router(state), AUTH, json!({ "username": "alice" })).await;
        assert_eq!(response.status, StatusCode::NOT_FOUND);
        assert_eq!(
            response.body,
            json!({ "errorMessage": "Unknown user", "errorCode": 404 })
        );
        assert!(events.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn upstream_failure_fires_auth_error_and_answers_400() {
        let server = MockServer::start().await;
        mock_token(&server).await;
        let upstream = json!({ "errorCode": 1102, "errorMessage": "Nickname not registered" });
        Mock::given(method("POST"))
            .and(path("/auth/request"))
            .respond_with(ResponseTemplate::new(404).set_body_json(upstream.clone()))
            .mount(&server)
            .await;

        let state = test_state(&server);
        let events = record_all_events(&state);

        let response = post_json(router(state), AUTH, json!({ "username": "alice" })).await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(response.body, upstream);
        assert_eq!(
            events.lock().unwrap().as_slice(),
            &[Event::AuthError {
                error: upstream,
                nickname: "alice".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn token_failure_answers_401_without_events() {
        let server = MockServer::start().await;
        mock_token_failure(&server, json!({ "error": "invalid_client" })).await;

        let state = test_state(&server);
        let events = record_all_events(&state);
        let response = post_json(router(state), AUTH, json!({ "username": "alice" })).await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED);
        assert!(events.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn success_handler_session_is_visible_to_me_route() {
        let server = MockServer::start().await;
        mock_token(&server).await;
        mock_auth_result(&server, "alice", json!({ "response_message": "Success" })).await;

        let mut config = test_config(&server);
        config.get_user = Some(crate::hooks::get_user(|session: Session| async move {
            session.user().await.ok_or_else(|| Rejection::new("no user"))
        }));
        let state = AppState::new(
            config,
            Some(std::sync::Arc::new(crate::store::InMemorySessionStore::new())),
        );
        state
            .hooks
            .on(
                "authSuccess",
                event_handler(|event, session| async move {
                    if let Event::AuthSuccess { nickname, .. } = event {
                        session.save(json!({ "nickname": nickname })).await.unwrap();
                    }
                }),
            )
            .unwrap();
        let app = router(state);

        let login = post_json(app.clone(), AUTH, json!({ "username": "alice" })).await;
        let cookie = login.cookie().expect("session cookie issued");

        let me = get(app, "/auth/autharmor/me", Some(&cookie)).await;
        assert_eq!(me.status, StatusCode::OK);
        assert_eq!(me.body, json!({ "nickname": "alice" }));
    }

    #[tokio::test]
    async fn login_replaces_session_id_sent_by_client() {
        use crate::session::SessionStore;

        let server = MockServer::start().await;
        mock_token(&server).await;
        mock_auth_result(&server, "alice", json!({ "response_message": "Success" })).await;

        let store = std::sync::Arc::new(crate::store::InMemorySessionStore::new());
        store
            .save("planted-sid", &json!({ "nickname": "mallory" }))
            .await
            .unwrap();

        let mut config = test_config(&server);
        config.get_user = Some(crate::hooks::get_user(|session: Session| async move {
            session
                .user()
                .await
                .ok_or_else(|| Rejection::new("no user").with_code(401))
        }));
        let state = AppState::new(config, Some(store.clone() as std::sync::Arc<dyn SessionStore>));
        state
            .hooks
            .on(
                "authSuccess",
                event_handler(|event, session| async move {
                    if let Event::AuthSuccess { nickname, .. } = event {
                        session.save(json!({ "nickname": nickname })).await.unwrap();
                    }
                }),
            )
            .unwrap();
        let app = router(state);

        let planted = "autharmor.sid=planted-sid";
        let login = post_json_with_cookie(
            app.clone(),
            AUTH,
            json!({ "username": "alice" }),
            Some(planted),
        )
        .await;
        assert_eq!(login.status, StatusCode::OK);
        let cookie = login.cookie().expect("fresh session cookie issued");
        assert_ne!(cookie, planted);
        assert_eq!(store.load("planted-sid").await.unwrap(), None);

        let stale = get(app.clone(), "/auth/autharmor/me", Some(planted)).await;
        assert_eq!(stale.status, StatusCode::UNAUTHORIZED);

        let me = get(app, "/auth/autharmor/me", Some(&cookie)).await;
        assert_eq!(me.status, StatusCode::OK);
        assert_eq!(me.body, json!({ "nickname": "alice" }));
    }
}
