// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Shared fixtures for route tests: a mocked Auth Armor API and helpers to
//! drive the router without binding a socket.

use std::sync::{Arc, Mutex};

use axum::{
    body::{to_bytes, Body},
    http::{header::COOKIE, HeaderMap, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::config::Config;
use crate::hooks::{event_handler, Event, EventFn};
use crate::state::AppState;
use crate::store::InMemorySessionStore;

pub(crate) const TEST_TOKEN: &str = "test-token";

pub(crate) fn test_config(server: &MockServer) -> Config {
    Config::new("client-id", "client-secret")
        .with_api_base_url(server.uri())
        .with_auth_base_url(server.uri())
}

pub(crate) fn test_state(server: &MockServer) -> AppState {
    AppState::new(
        test_config(server),
        Some(Arc::new(InMemorySessionStore::new())),
    )
}

pub(crate) async fn mock_token(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/connect/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": TEST_TOKEN,
            "token_type": "Bearer",
            "expires_in": 3600
        })))
        .mount(server)
        .await;
}

pub(crate) async fn mock_token_failure(server: &MockServer, body: Value) {
    Mock::given(method("POST"))
        .and(path("/connect/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(body))
        .mount(server)
        .await;
}

pub(crate) struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    /// `name=value` pair from the first `Set-Cookie` header.
    pub fn cookie(&self) -> Option<String> {
        let header = self.headers.get("set-cookie")?.to_str().ok()?;
        header.split(';').next().map(str::to_string)
    }
}

async fn send(app: Router, request: Request<Body>) -> TestResponse {
    let response = app.oneshot(request).await.expect("router is infallible");
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    TestResponse {
        status,
        headers,
        body,
    }
}

pub(crate) async fn post_json(app: Router, uri: &str, body: Value) -> TestResponse {
    post_json_with_cookie(app, uri, body, None).await
}

pub(crate) async fn post_json_with_cookie(
    app: Router,
    uri: &str,
    body: Value,
    cookie: Option<&str>,
) -> TestResponse {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(COOKIE, cookie);
    }
    send(app, builder.body(Body::from(body.to_string())).unwrap()).await
}

pub(crate) async fn get(app: Router, uri: &str, cookie: Option<&str>) -> TestResponse {
    let mut builder = Request::builder().method(Method::GET).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(COOKIE, cookie);
    }
    send(app, builder.body(Body::empty()).unwrap()).await
}

/// Event handler that appends every event it sees to `log`.
pub(crate) fn recording_handler(log: Arc<Mutex<Vec<Event>>>) -> EventFn {
    event_handler(move |event, _| {
        let log = log.clone();
        async move {
            log.lock().unwrap().push(event);
        }
    })
}

/// Record every event fired on `state`.
pub(crate) fn record_all_events(state: &AppState) -> Arc<Mutex<Vec<Event>>> {
    let log = Arc::new(Mutex::new(Vec::new()));
    for hook in crate::hooks::HookName::EVENTS {
        state
            .hooks
            .on(hook.as_str(), recording_handler(log.clone()))
            .unwrap();
    }
    log
}
