// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Reference server: the Auth Armor routes backed by an in-memory session
//! store, with a login handler that keeps the nickname in the session.

use std::{env, net::SocketAddr, sync::Arc, time::Duration};

use autharmor_router::{
    api::ApiDoc,
    config::{HOST_ENV, LOG_FORMAT_ENV, PORT_ENV, TLS_CERT_PATH_ENV, TLS_KEY_PATH_ENV},
    hooks::get_user,
    AuthArmor, Config, Event, InMemorySessionStore, Rejection, Session,
};
use axum::Router;
use axum_server::{tls_rustls::RustlsConfig, Handle};
use serde_json::json;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() {
    init_tracing();

    // Install the ring crypto provider for rustls (must be done before any TLS operations)
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    let config = Config::from_env().with_get_user(get_user(|session: Session| async move {
        session
            .user()
            .await
            .ok_or_else(|| Rejection::new("No user in session").with_code(401))
    }));

    let armor = AuthArmor::new(config)
        .expect("Invalid Auth Armor configuration")
        .with_session_store(Arc::new(InMemorySessionStore::new()));

    armor
        .on("authSuccess", |event, session| async move {
            if let Event::AuthSuccess {
                nickname, metadata, ..
            } = event
            {
                let user = json!({ "nickname": nickname, "metadata": metadata });
                if let Err(err) = session.save(user).await {
                    warn!(error = %err, "Failed to persist login in session");
                }
            }
        })
        .expect("authSuccess is a known event");

    let app = armor
        .mount(Router::new())
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http());

    let host = env::var(HOST_ENV).unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = env::var(PORT_ENV)
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);
    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .expect("Failed to parse bind address");

    let handle = Handle::new();
    tokio::spawn(shutdown_signal(handle.clone()));

    let routes = armor.routes();
    info!(
        %addr,
        invite = %routes.invite,
        auth = %routes.auth,
        me = %routes.me,
        "Auth Armor router listening (docs at /docs)"
    );

    let tls_paths = (env::var(TLS_CERT_PATH_ENV).ok(), env::var(TLS_KEY_PATH_ENV).ok());
    let served = match tls_paths {
        (Some(cert), Some(key)) => {
            let tls_config = RustlsConfig::from_pem_file(cert, key)
                .await
                .expect("Failed to load TLS certificate and key");
            info!("Serving HTTPS");
            axum_server::bind_rustls(addr, tls_config)
                .handle(handle)
                .serve(app.into_make_service())
                .await
        }
        _ => {
            axum_server::bind(addr)
                .handle(handle)
                .serve(app.into_make_service())
                .await
        }
    };
    served.expect("Server failed");
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));
    let json = env::var(LOG_FORMAT_ENV)
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn shutdown_signal(handle: Handle<SocketAddr>) {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "Failed to listen for shutdown signal");
        return;
    }
    info!("Shutdown signal received, draining connections");
    handle.graceful_shutdown(Some(Duration::from_secs(10)));
}
