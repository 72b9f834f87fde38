// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::config::Config;
use crate::hooks::HookRegistry;
use crate::providers::AuthArmorClient;
use crate::session::SessionStore;

/// Shared by every route of one router instance.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub client: AuthArmorClient,
    pub hooks: Arc<HookRegistry>,
    pub sessions: Option<Arc<dyn SessionStore>>,
}

impl AppState {
    pub fn new(config: Config, sessions: Option<Arc<dyn SessionStore>>) -> Self {
        let client = AuthArmorClient::new(
            config.api_base_url.clone(),
            config.auth_base_url.clone(),
            config.client_id.clone(),
            config.client_secret.clone(),
        );
        Self {
            config: Arc::new(config),
            client,
            hooks: Arc::new(HookRegistry::new()),
            sessions,
        }
    }
}
