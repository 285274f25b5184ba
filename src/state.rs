// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Application state shared by every request.

use std::sync::Arc;

use crate::auth::{AccessGate, AccessPolicy, AuthError, HttpTokenAuthority, TokenAuthority};
use crate::config::Settings;
use crate::logging::OperationLog;
use crate::service::{CardService, UserService};
use crate::storage::{CardStore, InMemoryStore, LruSnapshotCache, SnapshotCache, UserStore};

/// Wired services. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub users: UserService,
    pub cards: CardService,
    pub gate: AccessGate,
    pub policy: AccessPolicy,
}

impl AppState {
    /// Wire the services over the given adapters.
    pub fn new(
        settings: Settings,
        user_store: Arc<dyn UserStore>,
        card_store: Arc<dyn CardStore>,
        cache: Arc<dyn SnapshotCache>,
        authority: Arc<dyn TokenAuthority>,
    ) -> Self {
        let log = OperationLog::new(settings.operation_logging);
        let users = UserService::new(user_store, cache, settings.cache_ttl, log);
        let cards = CardService::new(card_store.clone(), users.clone(), log);

        Self {
            settings: Arc::new(settings),
            users,
            cards,
            gate: AccessGate::new(authority),
            policy: AccessPolicy::new(card_store),
        }
    }

    /// In-process store and LRU cache, HTTP token authority.
    ///
    /// # Errors
    /// Fails if the HTTP client for the authority cannot be built.
    pub fn in_memory(settings: Settings) -> Result<Self, AuthError> {
        let store = Arc::new(InMemoryStore::new());
        let cache = Arc::new(LruSnapshotCache::new(settings.cache_capacity));
        let authority = Arc::new(HttpTokenAuthority::new(
            &settings.auth_service_url,
            settings.auth_service_timeout,
        )?);

        tracing::info!(
            authority = %settings.auth_service_url,
            cache_capacity = settings.cache_capacity,
            cache_ttl_secs = settings.cache_ttl.as_secs(),
            "Initialized in-memory application state"
        );

        Ok(Self::new(settings, store.clone(), store, cache, authority))
    }
}
