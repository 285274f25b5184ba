// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Storage Ports
//!
//! This module defines the contracts the service core expects from its
//! driven adapters, plus in-process reference adapters.
//!
//! ## Ports
//!
//! - [`UserStore`] / [`CardStore`]: system of record for users and cards.
//!   Implementations MUST enforce uniqueness of `user_id`, `email` and card
//!   `number` themselves; the service pre-checks are only an optimization.
//! - [`SnapshotCache`]: advisory string-keyed cache of serialized user
//!   snapshots with TTL and explicit eviction. No cross-key transactions.
//!
//! ## Relations
//!
//! Cards reference their owner by surrogate id (`Card::owner_id`). The graph
//! is never loaded implicitly: lookups that need related rows return
//! [`UserRecord`] (user + cards) or [`CardRecord`] (card + owner).

pub mod memory;
pub mod pagination;
pub mod snapshot_cache;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use memory::InMemoryStore;
pub use pagination::{paged, CardPages, Page, PageRequest, PagedSource, UserPages};
pub use snapshot_cache::{CacheError, CacheResult, LruSnapshotCache, SnapshotCache};

// =============================================================================
// Entities
// =============================================================================

/// A stored user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Storage surrogate id, assigned on save and never reused.
    pub id: Uuid,
    /// Business identifier (unique, immutable).
    pub user_id: String,
    pub name: String,
    pub surname: String,
    pub birth_date: NaiveDate,
    /// Alternate unique key.
    pub email: String,
}

/// A stored payment card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub id: Uuid,
    /// Surrogate id of the owning user.
    pub owner_id: Uuid,
    /// Unique across all cards.
    pub number: String,
    pub holder: String,
    pub expiration_date: NaiveDate,
}

/// A user with its cards eagerly attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub user: User,
    pub cards: Vec<Card>,
}

/// A card with its owner eagerly attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardRecord {
    pub card: Card,
    pub owner: User,
}

/// Insert payload for a user. The store assigns the surrogate id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub user_id: String,
    pub name: String,
    pub surname: String,
    pub birth_date: NaiveDate,
    pub email: String,
}

/// Insert payload for a card. The store assigns the surrogate id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCard {
    pub owner_id: Uuid,
    pub number: String,
    pub holder: String,
    pub expiration_date: NaiveDate,
}

/// The mutable columns of a user, written as a whole by [`UserStore::update`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserFields {
    pub name: String,
    pub surname: String,
    pub birth_date: NaiveDate,
    pub email: String,
}

impl From<&User> for UserFields {
    fn from(user: &User) -> Self {
        Self {
            name: user.name.clone(),
            surname: user.surname.clone(),
            birth_date: user.birth_date,
            email: user.email.clone(),
        }
    }
}

// =============================================================================
// Errors
// =============================================================================

/// Errors surfaced by store adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// A unique constraint rejected the write.
    #[error("{entity} {field} already taken: {value}")]
    UniqueViolation {
        entity: &'static str,
        field: &'static str,
        value: String,
    },
    /// A write referenced a row that does not exist.
    #[error("{entity} {id} does not exist")]
    MissingRecord { entity: &'static str, id: Uuid },
    /// Connectivity or other backend failure.
    #[error("store backend failure: {0}")]
    Backend(String),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

// =============================================================================
// Ports
// =============================================================================

/// Persistence port for users.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<UserRecord>>;

    async fn find_by_user_id(&self, user_id: &str) -> StoreResult<Option<UserRecord>>;

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<UserRecord>>;

    async fn exists_by_user_id(&self, user_id: &str) -> StoreResult<bool>;

    async fn exists_by_email(&self, email: &str) -> StoreResult<bool>;

    /// Insert a user, rejecting duplicate `user_id` or `email` with
    /// [`StoreError::UniqueViolation`].
    async fn save(&self, user: NewUser) -> StoreResult<User>;

    /// Overwrite the mutable columns of the user with surrogate id `id`.
    async fn update(&self, id: Uuid, fields: UserFields) -> StoreResult<()>;

    /// Delete a user and the cards it owns. Deleting an absent user is a no-op.
    async fn delete_by_user_id(&self, user_id: &str) -> StoreResult<()>;

    /// Surrogate ids of one page window in insertion order, plus the total
    /// number of users.
    async fn list_ids(&self, page: PageRequest) -> StoreResult<(Vec<Uuid>, u64)>;

    /// Users with the given ids, cards attached, one record per user. Order
    /// is unspecified.
    async fn list_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<UserRecord>>;
}

/// Persistence port for cards.
#[async_trait]
pub trait CardStore: Send + Sync {
    async fn exists_by_number(&self, number: &str) -> StoreResult<bool>;

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<CardRecord>>;

    /// Insert a card, rejecting a duplicate number with
    /// [`StoreError::UniqueViolation`] and an unknown owner with
    /// [`StoreError::MissingRecord`].
    async fn save(&self, card: NewCard) -> StoreResult<Card>;

    /// Delete a card. Never touches the owner. Deleting an absent card is a
    /// no-op.
    async fn delete(&self, id: Uuid) -> StoreResult<()>;

    async fn list_ids(&self, page: PageRequest) -> StoreResult<(Vec<Uuid>, u64)>;

    /// Cards with the given ids, owner attached. Order is unspecified.
    async fn list_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<CardRecord>>;
}
