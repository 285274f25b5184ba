// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request and response structures exchanged with transports. All types
//! derive `Serialize`, `Deserialize` and `ToSchema` so that any transport can
//! encode them and publish an OpenAPI description.
//!
//! ## Model Categories
//!
//! - **Users**: create / sparse update requests and the cached user projection
//! - **Cards**: create request and card projection
//!
//! `UserResponse` is also the snapshot type stored in the user cache, so it
//! embeds the user's cards.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{ServiceError, ServiceResult};
use crate::storage::{Card, CardRecord, UserRecord};

/// ISO calendar date format accepted by [`parse_date`].
const DATE_FORMAT: &str = "%Y-%m-%d";

// =============================================================================
// User Models
// =============================================================================

/// Request to create a user.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct CreateUserRequest {
    /// Business identifier, chosen by the identity provider (token `sub`).
    pub user_id: String,
    pub name: String,
    pub surname: String,
    pub birth_date: NaiveDate,
    pub email: String,
}

/// Sparse update of a user. Absent fields keep their stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct UpdateUserRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// User projection returned to clients and stored in the cache.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct UserResponse {
    pub user_id: String,
    pub name: String,
    pub surname: String,
    pub birth_date: NaiveDate,
    pub email: String,
    /// Cards owned by the user.
    pub cards: Vec<CardResponse>,
}

impl From<UserRecord> for UserResponse {
    fn from(record: UserRecord) -> Self {
        let UserRecord { user, cards } = record;
        let cards = cards
            .into_iter()
            .map(|card| CardResponse::for_owner(card, &user.user_id))
            .collect();

        Self {
            user_id: user.user_id,
            name: user.name,
            surname: user.surname,
            birth_date: user.birth_date,
            email: user.email,
            cards,
        }
    }
}

// =============================================================================
// Card Models
// =============================================================================

/// Request to create a card for an existing user.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct CreateCardRequest {
    /// Business identifier of the owning user.
    pub user_id: String,
    pub number: String,
    pub holder: String,
    pub expiration_date: NaiveDate,
}

/// Card projection.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct CardResponse {
    pub id: Uuid,
    /// Business identifier of the owning user.
    pub user_id: String,
    pub number: String,
    pub holder: String,
    pub expiration_date: NaiveDate,
}

impl CardResponse {
    /// Project a card whose owner's business id is already known.
    pub fn for_owner(card: Card, owner_user_id: &str) -> Self {
        Self {
            id: card.id,
            user_id: owner_user_id.to_string(),
            number: card.number,
            holder: card.holder,
            expiration_date: card.expiration_date,
        }
    }
}

impl From<CardRecord> for CardResponse {
    fn from(record: CardRecord) -> Self {
        Self::for_owner(record.card, &record.owner.user_id)
    }
}

/// Parse an ISO `YYYY-MM-DD` date coming from an untyped transport field.
///
/// # Errors
/// Returns [`ServiceError::InvalidInput`] naming the field when the value is
/// not a valid calendar date.
pub fn parse_date(field: &str, value: &str) -> ServiceResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| {
        ServiceError::invalid_input(format!(
            "Invalid date format for '{field}'. Use YYYY-MM-DD."
        ))
    })
}
