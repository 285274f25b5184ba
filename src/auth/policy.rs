// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authorization policy.
//!
//! | Operation | Allowed for |
//! |-----------|-------------|
//! | `CreateUser` | admin, or a request whose `user_id` is the caller |
//! | `CreateCard` | admin, or a request whose `user_id` is the caller |
//! | `AccessCard` | admin, or the owner of the stored card |
//! | `AccessUser` | admin, or the user itself |
//! | `AdminOnly` | admin |
//!
//! Every rule fails closed: an anonymous caller, a missing request or a
//! card that does not exist is denied, never reported as not found.

use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use super::AuthenticatedUser;
use crate::error::{ServiceError, ServiceResult};
use crate::models::{CreateCardRequest, CreateUserRequest};
use crate::storage::{CardStore, StoreError};

/// An operation that needs an access decision.
#[derive(Debug, Clone, Copy)]
pub enum Operation<'a> {
    CreateUser(Option<&'a CreateUserRequest>),
    CreateCard(Option<&'a CreateCardRequest>),
    /// Read or delete a card.
    AccessCard(Uuid),
    /// Read, update or delete a user.
    AccessUser(&'a str),
    /// Listing users or cards, searching users by email.
    AdminOnly,
}

/// Evaluates [`Operation`]s for a caller.
#[derive(Clone)]
pub struct AccessPolicy {
    cards: Arc<dyn CardStore>,
}

impl AccessPolicy {
    pub fn new(cards: Arc<dyn CardStore>) -> Self {
        Self { cards }
    }

    /// Allow or deny `operation` for `caller`.
    ///
    /// # Errors
    /// - [`ServiceError::AccessDenied`] when the rule does not hold
    /// - [`ServiceError::Store`] if the card lookup fails
    pub async fn authorize(
        &self,
        caller: Option<&AuthenticatedUser>,
        operation: Operation<'_>,
    ) -> ServiceResult<()> {
        let allowed = self.evaluate(caller, operation).await?;
        debug!(
            caller = caller.map(|c| c.user_id.as_str()).unwrap_or("anonymous"),
            ?operation,
            allowed,
            "Access decision"
        );

        if allowed {
            Ok(())
        } else {
            Err(ServiceError::access_denied(denial_message(operation)))
        }
    }

    async fn evaluate(
        &self,
        caller: Option<&AuthenticatedUser>,
        operation: Operation<'_>,
    ) -> ServiceResult<bool> {
        let Some(caller) = caller else {
            return Ok(false);
        };
        if caller.is_admin() {
            return Ok(true);
        }

        let allowed = match operation {
            Operation::CreateUser(request) => {
                request.is_some_and(|r| r.user_id == caller.user_id)
            }
            Operation::CreateCard(request) => {
                request.is_some_and(|r| r.user_id == caller.user_id)
            }
            Operation::AccessCard(card_id) => match self.cards.find_by_id(card_id).await {
                Ok(record) => {
                    record.is_some_and(|record| record.owner.user_id == caller.user_id)
                }
                // A card whose owner row is gone has no owner to match
                Err(StoreError::MissingRecord { .. }) => false,
                Err(e) => return Err(e.into()),
            },
            Operation::AccessUser(user_id) => user_id == caller.user_id,
            Operation::AdminOnly => false,
        };
        Ok(allowed)
    }
}

fn denial_message(operation: Operation<'_>) -> &'static str {
    match operation {
        Operation::CreateUser(_) => "You do not have rights to create a user with an id other than yours",
        Operation::CreateCard(_) => "You do not have rights to create a card for another user",
        Operation::AccessCard(_) => "You do not have rights to access this card",
        Operation::AccessUser(_) => "You do not have rights to access this user",
        Operation::AdminOnly => "Administrator rights required",
    }
}
