// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Card service.
//!
//! A user's cached snapshot embeds its cards, so every card write evicts the
//! owner's coherence group after the store write succeeded.

use std::sync::Arc;

use uuid::Uuid;

use super::UserService;
use crate::error::{ServiceError, ServiceResult};
use crate::logging::OperationLog;
use crate::models::{CardResponse, CreateCardRequest};
use crate::storage::{paged, CardPages, CardStore, NewCard, Page, PageRequest};

#[derive(Clone)]
pub struct CardService {
    cards: Arc<dyn CardStore>,
    users: UserService,
    log: OperationLog,
}

impl CardService {
    pub fn new(cards: Arc<dyn CardStore>, users: UserService, log: OperationLog) -> Self {
        Self { cards, users, log }
    }

    /// Create a card for an existing user.
    ///
    /// # Errors
    /// - [`ServiceError::AlreadyExists`] if the number is taken
    /// - [`ServiceError::NotFound`] if the owning user does not exist
    pub async fn create(&self, request: CreateCardRequest) -> ServiceResult<CardResponse> {
        self.log
            .run("CardService::create", &request, async {
                if self.cards.exists_by_number(&request.number).await? {
                    return Err(ServiceError::already_exists("card", request.number.clone()));
                }

                let owner = self.users.find_entity(&request.user_id).await?;
                let card = self
                    .cards
                    .save(NewCard {
                        owner_id: owner.id,
                        number: request.number.clone(),
                        holder: request.holder.clone(),
                        expiration_date: request.expiration_date,
                    })
                    .await?;

                self.users.evict(&owner).await?;
                Ok(CardResponse::for_owner(card, &owner.user_id))
            })
            .await
    }

    pub async fn get_by_id(&self, id: Uuid) -> ServiceResult<CardResponse> {
        self.log
            .run("CardService::get_by_id", id, async {
                self.cards
                    .find_by_id(id)
                    .await?
                    .map(CardResponse::from)
                    .ok_or_else(|| ServiceError::not_found("card", id.to_string()))
            })
            .await
    }

    /// One page of cards, each with its owner's business id.
    pub async fn get_all_paged(&self, page: PageRequest) -> ServiceResult<Page<CardResponse>> {
        self.log
            .run("CardService::get_all_paged", page, async {
                let source = CardPages(self.cards.as_ref());
                Ok(paged(&source, page, CardResponse::from).await?)
            })
            .await
    }

    /// Delete a card. The owner is kept.
    pub async fn delete(&self, id: Uuid) -> ServiceResult<()> {
        self.log
            .run("CardService::delete", id, async {
                let record = self
                    .cards
                    .find_by_id(id)
                    .await?
                    .ok_or_else(|| ServiceError::not_found("card", id.to_string()))?;

                self.cards.delete(id).await?;
                self.users.evict(&record.owner).await
            })
            .await
    }
}
