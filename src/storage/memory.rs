// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory store implementing both persistence ports.
//!
//! Enforces the same unique constraints a relational schema would
//! (`user_id`, `email`, card `number`), cascades user deletion to owned
//! cards and returns bulk lookups in hash order, like an unordered
//! `WHERE id IN (...)`.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    Card, CardRecord, CardStore, NewCard, NewUser, PageRequest, StoreError, StoreResult, User,
    UserFields, UserRecord, UserStore,
};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    /// Insertion order of user ids.
    user_order: Vec<Uuid>,
    cards: HashMap<Uuid, Card>,
    /// Insertion order of card ids.
    card_order: Vec<Uuid>,
}

impl Tables {
    fn user_by<'a>(&'a self, predicate: impl Fn(&User) -> bool) -> Option<&'a User> {
        self.users.values().find(|user| predicate(user))
    }

    fn cards_of(&self, owner_id: Uuid) -> Vec<Card> {
        self.card_order
            .iter()
            .filter_map(|id| self.cards.get(id))
            .filter(|card| card.owner_id == owner_id)
            .cloned()
            .collect()
    }

    fn user_record(&self, user: &User) -> UserRecord {
        UserRecord {
            user: user.clone(),
            cards: self.cards_of(user.id),
        }
    }

    fn card_record(&self, card: &Card) -> StoreResult<CardRecord> {
        let owner = self
            .users
            .get(&card.owner_id)
            .ok_or(StoreError::MissingRecord {
                entity: "user",
                id: card.owner_id,
            })?;
        Ok(CardRecord {
            card: card.clone(),
            owner: owner.clone(),
        })
    }

    fn ensure_email_free(&self, email: &str, except: Option<Uuid>) -> StoreResult<()> {
        let taken = self
            .user_by(|user| user.email == email && Some(user.id) != except)
            .is_some();
        if taken {
            return Err(StoreError::UniqueViolation {
                entity: "user",
                field: "email",
                value: email.to_string(),
            });
        }
        Ok(())
    }
}

fn page_window(order: &[Uuid], page: PageRequest) -> (Vec<Uuid>, u64) {
    let total = order.len() as u64;
    let ids = usize::try_from(page.offset())
        .map(|offset| {
            order
                .iter()
                .skip(offset)
                .take(page.size() as usize)
                .copied()
                .collect()
        })
        .unwrap_or_default();
    (ids, total)
}

/// Store backed by process memory.
#[derive(Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<UserRecord>> {
        let tables = self.tables.read().await;
        Ok(tables.users.get(&id).map(|user| tables.user_record(user)))
    }

    async fn find_by_user_id(&self, user_id: &str) -> StoreResult<Option<UserRecord>> {
        let tables = self.tables.read().await;
        Ok(tables
            .user_by(|user| user.user_id == user_id)
            .map(|user| tables.user_record(user)))
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<UserRecord>> {
        let tables = self.tables.read().await;
        Ok(tables
            .user_by(|user| user.email == email)
            .map(|user| tables.user_record(user)))
    }

    async fn exists_by_user_id(&self, user_id: &str) -> StoreResult<bool> {
        let tables = self.tables.read().await;
        Ok(tables.user_by(|user| user.user_id == user_id).is_some())
    }

    async fn exists_by_email(&self, email: &str) -> StoreResult<bool> {
        let tables = self.tables.read().await;
        Ok(tables.user_by(|user| user.email == email).is_some())
    }

    async fn save(&self, new_user: NewUser) -> StoreResult<User> {
        let mut tables = self.tables.write().await;

        if tables.user_by(|user| user.user_id == new_user.user_id).is_some() {
            return Err(StoreError::UniqueViolation {
                entity: "user",
                field: "user_id",
                value: new_user.user_id,
            });
        }
        tables.ensure_email_free(&new_user.email, None)?;

        let user = User {
            id: Uuid::new_v4(),
            user_id: new_user.user_id,
            name: new_user.name,
            surname: new_user.surname,
            birth_date: new_user.birth_date,
            email: new_user.email,
        };
        tables.user_order.push(user.id);
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update(&self, id: Uuid, fields: UserFields) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        tables.ensure_email_free(&fields.email, Some(id))?;

        let user = tables
            .users
            .get_mut(&id)
            .ok_or(StoreError::MissingRecord { entity: "user", id })?;
        user.name = fields.name;
        user.surname = fields.surname;
        user.birth_date = fields.birth_date;
        user.email = fields.email;
        Ok(())
    }

    async fn delete_by_user_id(&self, user_id: &str) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        let Some(id) = tables.user_by(|user| user.user_id == user_id).map(|u| u.id) else {
            return Ok(());
        };

        tables.users.remove(&id);
        tables.user_order.retain(|existing| *existing != id);

        let owned: HashSet<Uuid> = tables
            .cards
            .values()
            .filter(|card| card.owner_id == id)
            .map(|card| card.id)
            .collect();
        tables.cards.retain(|card_id, _| !owned.contains(card_id));
        tables.card_order.retain(|card_id| !owned.contains(card_id));
        Ok(())
    }

    async fn list_ids(&self, page: PageRequest) -> StoreResult<(Vec<Uuid>, u64)> {
        let tables = self.tables.read().await;
        Ok(page_window(&tables.user_order, page))
    }

    async fn list_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<UserRecord>> {
        let wanted: HashSet<&Uuid> = ids.iter().collect();
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .filter(|user| wanted.contains(&user.id))
            .map(|user| tables.user_record(user))
            .collect())
    }
}

#[async_trait]
impl CardStore for InMemoryStore {
    async fn exists_by_number(&self, number: &str) -> StoreResult<bool> {
        let tables = self.tables.read().await;
        Ok(tables.cards.values().any(|card| card.number == number))
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<CardRecord>> {
        let tables = self.tables.read().await;
        tables
            .cards
            .get(&id)
            .map(|card| tables.card_record(card))
            .transpose()
    }

    async fn save(&self, new_card: NewCard) -> StoreResult<Card> {
        let mut tables = self.tables.write().await;

        if !tables.users.contains_key(&new_card.owner_id) {
            return Err(StoreError::MissingRecord {
                entity: "user",
                id: new_card.owner_id,
            });
        }
        if tables.cards.values().any(|card| card.number == new_card.number) {
            return Err(StoreError::UniqueViolation {
                entity: "card",
                field: "number",
                value: new_card.number,
            });
        }

        let card = Card {
            id: Uuid::new_v4(),
            owner_id: new_card.owner_id,
            number: new_card.number,
            holder: new_card.holder,
            expiration_date: new_card.expiration_date,
        };
        tables.card_order.push(card.id);
        tables.cards.insert(card.id, card.clone());
        Ok(card)
    }

    async fn delete(&self, id: Uuid) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        if tables.cards.remove(&id).is_some() {
            tables.card_order.retain(|existing| *existing != id);
        }
        Ok(())
    }

    async fn list_ids(&self, page: PageRequest) -> StoreResult<(Vec<Uuid>, u64)> {
        let tables = self.tables.read().await;
        Ok(page_window(&tables.card_order, page))
    }

    async fn list_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<CardRecord>> {
        let wanted: HashSet<&Uuid> = ids.iter().collect();
        let tables = self.tables.read().await;
        tables
            .cards
            .values()
            .filter(|card| wanted.contains(&card.id))
            .map(|card| tables.card_record(card))
            .collect()
    }
}
