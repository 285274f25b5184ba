// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User service: the store behind a dual-key read-through cache.
//!
//! Writes never populate the cache. They hit the store and then evict every
//! key the user was or is reachable under. Reads fill both keys from a single
//! store lookup, so a populated pair always carries the same snapshot.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use super::CoherenceGroup;
use crate::error::{ServiceError, ServiceResult};
use crate::logging::OperationLog;
use crate::models::{CreateUserRequest, UpdateUserRequest, UserResponse};
use crate::storage::{
    paged, CacheError, NewUser, Page, PageRequest, SnapshotCache, User, UserFields, UserPages,
    UserRecord, UserStore,
};

/// Which unique key a read goes through.
#[derive(Debug, Clone, Copy)]
enum Lookup<'a> {
    UserId(&'a str),
    Email(&'a str),
}

impl Lookup<'_> {
    fn cache_key(&self) -> String {
        match self {
            Lookup::UserId(user_id) => super::id_key(user_id),
            Lookup::Email(email) => super::email_key(email),
        }
    }

    fn value(&self) -> &str {
        match self {
            Lookup::UserId(value) | Lookup::Email(value) => value,
        }
    }
}

#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserStore>,
    cache: Arc<dyn SnapshotCache>,
    ttl: Duration,
    log: OperationLog,
}

impl UserService {
    pub fn new(
        users: Arc<dyn UserStore>,
        cache: Arc<dyn SnapshotCache>,
        ttl: Duration,
        log: OperationLog,
    ) -> Self {
        Self {
            users,
            cache,
            ttl,
            log,
        }
    }

    /// Create a user. Email uniqueness is checked before the business id.
    ///
    /// # Errors
    /// [`ServiceError::AlreadyExists`] naming the colliding value, including
    /// when a concurrent insert wins after the pre-checks passed.
    pub async fn create(&self, request: CreateUserRequest) -> ServiceResult<UserResponse> {
        self.log
            .run("UserService::create", &request, async {
                if self.users.exists_by_email(&request.email).await? {
                    return Err(ServiceError::already_exists("user", request.email.clone()));
                }
                if self.users.exists_by_user_id(&request.user_id).await? {
                    return Err(ServiceError::already_exists("user", request.user_id.clone()));
                }

                let user = self
                    .users
                    .save(NewUser {
                        user_id: request.user_id.clone(),
                        name: request.name.clone(),
                        surname: request.surname.clone(),
                        birth_date: request.birth_date,
                        email: request.email.clone(),
                    })
                    .await?;

                Ok(UserResponse::from(UserRecord {
                    user,
                    cards: Vec::new(),
                }))
            })
            .await
    }

    pub async fn get_by_user_id(&self, user_id: &str) -> ServiceResult<UserResponse> {
        self.log
            .run(
                "UserService::get_by_user_id",
                user_id,
                self.read_through(Lookup::UserId(user_id)),
            )
            .await
    }

    pub async fn get_by_email(&self, email: &str) -> ServiceResult<UserResponse> {
        self.log
            .run(
                "UserService::get_by_email",
                email,
                self.read_through(Lookup::Email(email)),
            )
            .await
    }

    /// Sparse update: only the provided fields change.
    ///
    /// # Errors
    /// - [`ServiceError::NotFound`] if the user does not exist
    /// - [`ServiceError::AlreadyExists`] if the new email belongs to another
    ///   user; nothing is written in that case
    pub async fn update(&self, user_id: &str, changes: UpdateUserRequest) -> ServiceResult<()> {
        self.log
            .run("UserService::update", (user_id, &changes), async {
                let current = self.find_entity_uncached(user_id).await?;

                if let Some(email) = changes.email.as_deref() {
                    if email != current.email && self.users.exists_by_email(email).await? {
                        return Err(ServiceError::already_exists("user", email));
                    }
                }

                let mut fields = UserFields::from(&current);
                if let Some(name) = &changes.name {
                    fields.name = name.clone();
                }
                if let Some(surname) = &changes.surname {
                    fields.surname = surname.clone();
                }
                if let Some(birth_date) = changes.birth_date {
                    fields.birth_date = birth_date;
                }
                if let Some(email) = &changes.email {
                    fields.email = email.clone();
                }

                let new_email = fields.email.clone();
                self.users.update(current.id, fields).await?;

                self.evict_group(&CoherenceGroup::from(&current)).await?;
                if new_email != current.email {
                    self.cache.evict(&super::email_key(&new_email)).await?;
                }
                Ok(())
            })
            .await
    }

    /// Delete a user together with its cards.
    pub async fn delete(&self, user_id: &str) -> ServiceResult<()> {
        self.log
            .run("UserService::delete", user_id, async {
                let user = self.find_entity_uncached(user_id).await?;
                self.users.delete_by_user_id(user_id).await?;
                self.evict_group(&CoherenceGroup::from(&user)).await
            })
            .await
    }

    /// Drop both cached keys of `user`.
    pub async fn evict(&self, user: &User) -> ServiceResult<()> {
        self.log
            .run(
                "UserService::evict",
                &user.user_id,
                self.evict_group(&CoherenceGroup::from(user)),
            )
            .await
    }

    /// Load the stored user, bypassing the cache.
    pub async fn find_entity(&self, user_id: &str) -> ServiceResult<User> {
        self.log
            .run(
                "UserService::find_entity",
                user_id,
                self.find_entity_uncached(user_id),
            )
            .await
    }

    /// One page of users with their cards. The cache is not consulted.
    pub async fn get_all_paged(&self, page: PageRequest) -> ServiceResult<Page<UserResponse>> {
        self.log
            .run("UserService::get_all_paged", page, async {
                let source = UserPages(self.users.as_ref());
                Ok(paged(&source, page, UserResponse::from).await?)
            })
            .await
    }

    async fn find_entity_uncached(&self, user_id: &str) -> ServiceResult<User> {
        self.users
            .find_by_user_id(user_id)
            .await?
            .map(|record| record.user)
            .ok_or_else(|| ServiceError::not_found("user", user_id))
    }

    async fn read_through(&self, lookup: Lookup<'_>) -> ServiceResult<UserResponse> {
        let cache_key = lookup.cache_key();

        if let Some(snapshot) = self.cache.get(&cache_key).await? {
            match serde_json::from_str::<UserResponse>(&snapshot) {
                Ok(user) => {
                    debug!(key = %cache_key, "User cache hit");
                    return Ok(user);
                }
                Err(e) => {
                    warn!(key = %cache_key, error = %e, "Discarding unreadable user snapshot");
                    self.cache.evict(&cache_key).await?;
                }
            }
        }

        let record = match lookup {
            Lookup::UserId(user_id) => self.users.find_by_user_id(user_id).await?,
            Lookup::Email(email) => self.users.find_by_email(email).await?,
        }
        .ok_or_else(|| ServiceError::not_found("user", lookup.value()))?;

        let user = UserResponse::from(record);
        self.populate(&user).await?;
        debug!(key = %cache_key, "User cache populated");
        Ok(user)
    }

    async fn populate(&self, user: &UserResponse) -> ServiceResult<()> {
        let snapshot =
            serde_json::to_string(user).map_err(|e| CacheError::Encoding(e.to_string()))?;
        let group = CoherenceGroup::from(user);
        self.cache.put_group(&group.keys(), snapshot, self.ttl).await?;
        Ok(())
    }

    async fn evict_group(&self, group: &CoherenceGroup) -> ServiceResult<()> {
        for key in group.keys() {
            self.cache.evict(key).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OperationLogging;
    use crate::service::{email_key, id_key};
    use crate::storage::{
        CardStore, InMemoryStore, LruSnapshotCache, NewCard, StoreError, StoreResult,
    };
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use uuid::Uuid;

    const TTL: Duration = Duration::from_secs(600);

    struct Fixture {
        service: UserService,
        store: Arc<InMemoryStore>,
        cache: Arc<LruSnapshotCache>,
    }

    fn fixture() -> Fixture {
        fixture_with_capacity(100)
    }

    fn fixture_with_capacity(capacity: usize) -> Fixture {
        let store = Arc::new(InMemoryStore::new());
        let cache = Arc::new(LruSnapshotCache::new(capacity));
        let service = UserService::new(
            store.clone(),
            cache.clone(),
            TTL,
            OperationLog::new(OperationLogging::Development),
        );
        Fixture {
            service,
            store,
            cache,
        }
    }

    fn create_request(user_id: &str, email: &str) -> CreateUserRequest {
        CreateUserRequest {
            user_id: user_id.to_string(),
            name: "Ada".to_string(),
            surname: "Lovelace".to_string(),
            birth_date: NaiveDate::from_ymd_opt(1990, 12, 10).unwrap(),
            email: email.to_string(),
        }
    }

    async fn cached(cache: &LruSnapshotCache, key: &str) -> Option<UserResponse> {
        cache
            .get(key)
            .await
            .unwrap()
            .map(|snapshot| serde_json::from_str(&snapshot).unwrap())
    }

    #[tokio::test]
    async fn create_returns_projection_without_caching() {
        let f = fixture();
        let user = f.service.create(create_request("u1", "a@x.com")).await.unwrap();

        assert_eq!(user.user_id, "u1");
        assert!(user.cards.is_empty());
        assert!(cached(&f.cache, &id_key("u1")).await.is_none());
        assert!(cached(&f.cache, &email_key("a@x.com")).await.is_none());
    }

    #[tokio::test]
    async fn create_rejects_duplicate_email_then_user_id() {
        let f = fixture();
        f.service.create(create_request("u1", "a@x.com")).await.unwrap();

        let dup_email = f.service.create(create_request("u2", "a@x.com")).await;
        assert!(matches!(
            dup_email,
            Err(ServiceError::AlreadyExists { ref value, .. }) if value == "a@x.com"
        ));

        // Both collide: email is reported
        let both = f.service.create(create_request("u1", "a@x.com")).await;
        assert!(matches!(
            both,
            Err(ServiceError::AlreadyExists { ref value, .. }) if value == "a@x.com"
        ));

        let dup_id = f.service.create(create_request("u1", "other@x.com")).await;
        assert!(matches!(
            dup_id,
            Err(ServiceError::AlreadyExists { ref value, .. }) if value == "u1"
        ));

        let (ids, total) = UserStore::list_ids(f.store.as_ref(), PageRequest::default())
            .await
            .unwrap();
        assert_eq!(total, 1);
        assert_eq!(ids.len(), 1);
    }

    #[tokio::test]
    async fn read_populates_both_keys() {
        let f = fixture();
        f.service.create(create_request("u1", "a@x.com")).await.unwrap();

        let cold = f.service.get_by_user_id("u1").await.unwrap();
        let by_id = cached(&f.cache, &id_key("u1")).await.unwrap();
        let by_email = cached(&f.cache, &email_key("a@x.com")).await.unwrap();
        assert_eq!(by_id, cold);
        assert_eq!(by_email, cold);

        let warm = f.service.get_by_user_id("u1").await.unwrap();
        assert_eq!(warm, cold);
    }

    #[tokio::test]
    async fn full_cache_never_holds_half_a_user() {
        // Room for one user and a half
        let f = fixture_with_capacity(3);
        f.service.create(create_request("u1", "a@x.com")).await.unwrap();
        f.service.create(create_request("u2", "b@x.com")).await.unwrap();

        f.service.get_by_user_id("u1").await.unwrap();
        f.service.get_by_user_id("u2").await.unwrap();

        for (user_id, email) in [("u1", "a@x.com"), ("u2", "b@x.com")] {
            let by_id = cached(&f.cache, &id_key(user_id)).await;
            let by_email = cached(&f.cache, &email_key(email)).await;
            assert_eq!(
                by_id.is_some(),
                by_email.is_some(),
                "{user_id}: exactly one key cached"
            );
        }
        assert!(cached(&f.cache, &id_key("u2")).await.is_some());

        // A cold read after eviction repopulates the pair
        let user = f.service.get_by_email("a@x.com").await.unwrap();
        assert_eq!(cached(&f.cache, &id_key("u1")).await, Some(user.clone()));
        assert_eq!(cached(&f.cache, &email_key("a@x.com")).await, Some(user));
    }

    #[tokio::test]
    async fn read_by_email_populates_id_key_too() {
        let f = fixture();
        f.service.create(create_request("u1", "a@x.com")).await.unwrap();

        let user = f.service.get_by_email("a@x.com").await.unwrap();
        assert_eq!(cached(&f.cache, &id_key("u1")).await, Some(user));
    }

    #[tokio::test]
    async fn cache_hit_skips_the_store() {
        let f = fixture();
        let mut planted = f.service.create(create_request("u1", "a@x.com")).await.unwrap();
        planted.name = "From cache".to_string();
        f.cache
            .put(&id_key("u1"), serde_json::to_string(&planted).unwrap(), TTL)
            .await
            .unwrap();

        let user = f.service.get_by_user_id("u1").await.unwrap();
        assert_eq!(user.name, "From cache");
    }

    #[tokio::test]
    async fn unreadable_snapshot_is_replaced() {
        let f = fixture();
        f.service.create(create_request("u1", "a@x.com")).await.unwrap();
        f.cache
            .put(&id_key("u1"), "not json".to_string(), TTL)
            .await
            .unwrap();

        let user = f.service.get_by_user_id("u1").await.unwrap();
        assert_eq!(user.email, "a@x.com");
        assert_eq!(cached(&f.cache, &id_key("u1")).await, Some(user));
    }

    #[tokio::test]
    async fn missing_user_is_not_found_and_not_cached() {
        let f = fixture();
        let result = f.service.get_by_email("ghost@x.com").await;
        assert!(matches!(result, Err(ServiceError::NotFound { ref key, .. }) if key == "ghost@x.com"));
        assert!(f.cache.get(&email_key("ghost@x.com")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_merges_only_provided_fields() {
        let f = fixture();
        f.service.create(create_request("u1", "a@x.com")).await.unwrap();

        f.service
            .update(
                "u1",
                UpdateUserRequest {
                    surname: Some("Byron".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let user = f.service.get_by_user_id("u1").await.unwrap();
        assert_eq!(user.name, "Ada");
        assert_eq!(user.surname, "Byron");
        assert_eq!(user.email, "a@x.com");
        assert_eq!(user.birth_date, NaiveDate::from_ymd_opt(1990, 12, 10).unwrap());
    }

    #[tokio::test]
    async fn update_evicts_both_keys() {
        let f = fixture();
        f.service.create(create_request("u1", "a@x.com")).await.unwrap();
        f.service.get_by_user_id("u1").await.unwrap();

        f.service
            .update(
                "u1",
                UpdateUserRequest {
                    name: Some("Grace".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert!(cached(&f.cache, &id_key("u1")).await.is_none());
        assert!(cached(&f.cache, &email_key("a@x.com")).await.is_none());
    }

    #[tokio::test]
    async fn update_to_taken_email_changes_nothing() {
        let f = fixture();
        f.service.create(create_request("u1", "a@x.com")).await.unwrap();
        f.service.create(create_request("u2", "b@x.com")).await.unwrap();
        let before = f.service.get_by_user_id("u1").await.unwrap();

        let result = f
            .service
            .update(
                "u1",
                UpdateUserRequest {
                    name: Some("Changed".to_string()),
                    email: Some("b@x.com".to_string()),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(result, Err(ServiceError::AlreadyExists { .. })));

        // Cache untouched, store untouched
        assert_eq!(cached(&f.cache, &id_key("u1")).await, Some(before));
        let stored = f.store.find_by_user_id("u1").await.unwrap().unwrap();
        assert_eq!(stored.user.name, "Ada");
    }

    #[tokio::test]
    async fn update_keeping_own_email_is_allowed() {
        let f = fixture();
        f.service.create(create_request("u1", "a@x.com")).await.unwrap();

        f.service
            .update(
                "u1",
                UpdateUserRequest {
                    email: Some("a@x.com".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn update_missing_user_is_not_found() {
        let f = fixture();
        let result = f.service.update("ghost", UpdateUserRequest::default()).await;
        assert!(matches!(result, Err(ServiceError::NotFound { .. })));
    }

    #[tokio::test]
    async fn delete_evicts_both_keys_and_removes_user() {
        let f = fixture();
        f.service.create(create_request("u1", "a@x.com")).await.unwrap();
        f.service.get_by_user_id("u1").await.unwrap();

        f.service.delete("u1").await.unwrap();

        assert!(cached(&f.cache, &id_key("u1")).await.is_none());
        assert!(cached(&f.cache, &email_key("a@x.com")).await.is_none());
        assert!(matches!(
            f.service.get_by_user_id("u1").await,
            Err(ServiceError::NotFound { .. })
        ));
        assert!(matches!(
            f.service.delete("u1").await,
            Err(ServiceError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn paged_users_appear_once_with_all_cards() {
        let f = fixture();
        for i in 0..3 {
            f.service
                .create(create_request(&format!("u{i}"), &format!("{i}@x.com")))
                .await
                .unwrap();
        }
        let owner = f.service.find_entity("u0").await.unwrap();
        for n in 0..4 {
            CardStore::save(
                f.store.as_ref(),
                NewCard {
                    owner_id: owner.id,
                    number: format!("card-{n}"),
                    holder: "ADA".to_string(),
                    expiration_date: NaiveDate::from_ymd_opt(2030, 1, 1).unwrap(),
                },
            )
            .await
            .unwrap();
        }

        let page = f
            .service
            .get_all_paged(PageRequest::new(0, 2).unwrap())
            .await
            .unwrap();

        let ids: Vec<_> = page.content.iter().map(|u| u.user_id.as_str()).collect();
        assert_eq!(ids, vec!["u0", "u1"]);
        assert_eq!(page.content[0].cards.len(), 4);
        assert_eq!(page.total_elements, 3);
        assert_eq!(page.total_pages, 2);

        let past_end = f
            .service
            .get_all_paged(PageRequest::new(5, 2).unwrap())
            .await
            .unwrap();
        assert!(past_end.content.is_empty());
        assert_eq!(past_end.total_elements, 3);
    }

    /// Store whose existence checks always miss, so only the unique
    /// constraints on save can catch a duplicate.
    struct RacingStore(InMemoryStore);

    #[async_trait]
    impl UserStore for RacingStore {
        async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<UserRecord>> {
            UserStore::find_by_id(&self.0, id).await
        }
        async fn find_by_user_id(&self, user_id: &str) -> StoreResult<Option<UserRecord>> {
            self.0.find_by_user_id(user_id).await
        }
        async fn find_by_email(&self, email: &str) -> StoreResult<Option<UserRecord>> {
            self.0.find_by_email(email).await
        }
        async fn exists_by_user_id(&self, _user_id: &str) -> StoreResult<bool> {
            Ok(false)
        }
        async fn exists_by_email(&self, _email: &str) -> StoreResult<bool> {
            Ok(false)
        }
        async fn save(&self, user: NewUser) -> StoreResult<User> {
            UserStore::save(&self.0, user).await
        }
        async fn update(&self, id: Uuid, fields: UserFields) -> StoreResult<()> {
            self.0.update(id, fields).await
        }
        async fn delete_by_user_id(&self, user_id: &str) -> StoreResult<()> {
            self.0.delete_by_user_id(user_id).await
        }
        async fn list_ids(&self, page: PageRequest) -> StoreResult<(Vec<Uuid>, u64)> {
            UserStore::list_ids(&self.0, page).await
        }
        async fn list_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<UserRecord>> {
            UserStore::list_by_ids(&self.0, ids).await
        }
    }

    #[tokio::test]
    async fn lost_insert_race_surfaces_as_already_exists() {
        let service = UserService::new(
            Arc::new(RacingStore(InMemoryStore::new())),
            Arc::new(LruSnapshotCache::new(10)),
            TTL,
            OperationLog::default(),
        );
        service.create(create_request("u1", "a@x.com")).await.unwrap();

        let result = service.create(create_request("u1", "b@x.com")).await;
        assert!(matches!(result, Err(ServiceError::AlreadyExists { .. })));
    }

    /// Store that is down.
    struct BrokenStore;

    #[async_trait]
    impl UserStore for BrokenStore {
        async fn find_by_id(&self, _id: Uuid) -> StoreResult<Option<UserRecord>> {
            Err(StoreError::Backend("down".to_string()))
        }
        async fn find_by_user_id(&self, _user_id: &str) -> StoreResult<Option<UserRecord>> {
            Err(StoreError::Backend("down".to_string()))
        }
        async fn find_by_email(&self, _email: &str) -> StoreResult<Option<UserRecord>> {
            Err(StoreError::Backend("down".to_string()))
        }
        async fn exists_by_user_id(&self, _user_id: &str) -> StoreResult<bool> {
            Err(StoreError::Backend("down".to_string()))
        }
        async fn exists_by_email(&self, _email: &str) -> StoreResult<bool> {
            Err(StoreError::Backend("down".to_string()))
        }
        async fn save(&self, _user: NewUser) -> StoreResult<User> {
            Err(StoreError::Backend("down".to_string()))
        }
        async fn update(&self, _id: Uuid, _fields: UserFields) -> StoreResult<()> {
            Err(StoreError::Backend("down".to_string()))
        }
        async fn delete_by_user_id(&self, _user_id: &str) -> StoreResult<()> {
            Err(StoreError::Backend("down".to_string()))
        }
        async fn list_ids(&self, _page: PageRequest) -> StoreResult<(Vec<Uuid>, u64)> {
            Err(StoreError::Backend("down".to_string()))
        }
        async fn list_by_ids(&self, _ids: &[Uuid]) -> StoreResult<Vec<UserRecord>> {
            Err(StoreError::Backend("down".to_string()))
        }
    }

    #[tokio::test]
    async fn store_failures_pass_through_unwrapped() {
        let service = UserService::new(
            Arc::new(BrokenStore),
            Arc::new(LruSnapshotCache::new(10)),
            TTL,
            OperationLog::default(),
        );

        let result = service.get_by_user_id("u1").await;
        assert!(matches!(result, Err(ServiceError::Store(StoreError::Backend(_)))));

        let result = service.get_all_paged(PageRequest::default()).await;
        assert!(matches!(result, Err(ServiceError::Store(_))));
    }
}
