// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Id-then-hydrate pagination.
//!
//! Paging a joined one-to-many result multiplies rows, so a page window over
//! the join would return fewer entities than requested and duplicate the
//! ones it does return. The resolver pages over identifiers only, then loads
//! exactly those entities with their relation attached and restores the id
//! order.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{CardRecord, CardStore, StoreResult, UserRecord, UserStore};
use crate::error::ServiceError;

/// Page size used when the caller does not ask for one.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Larger requested sizes are clamped to this.
pub const MAX_PAGE_SIZE: u32 = 1000;

/// A zero-based page window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PageQuery")]
pub struct PageRequest {
    page: u32,
    size: u32,
}

/// Untrusted page parameters as they arrive from a query string.
#[derive(Debug, Default, Deserialize)]
struct PageQuery {
    #[serde(default)]
    page: Option<u32>,
    #[serde(default)]
    size: Option<u32>,
}

impl PageRequest {
    /// Build a page window.
    ///
    /// # Errors
    /// Returns [`ServiceError::InvalidInput`] for a zero page size.
    pub fn new(page: u32, size: u32) -> Result<Self, ServiceError> {
        if size == 0 {
            return Err(ServiceError::invalid_input("Page size must be at least 1"));
        }
        Ok(Self {
            page,
            size: size.min(MAX_PAGE_SIZE),
        })
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    /// Number of rows to skip.
    pub fn offset(&self) -> u64 {
        u64::from(self.page) * u64::from(self.size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 0,
            size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl TryFrom<PageQuery> for PageRequest {
    type Error = ServiceError;

    fn try_from(query: PageQuery) -> Result<Self, Self::Error> {
        Self::new(
            query.page.unwrap_or(0),
            query.size.unwrap_or(DEFAULT_PAGE_SIZE),
        )
    }
}

/// One page of projected entities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub content: Vec<T>,
    pub page: u32,
    pub size: u32,
    /// Total number of entities across all pages.
    pub total_elements: u64,
    pub total_pages: u64,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, request: PageRequest, total_elements: u64) -> Self {
        let size = u64::from(request.size());
        Self {
            content,
            page: request.page(),
            size: request.size(),
            total_elements,
            total_pages: total_elements.div_ceil(size),
        }
    }

    pub fn empty(request: PageRequest, total_elements: u64) -> Self {
        Self::new(Vec::new(), request, total_elements)
    }
}

/// A source that can list ids for a page window and hydrate them.
#[async_trait]
pub trait PagedSource: Send + Sync {
    type Record: Send;

    async fn page_ids(&self, request: PageRequest) -> StoreResult<(Vec<Uuid>, u64)>;

    async fn hydrate(&self, ids: &[Uuid]) -> StoreResult<Vec<Self::Record>>;

    fn record_id(record: &Self::Record) -> Uuid;
}

/// Resolve one page: ids first, then a single bulk hydrate, then projection
/// in id order.
///
/// Every id appears at most once in the result even if the source returns
/// several rows for it. Ids whose entity disappeared between the two
/// queries are skipped. An empty id page still reports the true total.
pub async fn paged<S, T, F>(source: &S, request: PageRequest, project: F) -> StoreResult<Page<T>>
where
    S: PagedSource + ?Sized,
    F: FnMut(S::Record) -> T,
{
    let (ids, total) = source.page_ids(request).await?;
    if ids.is_empty() {
        return Ok(Page::empty(request, total));
    }

    let records = source.hydrate(&ids).await?;
    let mut by_id: HashMap<Uuid, S::Record> = records
        .into_iter()
        .map(|record| (S::record_id(&record), record))
        .collect();

    let content = ids
        .iter()
        .filter_map(|id| by_id.remove(id))
        .map(project)
        .collect();

    Ok(Page::new(content, request, total))
}

/// Pages users with their cards attached.
pub struct UserPages<'a>(pub &'a dyn UserStore);

#[async_trait]
impl<'a> PagedSource for UserPages<'a> {
    type Record = UserRecord;

    async fn page_ids(&self, request: PageRequest) -> StoreResult<(Vec<Uuid>, u64)> {
        self.0.list_ids(request).await
    }

    async fn hydrate(&self, ids: &[Uuid]) -> StoreResult<Vec<UserRecord>> {
        self.0.list_by_ids(ids).await
    }

    fn record_id(record: &UserRecord) -> Uuid {
        record.user.id
    }
}

/// Pages cards with their owner attached.
pub struct CardPages<'a>(pub &'a dyn CardStore);

#[async_trait]
impl<'a> PagedSource for CardPages<'a> {
    type Record = CardRecord;

    async fn page_ids(&self, request: PageRequest) -> StoreResult<(Vec<Uuid>, u64)> {
        self.0.list_ids(request).await
    }

    async fn hydrate(&self, ids: &[Uuid]) -> StoreResult<Vec<CardRecord>> {
        self.0.list_by_ids(ids).await
    }

    fn record_id(record: &CardRecord) -> Uuid {
        record.card.id
    }
}
