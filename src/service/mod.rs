// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Domain Services
//!
//! - [`UserService`]: user lifecycle behind the dual-key snapshot cache
//! - [`CardService`]: card lifecycle; invalidates the owner's snapshot
//!
//! ## Cache Keys
//!
//! A user is cached under two independent keys, its business id and its
//! email. Both keys of one user form a [`CoherenceGroup`]: they are always
//! populated together and evicted together, so after any write completes
//! they are either both current or both absent.

pub mod cards;
pub mod users;

pub use cards::CardService;
pub use users::UserService;

use crate::models::UserResponse;
use crate::storage::User;

const ID_KEY_PREFIX: &str = "users::id:";
const EMAIL_KEY_PREFIX: &str = "users::email:";

/// Cache key for a user's business id.
pub fn id_key(user_id: &str) -> String {
    format!("{ID_KEY_PREFIX}{user_id}")
}

/// Cache key for a user's email.
pub fn email_key(email: &str) -> String {
    format!("{EMAIL_KEY_PREFIX}{email}")
}

/// The two cache keys addressing one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoherenceGroup {
    pub id_key: String,
    pub email_key: String,
}

impl CoherenceGroup {
    pub fn new(user_id: &str, email: &str) -> Self {
        Self {
            id_key: id_key(user_id),
            email_key: email_key(email),
        }
    }

    pub fn keys(&self) -> [&str; 2] {
        [self.id_key.as_str(), self.email_key.as_str()]
    }
}

impl From<&User> for CoherenceGroup {
    fn from(user: &User) -> Self {
        Self::new(&user.user_id, &user.email)
    }
}

impl From<&UserResponse> for CoherenceGroup {
    fn from(user: &UserResponse) -> Self {
        Self::new(&user.user_id, &user.email)
    }
}
