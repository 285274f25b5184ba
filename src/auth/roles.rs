// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User roles for authorization.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Authority prefix some identity providers put in front of role names.
const ROLE_PREFIX: &str = "role_";

/// User roles for authorization.
///
/// - `Admin` - may act on any user or card and list everything
/// - `User` - may only act on itself and its own cards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Full administrative access
    Admin,
    /// Regular user
    User,
}

impl Role {
    /// Parse role from a token claim (case-insensitive, `ROLE_` prefix
    /// optional). Unknown roles yield `None`.
    pub fn from_str(s: &str) -> Option<Role> {
        let lower = s.trim().to_lowercase();
        let name = lower.strip_prefix(ROLE_PREFIX).unwrap_or(&lower);
        match name {
            "admin" => Some(Role::Admin),
            "user" => Some(Role::User),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::User => write!(f, "user"),
        }
    }
}
