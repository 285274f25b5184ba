// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JWT claims and authenticated user representation.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::error::AuthError;
use super::roles::Role;

/// A role claim carried either as one string or as a list.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RoleClaim {
    One(String),
    Many(Vec<String>),
}

impl RoleClaim {
    fn names(&self) -> &[String] {
        match self {
            RoleClaim::One(name) => std::slice::from_ref(name),
            RoleClaim::Many(names) => names,
        }
    }
}

/// Claims read from a bearer token.
///
/// The token has already been accepted by the remote authority when these
/// are decoded, so only the fields needed to build an identity are kept.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenClaims {
    /// Subject: the caller's business user id
    pub sub: String,

    #[serde(default)]
    pub role: Option<RoleClaim>,

    #[serde(default)]
    pub roles: Option<RoleClaim>,
}

impl TokenClaims {
    /// Decode the payload without verifying the signature.
    ///
    /// Only call this for tokens the remote authority has validated.
    pub fn decode_unverified(token: &str) -> Result<Self, AuthError> {
        jsonwebtoken::dangerous::insecure_decode::<TokenClaims>(token)
            .map(|data| data.claims)
            .map_err(|e| AuthError::MalformedToken(e.to_string()))
    }
}

/// Authenticated caller, request-scoped and never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AuthenticatedUser {
    /// Business user id (token `sub` claim)
    pub user_id: String,

    /// Recognized roles; unknown role names are dropped
    pub roles: Vec<Role>,
}

impl AuthenticatedUser {
    pub fn new(user_id: impl Into<String>, roles: Vec<Role>) -> Self {
        Self {
            user_id: user_id.into(),
            roles,
        }
    }

    /// Create from decoded claims.
    pub fn from_claims(claims: TokenClaims) -> Self {
        let mut roles: Vec<Role> = Vec::new();
        let names = claims
            .role
            .iter()
            .chain(claims.roles.iter())
            .flat_map(|claim| claim.names());
        for role in names.filter_map(|name| Role::from_str(name)) {
            if !roles.contains(&role) {
                roles.push(role);
            }
        }

        Self {
            user_id: claims.sub,
            roles,
        }
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(Role::Admin)
    }
}
