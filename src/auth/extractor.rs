// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractor for the request identity.
//!
//! ```rust,ignore
//! async fn get_user(
//!     Identity(caller): Identity,
//!     State(state): State<AppState>,
//!     Path(user_id): Path<String>,
//! ) -> Result<Json<UserResponse>, ServiceError> {
//!     state.policy.authorize(caller.as_ref(), Operation::AccessUser(&user_id)).await?;
//!     Ok(Json(state.users.get_by_user_id(&user_id).await?))
//! }
//! ```

use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};

use super::AuthenticatedUser;

/// Identity set by [`authenticate_request`](super::authenticate_request),
/// `None` for anonymous requests.
///
/// Never rejects; access decisions belong to
/// [`AccessPolicy`](super::AccessPolicy).
#[derive(Debug, Clone)]
pub struct Identity(pub Option<AuthenticatedUser>);

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Identity(parts.extensions.get::<AuthenticatedUser>().cloned()))
    }
}
