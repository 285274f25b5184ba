// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Bearer-token authentication against a remote token authority, plus the
//! local authorization policy.
//!
//! ## Auth Flow
//!
//! 1. Client sends `Authorization: Bearer <JWT>` issued by the auth service
//! 2. [`AccessGate`] asks the auth service whether the token is valid
//! 3. On acceptance the payload is decoded locally (no signature check):
//!    - `sub` → business `user_id`
//!    - `role` / `roles` → [`Role`]s
//! 4. [`AccessPolicy`] decides per operation, consulting the card store for
//!    card ownership
//!
//! ## Failure Semantics
//!
//! - Authentication fails open to anonymous: authority errors, timeouts and
//!   rejections are logged and swallowed
//! - Authorization fails closed: anonymous callers are denied everything

pub mod authority;
pub mod claims;
pub mod error;
pub mod extractor;
pub mod gate;
pub mod middleware;
pub mod policy;
pub mod roles;

pub use authority::{HttpTokenAuthority, TokenAuthority};
pub use claims::{AuthenticatedUser, TokenClaims};
pub use error::AuthError;
pub use extractor::Identity;
pub use gate::{bearer_token, AccessGate};
pub use middleware::authenticate_request;
pub use policy::{AccessPolicy, Operation};
pub use roles::Role;
