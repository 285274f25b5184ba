// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Request authentication against the remote token authority.
//!
//! 1. No `Authorization: Bearer <token>` header: anonymous
//! 2. Authority error, timeout or rejection: anonymous (logged)
//! 3. Authority accepts: identity decoded from the token claims
//!
//! Authentication never fails a request. Whether an anonymous caller may
//! proceed is decided later by [`AccessPolicy`](super::AccessPolicy).

use std::sync::Arc;

use axum::http::{header::AUTHORIZATION, HeaderMap};
use tracing::{debug, warn};

use super::authority::TokenAuthority;
use super::claims::{AuthenticatedUser, TokenClaims};
use super::error::AuthError;

const BEARER_PREFIX: &str = "Bearer ";

/// Extract the bearer token from request headers.
///
/// Returns `Ok(None)` when there is no `Authorization` header.
pub fn bearer_token(headers: &HeaderMap) -> Result<Option<&str>, AuthError> {
    let Some(header) = headers.get(AUTHORIZATION) else {
        return Ok(None);
    };
    let value = header.to_str().map_err(|_| AuthError::InvalidAuthHeader)?;
    let token = value
        .strip_prefix(BEARER_PREFIX)
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(AuthError::InvalidAuthHeader)?;
    Ok(Some(token))
}

/// Authenticates requests. Cheap to clone.
#[derive(Clone)]
pub struct AccessGate {
    authority: Arc<dyn TokenAuthority>,
}

impl AccessGate {
    pub fn new(authority: Arc<dyn TokenAuthority>) -> Self {
        Self { authority }
    }

    /// Resolve the caller identity, `None` for anonymous.
    pub async fn authenticate(&self, headers: &HeaderMap) -> Option<AuthenticatedUser> {
        match self.try_authenticate(headers).await {
            Ok(user) => user,
            Err(e) => {
                warn!(error = %e, error_code = e.error_code(), "Authentication failed, continuing as anonymous");
                None
            }
        }
    }

    async fn try_authenticate(
        &self,
        headers: &HeaderMap,
    ) -> Result<Option<AuthenticatedUser>, AuthError> {
        let Some(token) = bearer_token(headers)? else {
            debug!("No bearer token, anonymous request");
            return Ok(None);
        };

        if !self.authority.validate(token).await? {
            debug!("Token rejected by authority");
            return Ok(None);
        }

        let user = AuthenticatedUser::from_claims(TokenClaims::decode_unverified(token)?);
        debug!(user_id = %user.user_id, roles = ?user.roles, "Authenticated request");
        Ok(Some(user))
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use async_trait::async_trait;
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Authority with a fixed answer that counts its calls.
    pub struct StubAuthority {
        pub answer: Result<bool, AuthError>,
        pub calls: AtomicUsize,
    }

    impl StubAuthority {
        pub fn new(answer: Result<bool, AuthError>) -> Arc<Self> {
            Arc::new(Self {
                answer,
                calls: AtomicUsize::new(0),
            })
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TokenAuthority for StubAuthority {
        async fn validate(&self, _token: &str) -> Result<bool, AuthError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.answer.clone()
        }
    }

    /// Helper to create a test JWT token (unsigned, for testing only)
    pub fn create_test_jwt(user_id: &str, role: &str) -> String {
        let header = r#"{"alg":"RS256","typ":"JWT"}"#;
        let claims = format!(r#"{{"sub":"{user_id}","role":"{role}","exp":9999999999}}"#);

        let header_b64 = URL_SAFE_NO_PAD.encode(header.as_bytes());
        let claims_b64 = URL_SAFE_NO_PAD.encode(claims.as_bytes());

        // Signature is the authority's concern
        format!("{header_b64}.{claims_b64}.fake_signature")
    }

    pub fn bearer_headers(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, format!("Bearer {token}").parse().unwrap());
        headers
    }
}
