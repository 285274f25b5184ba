// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.
//!
//! None of these reach a caller: the gate logs them and continues the
//! request as anonymous. Authorization failures are
//! [`ServiceError::AccessDenied`](crate::error::ServiceError::AccessDenied).

/// Authentication error type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// Authorization header is not valid UTF-8 or lacks the `Bearer ` scheme
    #[error("Invalid authorization header format (expected 'Bearer <token>')")]
    InvalidAuthHeader,

    /// Token payload could not be decoded
    #[error("Token is malformed: {0}")]
    MalformedToken(String),

    /// Token authority could not be reached or timed out
    #[error("Token authority unreachable: {0}")]
    AuthorityUnavailable(String),

    /// Token authority answered with a non-success status
    #[error("Token authority returned HTTP {0}")]
    AuthorityStatus(u16),

    /// Token authority answered with an unreadable body
    #[error("Token authority returned an invalid response: {0}")]
    AuthorityResponse(String),

    /// HTTP client could not be constructed
    #[error("Internal authentication error: {0}")]
    InternalError(String),
}

impl AuthError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::InvalidAuthHeader => "invalid_auth_header",
            AuthError::MalformedToken(_) => "malformed_token",
            AuthError::AuthorityUnavailable(_) => "authority_unavailable",
            AuthError::AuthorityStatus(_) => "authority_status",
            AuthError::AuthorityResponse(_) => "authority_response",
            AuthError::InternalError(_) => "internal_error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes_are_stable() {
        assert_eq!(AuthError::InvalidAuthHeader.error_code(), "invalid_auth_header");
        assert_eq!(AuthError::AuthorityStatus(503).error_code(), "authority_status");
        assert_eq!(
            AuthError::AuthorityStatus(503).to_string(),
            "Token authority returned HTTP 503"
        );
    }
}
