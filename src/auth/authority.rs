// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Remote token authority.
//!
//! Tokens are issued and revoked by a separate auth service; this service
//! only asks it whether a token is currently valid. One call per
//! authenticated request, bounded by the client timeout.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::error::AuthError;

/// Validation endpoint, relative to the authority base URL.
pub const VALIDATE_PATH: &str = "/api/v1/auth/validate";

/// Port to the remote token authority.
#[async_trait]
pub trait TokenAuthority: Send + Sync {
    /// `Ok(true)` only if the authority positively accepted the token.
    async fn validate(&self, token: &str) -> Result<bool, AuthError>;
}

#[derive(Serialize)]
struct ValidateTokenRequest<'a> {
    token: &'a str,
}

/// Response envelope of the auth service.
#[derive(Debug, Deserialize)]
struct ValidateTokenResponse {
    #[serde(default)]
    data: Option<serde_json::Value>,
}

/// HTTP client for the auth service.
#[derive(Clone)]
pub struct HttpTokenAuthority {
    /// Full validation URL
    validate_url: String,
    /// HTTP client
    client: reqwest::Client,
}

impl HttpTokenAuthority {
    /// Create a client for the authority at `base_url`.
    ///
    /// # Arguments
    /// - `base_url`: authority root, e.g. `http://auth-service:8080`
    /// - `timeout`: upper bound for one validation call
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, AuthError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AuthError::InternalError(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            validate_url: format!("{}{VALIDATE_PATH}", base_url.trim_end_matches('/')),
            client,
        })
    }

    pub fn validate_url(&self) -> &str {
        &self.validate_url
    }
}

#[async_trait]
impl TokenAuthority for HttpTokenAuthority {
    async fn validate(&self, token: &str) -> Result<bool, AuthError> {
        let response = self
            .client
            .post(&self.validate_url)
            .json(&ValidateTokenRequest { token })
            .send()
            .await
            .map_err(|e| AuthError::AuthorityUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AuthError::AuthorityStatus(response.status().as_u16()));
        }

        let body: ValidateTokenResponse = response
            .json()
            .await
            .map_err(|e| AuthError::AuthorityResponse(e.to_string()))?;

        Ok(matches!(body.data, Some(serde_json::Value::Bool(true))))
    }
}
