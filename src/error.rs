// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Service error taxonomy.
//!
//! Domain failures (`NotFound`, `AlreadyExists`, `AccessDenied`,
//! `InvalidInput`) are recoverable and reported to the caller. Store and
//! cache failures pass through untouched so that infrastructure problems are
//! never disguised as domain errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::storage::{CacheError, StoreError};

/// Result alias used by every service operation.
pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Lookup or mutation target does not exist.
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    /// Uniqueness violation on user id, email or card number.
    #[error("{entity} already exists: {value}")]
    AlreadyExists { entity: &'static str, value: String },

    /// Authorization failure. Always fail-closed.
    #[error("access denied: {0}")]
    AccessDenied(String),

    /// Malformed field value decoded before reaching the core.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Store(StoreError),

    #[error(transparent)]
    Cache(#[from] CacheError),
}

impl ServiceError {
    pub fn not_found(entity: &'static str, key: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            key: key.into(),
        }
    }

    pub fn already_exists(entity: &'static str, value: impl Into<String>) -> Self {
        Self::AlreadyExists {
            entity,
            value: value.into(),
        }
    }

    pub fn access_denied(message: impl Into<String>) -> Self {
        Self::AccessDenied(message.into())
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            ServiceError::NotFound { .. } => "not_found",
            ServiceError::AlreadyExists { .. } => "already_exists",
            ServiceError::AccessDenied(_) => "access_denied",
            ServiceError::InvalidInput(_) => "invalid_input",
            ServiceError::Store(_) | ServiceError::Cache(_) => "internal_error",
        }
    }

    /// Get the HTTP status code a transport should answer with.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::NotFound { .. } => StatusCode::NOT_FOUND,
            ServiceError::AlreadyExists { .. } => StatusCode::CONFLICT,
            ServiceError::AccessDenied(_) => StatusCode::FORBIDDEN,
            ServiceError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ServiceError::Store(_) | ServiceError::Cache(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        // The store's unique constraints back up the optimistic pre-checks,
        // so a lost insert race still reads as a uniqueness failure.
        match err {
            StoreError::UniqueViolation { entity, value, .. } => {
                ServiceError::AlreadyExists { entity, value }
            }
            StoreError::MissingRecord { entity, id } => ServiceError::NotFound {
                entity,
                key: id.to_string(),
            },
            other => ServiceError::Store(other),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    error_code: String,
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = if status.is_server_error() {
            tracing::error!(error = %self, "Unexpected infrastructure failure");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };
        let body = Json(ErrorBody {
            error: message,
            error_code: self.error_code().to_string(),
        });
        (status, body).into_response()
    }
}
