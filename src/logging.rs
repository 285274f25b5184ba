// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Tracing setup and the service operation log.

use std::fmt::Debug;
use std::future::Future;
use std::time::Instant;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::{LogFormat, OperationLogging};
use crate::error::ServiceResult;

/// Target under which service operations are logged.
pub const OPERATIONS_TARGET: &str = "user_card_service::operations";

/// Install the global subscriber.
///
/// `RUST_LOG` wins when set; otherwise everything at `info` and above is
/// emitted. Calling this twice is harmless.
pub fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    let _ = match format {
        LogFormat::Json => registry.with(fmt::layer().json()).try_init(),
        LogFormat::Pretty => registry.with(fmt::layer().pretty()).try_init(),
    };
}

/// Wraps every public service operation with entry/exit logging.
///
/// In development mode arguments and results are recorded; in production
/// only the operation name, outcome and elapsed time. Successful operations
/// log at `debug` in both modes, failures at `warn`.
#[derive(Debug, Clone, Copy, Default)]
pub struct OperationLog {
    mode: OperationLogging,
}

impl OperationLog {
    pub fn new(mode: OperationLogging) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> OperationLogging {
        self.mode
    }

    /// Run `operation`, logging around it. The result is returned untouched.
    pub async fn run<A, T, F>(&self, name: &'static str, args: A, operation: F) -> ServiceResult<T>
    where
        A: Debug,
        T: Debug,
        F: Future<Output = ServiceResult<T>>,
    {
        let verbose = self.mode == OperationLogging::Development;
        if verbose {
            tracing::debug!(target: OPERATIONS_TARGET, operation = name, args = ?args, "Entering");
        }

        let started = Instant::now();
        let result = operation.await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match &result {
            Ok(value) if verbose => {
                tracing::debug!(
                    target: OPERATIONS_TARGET,
                    operation = name,
                    elapsed_ms,
                    result = ?value,
                    "Completed"
                );
            }
            Ok(_) => {
                tracing::debug!(target: OPERATIONS_TARGET, operation = name, elapsed_ms, "Completed");
            }
            Err(err) => {
                tracing::warn!(
                    target: OPERATIONS_TARGET,
                    operation = name,
                    elapsed_ms,
                    error = %err,
                    "Failed"
                );
            }
        }

        result
    }
}
