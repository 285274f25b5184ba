// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication middleware for Axum.
//!
//! Runs the [`AccessGate`] once per request and stores the resulting
//! [`AuthenticatedUser`] in request extensions, where the
//! [`Identity`](super::Identity) extractor picks it up. The middleware never
//! rejects: anonymous requests pass through without an extension.
//!
//! ```rust,ignore
//! let app = Router::new()
//!     .route("/users/{user_id}", get(get_user))
//!     .layer(axum::middleware::from_fn_with_state(
//!         gate.clone(),
//!         authenticate_request,
//!     ));
//! ```

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use super::gate::AccessGate;
use super::AuthenticatedUser;

/// Authentication middleware function.
pub async fn authenticate_request(
    State(gate): State<AccessGate>,
    mut request: Request,
    next: Next,
) -> Response {
    let headers = request.headers().clone();

    // Never trust an identity injected before this layer
    request.extensions_mut().remove::<AuthenticatedUser>();

    if let Some(user) = gate.authenticate(&headers).await {
        request.extensions_mut().insert(user);
    }
    next.run(request).await
}
