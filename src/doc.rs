// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! OpenAPI components for transports that publish a schema.

use utoipa::OpenApi;

use crate::auth::{AuthenticatedUser, Role};
use crate::models::{
    CardResponse, CreateCardRequest, CreateUserRequest, UpdateUserRequest, UserResponse,
};

#[derive(OpenApi)]
#[openapi(
    components(
        schemas(
            CreateUserRequest,
            UpdateUserRequest,
            UserResponse,
            CreateCardRequest,
            CardResponse,
            AuthenticatedUser,
            Role
        )
    ),
    tags(
        (name = "Users", description = "User management"),
        (name = "Cards", description = "Payment card management")
    )
)]
pub struct ApiDoc;
