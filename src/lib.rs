// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User Card Service - users owning payment cards
//!
//! This crate provides the core of a user and payment card service: a
//! dual-key read-through cache kept coherent with the store, id-then-hydrate
//! pagination, and a bearer-token access gate backed by a remote token
//! authority.
//!
//! ## Modules
//!
//! - `auth` - Authentication (remote token authority) and authorization policy
//! - `service` - User and card services over the storage ports
//! - `storage` - Store and cache ports with in-process adapters
//! - `models` - Request / response DTOs
//! - `config` - Environment configuration
//! - `logging` - Tracing setup and operation logging

pub mod auth;
pub mod config;
pub mod doc;
pub mod error;
pub mod logging;
pub mod models;
pub mod service;
pub mod state;
pub mod storage;

pub use error::{ServiceError, ServiceResult};
pub use state::AppState;
