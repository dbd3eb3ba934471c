// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Identity Gateway - Trust-Boundary Gateway
//!
//! Verifies identity-provider bearer tokens against a cached JWKS, replaces
//! them with a single trusted `x-user-id` header, and composes the caller's
//! workspace and tenant identity from two dependent downstream lookups.
//!
//! ## Modules
//!
//! - `auth` - Key store, token verifier, trust gateway middleware
//! - `identity` - Directory traits, remote clients, identity aggregator
//! - `store` - Seeded in-memory directories
//! - `api` - HTTP API handlers (Axum)

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod identity;
pub mod models;
pub mod state;
pub mod store;

use config::{LogFormat, DEFAULT_LOG_FILTER};

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over [`DEFAULT_LOG_FILTER`].
pub fn init_tracing(format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let subscriber = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => subscriber.with(fmt::layer().json()).init(),
        LogFormat::Pretty => subscriber.with(fmt::layer()).init(),
    }
}
