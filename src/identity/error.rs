// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Aggregation errors.

use axum::response::{IntoResponse, Response};

use crate::auth::error::unauthenticated_response;
use crate::error::ApiError;

/// Failure of a composite identity operation.
///
/// Nothing partial is ever returned alongside one of these.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityError {
    /// No trusted subject reached the aggregator
    #[error("no trusted subject")]
    Unauthenticated,
    /// Subject is authenticated but has no workspace user (or the
    /// membership lookup reported it unknown)
    #[error("subject is not provisioned")]
    NotFound,
    /// A downstream lookup failed
    #[error("upstream identity service unavailable: {0}")]
    UpstreamUnavailable(String),
    /// The request was cancelled or ran past its deadline
    #[error("identity aggregation canceled")]
    Canceled,
}

impl IntoResponse for IdentityError {
    fn into_response(self) -> Response {
        match self {
            IdentityError::Unauthenticated => unauthenticated_response(),
            IdentityError::NotFound => ApiError::unprovisioned().into_response(),
            IdentityError::UpstreamUnavailable(_) | IdentityError::Canceled => {
                ApiError::identity_unavailable().into_response()
            }
        }
    }
}
