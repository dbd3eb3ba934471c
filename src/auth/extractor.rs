// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractor for the gateway-asserted subject.
//!
//! Handlers behind [`trust_gateway`](super::middleware::trust_gateway) read
//! the caller's identity from the trusted header and nowhere else:
//!
//! ```rust,ignore
//! async fn my_handler(TrustedSubject(subject): TrustedSubject) -> impl IntoResponse {
//!     // subject is the verified `sub` claim
//! }
//! ```

use axum::{extract::FromRequestParts, http::request::Parts};

use super::TRUSTED_SUBJECT_HEADER;
use crate::identity::IdentityError;

/// Verified subject asserted by the gateway.
///
/// Rejects with [`IdentityError::Unauthenticated`] when the header is absent,
/// empty, or not valid UTF-8.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustedSubject(pub String);

impl<S> FromRequestParts<S> for TrustedSubject
where
    S: Send + Sync,
{
    type Rejection = IdentityError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(&TRUSTED_SUBJECT_HEADER)
            .and_then(|value| value.to_str().ok())
            .filter(|subject| !subject.is_empty())
            .map(|subject| TrustedSubject(subject.to_string()))
            .ok_or(IdentityError::Unauthenticated)
    }
}
