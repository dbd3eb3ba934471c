// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! The gateway's trust boundary.
//!
//! ## Auth Flow
//!
//! 1. Client sends `Authorization: Bearer <provider JWT>`
//! 2. Gateway:
//!    - drops any client-supplied `x-user-id`
//!    - resolves the signing key from the cached provider JWKS
//!    - verifies algorithm, signature, expiry, issuer, audience
//!    - sets `x-user-id` to the verified `sub`
//! 3. Handlers and downstream services trust `x-user-id` and never re-verify
//!
//! ## Security
//!
//! - Only RS256/RS384/RS512 are accepted; `none` and HMAC are rejected
//! - Unknown `kid`s refresh the JWKS at most once per refresh interval
//! - Every failure produces the same 401; the reason is only logged
//!
//! The trusted header is only as strong as the network boundary around the
//! internal services: anything that can reach them directly can forge it.

use axum::http::HeaderName;

pub mod claims;
pub mod error;
pub mod extractor;
pub mod jwks;
pub mod middleware;
pub mod verifier;

pub use claims::{Audience, Claims};
pub use error::AuthError;
pub use extractor::TrustedSubject;
pub use jwks::{KeyStore, KeyStoreError, SigningKey};
pub use middleware::trust_gateway;
pub use verifier::TokenVerifier;

/// Header carrying the gateway-asserted subject to everything behind it.
pub const TRUSTED_SUBJECT_HEADER: HeaderName = HeaderName::from_static("x-user-id");
