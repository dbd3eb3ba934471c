// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Trust gateway middleware for Axum.
//!
//! Per request the gateway moves from unauthenticated to either authenticated
//! (the request continues with the trusted header set) or rejected (a 401 is
//! returned and nothing downstream runs). There is no retry inside a request.
//!
//! # Usage
//!
//! ```rust,ignore
//! let app = Router::new()
//!     .route("/v1/me", get(get_me))
//!     .route_layer(axum::middleware::from_fn_with_state(
//!         verifier.clone(),
//!         trust_gateway,
//!     ));
//! ```

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::{AuthError, TokenVerifier, TRUSTED_SUBJECT_HEADER};

/// Authenticate the request and assert the verified subject downstream.
pub async fn trust_gateway(
    State(verifier): State<Arc<TokenVerifier>>,
    mut request: Request,
    next: Next,
) -> Response {
    // Only this function may set the trusted header; anything a client sent
    // under that name is dropped before verification runs.
    if request.headers_mut().remove(&TRUSTED_SUBJECT_HEADER).is_some() {
        tracing::warn!(
            path = %request.uri().path(),
            "Discarded client-supplied trusted subject header"
        );
    }

    match authenticate(&verifier, request.headers()).await {
        Ok(subject) => {
            request.headers_mut().insert(TRUSTED_SUBJECT_HEADER, subject);
            next.run(request).await
        }
        Err(e) => {
            tracing::warn!(
                reason = e.reason(),
                error = %e,
                path = %request.uri().path(),
                "Rejected unauthenticated request"
            );
            e.into_response()
        }
    }
}

/// Extract and verify the bearer token, returning the header value to assert.
async fn authenticate(verifier: &TokenVerifier, headers: &HeaderMap) -> Result<HeaderValue, AuthError> {
    let token = bearer_token(headers)?;
    let claims = verifier.verify(token).await?;

    // A subject that cannot travel as a header value cannot be asserted.
    if claims.sub.is_empty() {
        return Err(AuthError::MalformedToken);
    }
    HeaderValue::from_str(&claims.sub).map_err(|_| AuthError::MalformedToken)
}

/// Parse `Authorization: Bearer <token>`.
fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingCredential)?
        .to_str()
        .map_err(|_| AuthError::MissingCredential)?;

    let token = value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .ok_or(AuthError::MissingCredential)?;

    if token.is_empty() {
        return Err(AuthError::MissingCredential);
    }
    Ok(token)
}
