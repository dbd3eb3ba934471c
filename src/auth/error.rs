// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.
//!
//! Every variant carries an internal reason that is logged at the gateway.
//! Clients always receive the same 401 body regardless of which check failed,
//! so a rejected caller learns nothing about how close a forgery came.

use axum::{
    http::{header::WWW_AUTHENTICATE, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Token verification failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// No `Authorization` header, or one not of the form `Bearer <token>`
    #[error("missing or malformed bearer credential")]
    MissingCredential,
    /// Token structure, header or claims could not be parsed
    #[error("token is malformed")]
    MalformedToken,
    /// Declared algorithm is not an accepted asymmetric RSA scheme
    #[error("unsupported signing algorithm `{0}`")]
    UnsupportedAlgorithm(String),
    /// No cached signing key for the token's `kid`
    #[error("no signing key for kid `{0}`")]
    UnknownKey(String),
    /// Signature does not verify against the resolved key
    #[error("token signature is invalid")]
    SignatureInvalid,
    /// `exp` has passed or `nbf` is still in the future
    #[error("token is expired or not yet valid")]
    Expired,
    /// `iss` differs from the configured issuer
    #[error("token issuer mismatch")]
    IssuerMismatch,
    /// `aud` does not contain the configured audience
    #[error("token audience mismatch")]
    AudienceMismatch,
}

impl AuthError {
    /// Internal reason code, used for logs only.
    pub fn reason(&self) -> &'static str {
        match self {
            AuthError::MissingCredential => "missing_credential",
            AuthError::MalformedToken => "malformed_token",
            AuthError::UnsupportedAlgorithm(_) => "unsupported_algorithm",
            AuthError::UnknownKey(_) => "unknown_key",
            AuthError::SignatureInvalid => "signature_invalid",
            AuthError::Expired => "expired",
            AuthError::IssuerMismatch => "issuer_mismatch",
            AuthError::AudienceMismatch => "audience_mismatch",
        }
    }
}

#[derive(Serialize)]
struct AuthErrorBody {
    error: &'static str,
    error_code: &'static str,
}

/// The single response every authentication failure collapses to.
pub fn unauthenticated_response() -> Response {
    let body = Json(AuthErrorBody {
        error: "Authentication required",
        error_code: "unauthenticated",
    });
    let mut response = (StatusCode::UNAUTHORIZED, body).into_response();
    response
        .headers_mut()
        .insert(WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
    response
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        unauthenticated_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_of(error: AuthError) -> (StatusCode, Vec<u8>) {
        let response = error.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, bytes.to_vec())
    }

    #[tokio::test]
    async fn every_variant_produces_identical_response() {
        let variants = [
            AuthError::MissingCredential,
            AuthError::MalformedToken,
            AuthError::UnsupportedAlgorithm("HS256".to_string()),
            AuthError::UnknownKey("kid-1".to_string()),
            AuthError::SignatureInvalid,
            AuthError::Expired,
            AuthError::IssuerMismatch,
            AuthError::AudienceMismatch,
        ];

        let (reference_status, reference_body) = body_of(AuthError::Expired).await;
        assert_eq!(reference_status, StatusCode::UNAUTHORIZED);

        for variant in variants {
            let (status, body) = body_of(variant).await;
            assert_eq!(status, reference_status);
            assert_eq!(body, reference_body);
        }
    }

    #[tokio::test]
    async fn response_carries_bearer_challenge() {
        let response = AuthError::AudienceMismatch.into_response();
        assert_eq!(
            response.headers().get(WWW_AUTHENTICATE).unwrap(),
            "Bearer"
        );

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();
        assert_eq!(body["error_code"], "unauthenticated");
    }

    #[test]
    fn reasons_are_distinct() {
        assert_eq!(AuthError::AudienceMismatch.reason(), "audience_mismatch");
        assert_ne!(
            AuthError::AudienceMismatch.reason(),
            AuthError::IssuerMismatch.reason()
        );
    }
}
