// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Bearer token verification.
//!
//! Checks run in a fixed order and the first failure wins:
//!
//! 1. structure and header parse (`MalformedToken`)
//! 2. algorithm allow-list, RS256/RS384/RS512 only (`UnsupportedAlgorithm`)
//! 3. `kid` present (`MalformedToken`)
//! 4. key resolution through the [`KeyStore`] (`UnknownKey`)
//! 5. signature (`SignatureInvalid`)
//! 6. `exp` / `nbf` (`Expired`)
//! 7. `iss` (`IssuerMismatch`)
//! 8. `aud` (`AudienceMismatch`)
//!
//! The header is parsed here rather than by `jsonwebtoken::decode_header` so
//! that `alg: none` and HMAC tokens are classified as unsupported algorithms
//! instead of parse errors, and are rejected before any key is looked up.

use base64ct::{Base64UrlUnpadded, Encoding};
use chrono::Utc;
use jsonwebtoken::{decode, errors::ErrorKind, Algorithm, Validation};
use serde::Deserialize;

use super::claims::Claims;
use super::error::AuthError;
use super::jwks::KeyStore;

/// JOSE header fields the verifier reads.
#[derive(Debug, Deserialize)]
struct TokenHeader {
    alg: String,
    #[serde(default)]
    kid: Option<String>,
}

impl TokenHeader {
    fn parse(token: &str) -> Result<Self, AuthError> {
        let mut segments = token.split('.');
        let (Some(header), Some(_payload), Some(_signature), None) = (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) else {
            return Err(AuthError::MalformedToken);
        };

        let bytes = Base64UrlUnpadded::decode_vec(header).map_err(|_| AuthError::MalformedToken)?;
        serde_json::from_slice(&bytes).map_err(|_| AuthError::MalformedToken)
    }
}

/// Map a declared `alg` onto the accepted RSA signature schemes.
fn accepted_algorithm(alg: &str) -> Result<Algorithm, AuthError> {
    match alg {
        "RS256" => Ok(Algorithm::RS256),
        "RS384" => Ok(Algorithm::RS384),
        "RS512" => Ok(Algorithm::RS512),
        other => Err(AuthError::UnsupportedAlgorithm(other.to_string())),
    }
}

/// Verifies identity-provider tokens for one issuer/audience pair.
#[derive(Clone)]
pub struct TokenVerifier {
    keys: KeyStore,
    issuer: String,
    audience: String,
    leeway_secs: i64,
}

impl TokenVerifier {
    /// Create a verifier.
    ///
    /// # Arguments
    /// - `keys`: initialized key store
    /// - `issuer`: exact expected `iss`, e.g. `https://tenant.example.com/`
    /// - `audience`: identifier that must appear in `aud`
    pub fn new(keys: KeyStore, issuer: impl Into<String>, audience: impl Into<String>) -> Self {
        Self {
            keys,
            issuer: issuer.into(),
            audience: audience.into(),
            leeway_secs: 0,
        }
    }

    /// Tolerate clock skew of `secs` on `exp` and `nbf`.
    pub fn with_leeway(mut self, secs: u64) -> Self {
        self.leeway_secs = i64::try_from(secs).unwrap_or(i64::MAX);
        self
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn audience(&self) -> &str {
        &self.audience
    }

    pub fn key_store(&self) -> &KeyStore {
        &self.keys
    }

    /// Verify `token` and return its claims.
    pub async fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let header = TokenHeader::parse(token)?;
        let algorithm = accepted_algorithm(&header.alg)?;

        let kid = header
            .kid
            .filter(|kid| !kid.is_empty())
            .ok_or(AuthError::MalformedToken)?;
        let key = self.keys.lookup(&kid).await?;

        // Signature and claim deserialization only; the temporal, issuer and
        // audience checks below keep their own order and error variants.
        let mut validation = Validation::new(algorithm);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();
        validation.leeway = 0;

        let claims = decode::<Claims>(token, &key.decoding_key, &validation)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => AuthError::SignatureInvalid,
                ErrorKind::InvalidAlgorithm => AuthError::UnsupportedAlgorithm(header.alg.clone()),
                _ => AuthError::MalformedToken,
            })?
            .claims;

        let now = Utc::now().timestamp();
        if claims.exp.saturating_add(self.leeway_secs) <= now {
            return Err(AuthError::Expired);
        }
        if let Some(nbf) = claims.nbf {
            if nbf > now.saturating_add(self.leeway_secs) {
                return Err(AuthError::Expired);
            }
        }

        if claims.iss != self.issuer {
            return Err(AuthError::IssuerMismatch);
        }

        if !claims.aud.contains(&self.audience) {
            return Err(AuthError::AudienceMismatch);
        }

        Ok(claims)
    }
}
