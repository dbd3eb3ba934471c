// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JWT claims carried by identity-provider access tokens.

use serde::{Deserialize, Deserializer};

/// Claims extracted from a verified token.
///
/// Built per request and never persisted. Only `sub`, `iss` and `exp` are
/// mandatory; a token missing any of them fails to parse.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Claims {
    /// Subject (provider user ID), the identity asserted downstream
    pub sub: String,

    /// Issuer
    pub iss: String,

    /// Audience; providers emit either a string or an array
    #[serde(default)]
    pub aud: Audience,

    /// Expiration timestamp
    pub exp: i64,

    /// Not before timestamp (optional)
    #[serde(default)]
    pub nbf: Option<i64>,

    /// Issued at timestamp (optional)
    #[serde(default)]
    pub iat: Option<i64>,

    #[serde(default)]
    pub email: Option<String>,

    #[serde(default)]
    pub email_verified: Option<bool>,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub picture: Option<String>,
}

/// Set of audiences a token was issued for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Audience(Vec<String>);

impl Audience {
    pub fn contains(&self, audience: &str) -> bool {
        self.0.iter().any(|a| a == audience)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl<'de> Deserialize<'de> for Audience {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            One(String),
            Many(Vec<String>),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::One(aud) => Audience(vec![aud]),
            Raw::Many(auds) => Audience(auds),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: serde_json::Value) -> Claims {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn single_string_audience() {
        let claims = parse(serde_json::json!({
            "sub": "auth0|user002",
            "iss": "https://tenant.example.com/",
            "aud": "https://api.example.com",
            "exp": 1700003600
        }));
        assert!(claims.aud.contains("https://api.example.com"));
        assert_eq!(claims.aud.as_slice().len(), 1);
    }

    #[test]
    fn array_audience() {
        let claims = parse(serde_json::json!({
            "sub": "auth0|user002",
            "iss": "https://tenant.example.com/",
            "aud": ["https://api.example.com", "https://tenant.example.com/userinfo"],
            "exp": 1700003600
        }));
        assert!(claims.aud.contains("https://tenant.example.com/userinfo"));
        assert!(!claims.aud.contains("https://other.example.com"));
    }

    #[test]
    fn missing_audience_is_empty() {
        let claims = parse(serde_json::json!({
            "sub": "auth0|user002",
            "iss": "https://tenant.example.com/",
            "exp": 1700003600
        }));
        assert!(claims.aud.as_slice().is_empty());
    }

    #[test]
    fn profile_claims_are_optional() {
        let claims = parse(serde_json::json!({
            "sub": "auth0|user002",
            "iss": "https://tenant.example.com/",
            "exp": 1700003600,
            "nbf": 1700000000,
            "email": "user02@example.com",
            "email_verified": true,
            "name": "User 02"
        }));
        assert_eq!(claims.nbf, Some(1700000000));
        assert_eq!(claims.email.as_deref(), Some("user02@example.com"));
        assert_eq!(claims.email_verified, Some(true));
        assert!(claims.picture.is_none());
    }

    #[test]
    fn missing_expiry_is_rejected() {
        let result: Result<Claims, _> = serde_json::from_value(serde_json::json!({
            "sub": "auth0|user002",
            "iss": "https://tenant.example.com/"
        }));
        assert!(result.is_err());
    }
}
