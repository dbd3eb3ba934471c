// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JWKS (JSON Web Key Set) fetching and caching.
//!
//! ## Lifecycle
//!
//! - [`KeyStore::initialize`] fetches the full key set once at startup. A
//!   failed fetch or parse is fatal: the gateway never serves without keys.
//! - A lookup for an unknown `kid` refreshes the set at most once per
//!   refresh interval (default one minute). Inside the interval the miss fails
//!   immediately, so probing with random key ids cannot drive upstream fetches.
//! - Runtime refresh failures are logged and reported as an unknown key; the
//!   next eligible miss retries.
//!
//! ## Locking
//!
//! Lookups take the key-set read lock only. A miss claims the refresh slot by
//! checking and stamping the throttle timestamp under a short synchronous
//! lock that is never held across an await. Only the claimant fetches; every
//! other miss inside the interval fails at once instead of queueing behind the
//! fetch. The fetch holds no lock, and the freshly built [`KeySet`] is swapped
//! in under a short write lock. Readers never see a partially updated mapping.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use jsonwebtoken::DecodingKey;
use serde::Deserialize;
use tokio::sync::RwLock;

use super::error::AuthError;

/// Default minimum spacing between refresh-on-miss fetches.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

/// Timeout for one JWKS HTTP fetch.
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Fatal key-set errors, raised by [`KeyStore::initialize`].
#[derive(Debug, thiserror::Error)]
pub enum KeyStoreError {
    #[error("failed to build JWKS HTTP client: {0}")]
    Client(String),
    #[error("failed to fetch JWKS from {url}: {message}")]
    Fetch { url: String, message: String },
    #[error("JWKS endpoint {url} returned HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("failed to decode JWKS from {url}: {message}")]
    Decode { url: String, message: String },
}

/// One verification key published by the identity provider.
///
/// Immutable once built; a refresh replaces it rather than mutating it.
pub struct SigningKey {
    pub key_id: String,
    pub decoding_key: DecodingKey,
    pub fetched_at: DateTime<Utc>,
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKey")
            .field("key_id", &self.key_id)
            .field("fetched_at", &self.fetched_at)
            .finish_non_exhaustive()
    }
}

/// Snapshot of the provider's keys, indexed by `kid`.
#[derive(Debug)]
struct KeySet {
    keys: HashMap<String, Arc<SigningKey>>,
    last_refresh_at: DateTime<Utc>,
}

/// Wire form of the JWKS document.
#[derive(Debug, Deserialize)]
struct JwksDocument {
    keys: Vec<JwkEntry>,
}

/// Wire form of one JWKS entry. Only the RSA signing parameters are read.
#[derive(Debug, Deserialize)]
struct JwkEntry {
    kty: String,
    #[serde(default)]
    kid: Option<String>,
    #[serde(default, rename = "use")]
    key_use: Option<String>,
    #[serde(default)]
    n: Option<String>,
    #[serde(default)]
    e: Option<String>,
}

/// Process-wide cache of the identity provider's signing keys.
///
/// Cheap to clone; clones share the same cache.
#[derive(Clone)]
pub struct KeyStore {
    /// JWKS endpoint URL
    jwks_url: Arc<str>,
    /// Minimum spacing between refresh attempts
    refresh_interval: Duration,
    /// Current key set, swapped whole on refresh
    key_set: Arc<RwLock<Arc<KeySet>>>,
    /// Time of the last fetch attempt, stamped before the fetch starts
    last_attempt: Arc<Mutex<Instant>>,
    /// HTTP client
    client: reqwest::Client,
}

impl std::fmt::Debug for KeyStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyStore")
            .field("jwks_url", &self.jwks_url)
            .field("refresh_interval", &self.refresh_interval)
            .finish_non_exhaustive()
    }
}

impl KeyStore {
    /// Fetch the key set and build the store.
    ///
    /// # Arguments
    /// - `jwks_url`: e.g. `https://tenant.example.com/.well-known/jwks.json`
    /// - `refresh_interval`: throttle for refresh-on-miss
    pub async fn initialize(
        jwks_url: impl Into<String>,
        refresh_interval: Duration,
    ) -> Result<Self, KeyStoreError> {
        let jwks_url: String = jwks_url.into();
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .map_err(|e| KeyStoreError::Client(e.to_string()))?;

        let attempted_at = Instant::now();
        let key_set = fetch_key_set(&client, &jwks_url).await?;

        tracing::info!(
            jwks_url = %jwks_url,
            key_count = key_set.keys.len(),
            "JWKS loaded"
        );
        if key_set.keys.is_empty() {
            tracing::warn!(jwks_url = %jwks_url, "JWKS contains no usable RSA signing keys");
        }

        Ok(Self {
            jwks_url: jwks_url.into(),
            refresh_interval,
            key_set: Arc::new(RwLock::new(Arc::new(key_set))),
            last_attempt: Arc::new(Mutex::new(attempted_at)),
            client,
        })
    }

    /// Get the JWKS URL.
    pub fn jwks_url(&self) -> &str {
        &self.jwks_url
    }

    /// Number of keys in the current set.
    pub async fn key_count(&self) -> usize {
        self.key_set.read().await.keys.len()
    }

    /// When the current set was fetched.
    pub async fn last_refresh_at(&self) -> DateTime<Utc> {
        self.key_set.read().await.last_refresh_at
    }

    /// Resolve the signing key for `kid`, refreshing on a miss if the
    /// throttle allows it.
    ///
    /// A throttled miss never waits on an in-flight refresh.
    pub async fn lookup(&self, kid: &str) -> Result<Arc<SigningKey>, AuthError> {
        if let Some(key) = self.cached(kid).await {
            return Ok(key);
        }

        if !self.claim_refresh() {
            // A refresh that finished after the first read may have the key.
            if let Some(key) = self.cached(kid).await {
                return Ok(key);
            }
            tracing::debug!(kid = %kid, "JWKS refresh throttled");
            return Err(AuthError::UnknownKey(kid.to_string()));
        }

        // The refresh runs detached: if the requesting task is dropped
        // mid-fetch, the fetch still completes and lands in the cache.
        let store = self.clone();
        let owned_kid = kid.to_string();
        match tokio::spawn(async move { store.refresh(&owned_kid).await }).await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(kid = %kid, error = %e, "JWKS refresh task failed");
                Err(AuthError::UnknownKey(kid.to_string()))
            }
        }
    }

    async fn cached(&self, kid: &str) -> Option<Arc<SigningKey>> {
        self.key_set.read().await.keys.get(kid).cloned()
    }

    /// Take the refresh slot if the interval has elapsed since the last
    /// attempt. The stamp lands before any fetch starts.
    fn claim_refresh(&self) -> bool {
        let mut last_attempt = self
            .last_attempt
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if last_attempt.elapsed() < self.refresh_interval {
            return false;
        }
        *last_attempt = Instant::now();
        true
    }

    async fn refresh(&self, kid: &str) -> Result<Arc<SigningKey>, AuthError> {
        match fetch_key_set(&self.client, &self.jwks_url).await {
            Ok(fresh) => {
                tracing::info!(
                    kid = %kid,
                    key_count = fresh.keys.len(),
                    "JWKS refreshed on key miss"
                );
                *self.key_set.write().await = Arc::new(fresh);
            }
            Err(e) => {
                tracing::warn!(kid = %kid, error = %e, "JWKS refresh failed");
                return Err(AuthError::UnknownKey(kid.to_string()));
            }
        }

        self.cached(kid)
            .await
            .ok_or_else(|| AuthError::UnknownKey(kid.to_string()))
    }
}

/// Fetch and parse the JWKS document.
async fn fetch_key_set(client: &reqwest::Client, url: &str) -> Result<KeySet, KeyStoreError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| KeyStoreError::Fetch {
            url: url.to_string(),
            message: e.to_string(),
        })?;

    if response.status() != reqwest::StatusCode::OK {
        return Err(KeyStoreError::Status {
            url: url.to_string(),
            status: response.status().as_u16(),
        });
    }

    let document: JwksDocument = response.json().await.map_err(|e| KeyStoreError::Decode {
        url: url.to_string(),
        message: e.to_string(),
    })?;

    Ok(build_key_set(document, Utc::now()))
}

/// Convert the usable entries of a JWKS document into a key set.
///
/// Entries that are not RSA, not marked for signing, lack a `kid`, or carry
/// undecodable parameters are skipped.
fn build_key_set(document: JwksDocument, fetched_at: DateTime<Utc>) -> KeySet {
    let mut keys = HashMap::new();

    for entry in document.keys {
        if entry.kty != "RSA" || entry.key_use.as_deref() != Some("sig") {
            continue;
        }
        let Some(kid) = entry.kid.filter(|k| !k.is_empty()) else {
            tracing::warn!("Skipping JWKS entry without kid");
            continue;
        };
        let (Some(n), Some(e)) = (entry.n, entry.e) else {
            tracing::warn!(kid = %kid, "Skipping RSA JWKS entry without modulus/exponent");
            continue;
        };
        if n.is_empty() || e.is_empty() {
            tracing::warn!(kid = %kid, "Skipping RSA JWKS entry with empty modulus/exponent");
            continue;
        }

        match DecodingKey::from_rsa_components(&n, &e) {
            Ok(decoding_key) => {
                keys.insert(
                    kid.clone(),
                    Arc::new(SigningKey {
                        key_id: kid,
                        decoding_key,
                        fetched_at,
                    }),
                );
            }
            Err(err) => {
                tracing::warn!(kid = %kid, error = %err, "Skipping undecodable RSA JWKS entry");
            }
        }
    }

    KeySet {
        keys,
        last_refresh_at: fetched_at,
    }
}
