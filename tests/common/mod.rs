// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Shared fixtures for the integration tests: a local JWKS endpoint, token
//! minting with the RSA fixtures, and a router wired to the seeded directory.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};
use std::time::Duration;

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::Utc;
use identity_gateway::{
    api::router,
    auth::{KeyStore, TokenVerifier},
    identity::IdentityAggregator,
    state::AppState,
    store::InMemoryDirectory,
};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::{json, Value};

pub const ISSUER: &str = "https://tenant.example.com/";
pub const AUDIENCE: &str = "https://gateway.example.com";

pub const PRIMARY_KID: &str = "primary-2026";
pub const ROTATED_KID: &str = "rotated-2026";

pub const PRIMARY_PEM: &str = include_str!("../fixtures/primary_rsa.pem");
pub const ROTATED_PEM: &str = include_str!("../fixtures/rotated_rsa.pem");

/// Base64url modulus of `primary_rsa.pem`.
pub const PRIMARY_MODULUS: &str = concat!(
    "335RzVj1ipWIxWPb42hWAepxTnC_pbrRR1r65i6Iq7UQ5qzbntu0qIqvOO1Z_TW9",
    "xTF7M_KH41cpxwjC3urrXer9nTmgQN_ymphuxNnXTuId0Db5dQvEHL8lwtdao1Gc",
    "q3HZYu6ONTfxcfEA0BPK1XvAV9dzm1S0xubG4Vy4mP-2Hd_5ALMm9iXR4dfsBF0e",
    "X4IdG3xv0Dh0BhL7fkVnJWWRYrFB9ZxjJCOwscMacRHvPeSzqRLbunTFmD7O10LR",
    "_YsUiWlXSaGrdkNNX1qGRc8Id95zCg_zrDefab0bUr7hEZrgb46vX1LGfh9uOP4I",
    "96F8j87na2HAVfTs3Ag2hw",
);

/// Base64url modulus of `rotated_rsa.pem`.
pub const ROTATED_MODULUS: &str = concat!(
    "33bWZjP9U9C3bSYDYaUa45Uv7W83JQcAOpLaqnyl3GwVgeCREtDy5L8rs-y_3n3i",
    "wRNAF4kswrskcH18hO-mXBHjtAGypUiyYzwwzJDXgU57hP_MElFSXOFvnm-X5Vcd",
    "cXRXGiRgktwnZ0hWZtunNkKkzl9PXMqzSgkb3EksvPM7An1dYq2WY-GP8Qm-75En",
    "Y6l28R1NoYDytVedZ0CsT3_lT986zuxevEYpUOmxjGdgO2dT-bWdScahbxDBCZWj",
    "YGSPnuG5GxjsYgp4mmudj9KZ7lh5Gn1xUYHrvenUeY2kaW47bjeQlFNvE0nJaBWX",
    "liDY_CNeDcX4SqTtVauYww",
);

pub const EXPONENT: &str = "AQAB";

/// Seeded subject with memberships in tenant-002 then tenant-001.
pub const SEEDED_SUBJECT: &str = "auth0|user002";

pub fn rsa_jwk(kid: &str, modulus: &str) -> Value {
    json!({
        "kty": "RSA",
        "use": "sig",
        "alg": "RS256",
        "kid": kid,
        "n": modulus,
        "e": EXPONENT,
    })
}

struct JwksState {
    keys: Mutex<Vec<Value>>,
    status: Mutex<StatusCode>,
    delay: Mutex<Duration>,
    hits: AtomicUsize,
}

async fn jwks_handler(State(state): State<Arc<JwksState>>) -> axum::response::Response {
    state.hits.fetch_add(1, Ordering::SeqCst);
    let delay = *state.delay.lock().unwrap();
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
    let status = *state.status.lock().unwrap();
    if status != StatusCode::OK {
        return status.into_response();
    }
    let keys = state.keys.lock().unwrap().clone();
    Json(json!({ "keys": keys })).into_response()
}

/// Local JWKS endpoint whose key set, status and latency can change mid-test.
#[derive(Clone)]
pub struct JwksServer {
    addr: SocketAddr,
    state: Arc<JwksState>,
}

impl JwksServer {
    pub async fn start(keys: Vec<Value>) -> Self {
        let state = Arc::new(JwksState {
            keys: Mutex::new(keys),
            status: Mutex::new(StatusCode::OK),
            delay: Mutex::new(Duration::ZERO),
            hits: AtomicUsize::new(0),
        });
        let app = Router::new()
            .route("/.well-known/jwks.json", get(jwks_handler))
            .with_state(state.clone());
        let addr = serve(app).await;
        Self { addr, state }
    }

    /// Server publishing only the primary key.
    pub async fn primary() -> Self {
        Self::start(vec![rsa_jwk(PRIMARY_KID, PRIMARY_MODULUS)]).await
    }

    pub fn url(&self) -> String {
        format!("http://{}/.well-known/jwks.json", self.addr)
    }

    /// Number of JWKS requests served so far.
    pub fn hits(&self) -> usize {
        self.state.hits.load(Ordering::SeqCst)
    }

    pub fn set_keys(&self, keys: Vec<Value>) {
        *self.state.keys.lock().unwrap() = keys;
    }

    pub fn set_status(&self, status: StatusCode) {
        *self.state.status.lock().unwrap() = status;
    }

    /// Hold every later response for `delay` before answering.
    pub fn set_delay(&self, delay: Duration) {
        *self.state.delay.lock().unwrap() = delay;
    }

    /// Poll until the server has counted `expected` requests.
    pub async fn wait_for_hits(&self, expected: usize) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while self.hits() < expected {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("JWKS request never arrived");
    }
}

/// Serve `app` on an ephemeral local port.
pub async fn serve(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

pub fn now() -> i64 {
    Utc::now().timestamp()
}

/// Claims accepted by the default verifier.
pub fn valid_claims(sub: &str) -> Value {
    json!({
        "sub": sub,
        "iss": ISSUER,
        "aud": [AUDIENCE, "https://tenant.example.com/userinfo"],
        "iat": now(),
        "exp": now() + 3600,
        "email": "user02@example.com",
    })
}

/// Sign `claims` with RS256 using `pem`, stamping `kid` into the header.
pub fn mint(pem: &str, kid: Option<&str>, claims: &Value) -> String {
    mint_with(Algorithm::RS256, pem, kid, claims)
}

pub fn mint_with(alg: Algorithm, pem: &str, kid: Option<&str>, claims: &Value) -> String {
    let mut header = Header::new(alg);
    header.kid = kid.map(str::to_string);
    let key = EncodingKey::from_rsa_pem(pem.as_bytes()).expect("fixture key");
    encode(&header, claims, &key).expect("sign")
}

/// Token assembled by hand, for headers a signer would refuse to produce.
pub fn hand_crafted(header: &Value, claims: &Value, signature: &str) -> String {
    format!(
        "{}.{}.{}",
        URL_SAFE_NO_PAD.encode(header.to_string()),
        URL_SAFE_NO_PAD.encode(claims.to_string()),
        signature
    )
}

pub async fn verifier_for(server: &JwksServer, refresh_interval: Duration) -> TokenVerifier {
    let keys = KeyStore::initialize(server.url(), refresh_interval)
        .await
        .expect("key store");
    TokenVerifier::new(keys, ISSUER, AUDIENCE)
}

/// Router backed by the seeded in-memory directory.
pub fn seeded_app(verifier: TokenVerifier) -> Router {
    let directory = Arc::new(InMemoryDirectory::seeded());
    let aggregator = IdentityAggregator::new(directory.clone(), directory);
    router(AppState::new(verifier, aggregator))
}

pub async fn read_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json")
}
