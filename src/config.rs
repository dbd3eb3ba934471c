// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Environment variable names, defaults, and the typed configuration loaded
//! from them at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `AUTH0_DOMAIN` | Identity provider domain; issuer is `https://<domain>/` | Required |
//! | `AUTH0_AUDIENCE` | Expected JWT audience | Required |
//! | `JWKS_URL` | Key-set endpoint override | `https://<domain>/.well-known/jwks.json` |
//! | `JWKS_REFRESH_INTERVAL_SECS` | Minimum gap between refreshes on unknown `kid` | `60` |
//! | `CLOCK_SKEW_LEEWAY_SECS` | Tolerance applied to `exp` and `nbf` | `0` |
//! | `IDENTITY_API_URL` | Workspace-identity service base URL | In-memory directory |
//! | `USER_API_URL` | Tenant service base URL | In-memory directory |
//! | `AGGREGATION_TIMEOUT_MS` | Deadline for one identity aggregation | `5000` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `TLS_CERT_PATH` | PEM certificate chain | Plain HTTP |
//! | `TLS_KEY_PATH` | PEM private key | Plain HTTP |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |
//!
//! `IDENTITY_API_URL`/`USER_API_URL` and `TLS_CERT_PATH`/`TLS_KEY_PATH` must
//! be set together.

use std::{net::SocketAddr, path::PathBuf, time::Duration};

use url::Url;

pub const AUTH0_DOMAIN_ENV: &str = "AUTH0_DOMAIN";
pub const AUTH0_AUDIENCE_ENV: &str = "AUTH0_AUDIENCE";
pub const JWKS_URL_ENV: &str = "JWKS_URL";
pub const JWKS_REFRESH_INTERVAL_ENV: &str = "JWKS_REFRESH_INTERVAL_SECS";
pub const CLOCK_SKEW_LEEWAY_ENV: &str = "CLOCK_SKEW_LEEWAY_SECS";
pub const IDENTITY_API_URL_ENV: &str = "IDENTITY_API_URL";
pub const USER_API_URL_ENV: &str = "USER_API_URL";
pub const AGGREGATION_TIMEOUT_ENV: &str = "AGGREGATION_TIMEOUT_MS";
pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const TLS_CERT_PATH_ENV: &str = "TLS_CERT_PATH";
pub const TLS_KEY_PATH_ENV: &str = "TLS_KEY_PATH";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 60;
const DEFAULT_AGGREGATION_TIMEOUT_MS: u64 = 5_000;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{var} is invalid: {message}")]
    Invalid { var: &'static str, message: String },
    #[error("{set} is set but {missing} is not; set both or neither")]
    Unpaired {
        set: &'static str,
        missing: &'static str,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

/// Base URLs of the two downstream identity services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownstreamConfig {
    pub identity_api_url: Url,
    pub user_api_url: Url,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsConfig {
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    /// Expected `iss`, always `https://<domain>/`
    pub issuer: String,
    pub audience: String,
    pub jwks_url: Url,
    pub jwks_refresh_interval: Duration,
    pub clock_skew_leeway_secs: u64,
    /// `None` selects the seeded in-memory directories
    pub downstream: Option<DownstreamConfig>,
    pub aggregation_timeout: Duration,
    pub bind_addr: SocketAddr,
    /// `None` serves plain HTTP
    pub tls: Option<TlsConfig>,
    pub log_format: LogFormat,
}

impl GatewayConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load using `lookup` to resolve variables. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let domain = get(AUTH0_DOMAIN_ENV).ok_or(ConfigError::Missing(AUTH0_DOMAIN_ENV))?;
        let domain = normalize_domain(&domain);
        if domain.is_empty() {
            return Err(ConfigError::Invalid {
                var: AUTH0_DOMAIN_ENV,
                message: "empty domain".to_string(),
            });
        }
        let audience = get(AUTH0_AUDIENCE_ENV).ok_or(ConfigError::Missing(AUTH0_AUDIENCE_ENV))?;

        let jwks_url = match get(JWKS_URL_ENV) {
            Some(raw) => parse_url(JWKS_URL_ENV, &raw)?,
            None => parse_url(
                AUTH0_DOMAIN_ENV,
                &format!("https://{domain}/.well-known/jwks.json"),
            )?,
        };

        let jwks_refresh_interval = Duration::from_secs(parse_number(
            JWKS_REFRESH_INTERVAL_ENV,
            get(JWKS_REFRESH_INTERVAL_ENV),
            DEFAULT_REFRESH_INTERVAL_SECS,
        )?);
        let clock_skew_leeway_secs =
            parse_number(CLOCK_SKEW_LEEWAY_ENV, get(CLOCK_SKEW_LEEWAY_ENV), 0u64)?;
        let aggregation_timeout = Duration::from_millis(parse_number(
            AGGREGATION_TIMEOUT_ENV,
            get(AGGREGATION_TIMEOUT_ENV),
            DEFAULT_AGGREGATION_TIMEOUT_MS,
        )?);
        if aggregation_timeout.is_zero() {
            return Err(ConfigError::Invalid {
                var: AGGREGATION_TIMEOUT_ENV,
                message: "must be greater than zero".to_string(),
            });
        }

        let downstream = match paired(
            (IDENTITY_API_URL_ENV, get(IDENTITY_API_URL_ENV)),
            (USER_API_URL_ENV, get(USER_API_URL_ENV)),
        )? {
            Some((identity, user)) => Some(DownstreamConfig {
                identity_api_url: parse_url(IDENTITY_API_URL_ENV, &identity)?,
                user_api_url: parse_url(USER_API_URL_ENV, &user)?,
            }),
            None => None,
        };

        let tls = paired(
            (TLS_CERT_PATH_ENV, get(TLS_CERT_PATH_ENV)),
            (TLS_KEY_PATH_ENV, get(TLS_KEY_PATH_ENV)),
        )?
        .map(|(cert, key)| TlsConfig {
            cert_path: PathBuf::from(cert),
            key_path: PathBuf::from(key),
        });

        let host = get(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port: u16 = parse_number(PORT_ENV, get(PORT_ENV), DEFAULT_PORT)?;
        let bind_addr = format!("{host}:{port}")
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::Invalid {
                var: HOST_ENV,
                message: format!("{e}"),
            })?;

        let log_format = match get(LOG_FORMAT_ENV).map(|v| v.to_lowercase()).as_deref() {
            None | Some("pretty") => LogFormat::Pretty,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    var: LOG_FORMAT_ENV,
                    message: format!("unknown format `{other}`"),
                })
            }
        };

        Ok(Self {
            issuer: format!("https://{domain}/"),
            audience,
            jwks_url,
            jwks_refresh_interval,
            clock_skew_leeway_secs,
            downstream,
            aggregation_timeout,
            bind_addr,
            tls,
            log_format,
        })
    }
}

/// Accept `tenant.auth0.com`, `https://tenant.auth0.com` or a trailing slash.
fn normalize_domain(raw: &str) -> String {
    raw.trim_start_matches("https://")
        .trim_start_matches("http://")
        .trim_end_matches('/')
        .to_string()
}

fn parse_url(var: &'static str, raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw).map_err(|e| ConfigError::Invalid {
        var,
        message: e.to_string(),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(ConfigError::Invalid {
            var,
            message: format!("unsupported scheme `{scheme}`"),
        }),
    }
}

fn parse_number<T: std::str::FromStr>(
    var: &'static str,
    raw: Option<String>,
    default: T,
) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match raw {
        Some(value) => value.parse().map_err(|e: T::Err| ConfigError::Invalid {
            var,
            message: e.to_string(),
        }),
        None => Ok(default),
    }
}

fn paired(
    (first_var, first): (&'static str, Option<String>),
    (second_var, second): (&'static str, Option<String>),
) -> Result<Option<(String, String)>, ConfigError> {
    match (first, second) {
        (Some(a), Some(b)) => Ok(Some((a, b))),
        (None, None) => Ok(None),
        (Some(_), None) => Err(ConfigError::Unpaired {
            set: first_var,
            missing: second_var,
        }),
        (None, Some(_)) => Err(ConfigError::Unpaired {
            set: second_var,
            missing: first_var,
        }),
    }
}
