// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Client-facing failures that are not authentication failures.
//!
//! The body mirrors the 401 challenge in [`crate::auth::error`]:
//! `{"error": <message>, "error_code": <code>}`. Messages are fixed strings;
//! upstream detail is logged, never echoed.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// A non-authentication failure as the gateway reports it to callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    error_code: &'a str,
}

impl ApiError {
    /// The subject verified but has no workspace user.
    pub fn unprovisioned() -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            code: "not_provisioned",
            message: "Workspace user is not provisioned".to_string(),
        }
    }

    /// Query string did not parse; `detail` comes from the extractor.
    pub fn invalid_query(detail: impl std::fmt::Display) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            code: "invalid_query",
            message: format!("Invalid query: {detail}"),
        }
    }

    /// A downstream identity lookup failed or the request was canceled.
    pub fn identity_unavailable() -> Self {
        Self {
            status: StatusCode::SERVICE_UNAVAILABLE,
            code: "identity_unavailable",
            message: "Identity service temporarily unavailable".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: &self.message,
            error_code: self.code,
        });
        (self.status, body).into_response()
    }
}
