// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Tenant membership roles.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A workspace user's role inside one tenant.
///
/// The gateway propagates roles as reported by the tenant service and makes
/// no authorization decisions with them. Unknown role strings map to
/// [`Role::Unspecified`] instead of failing the whole membership list.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Role {
    /// Tenant administrator
    Admin,
    /// Regular member
    Member,
    /// Read-only access
    Viewer,
    /// Role not reported or not recognised
    #[default]
    Unspecified,
}

impl Role {
    /// Parse role from string (case-insensitive).
    pub fn parse(s: &str) -> Role {
        match s.to_lowercase().as_str() {
            "admin" => Role::Admin,
            "member" => Role::Member,
            "viewer" => Role::Viewer,
            _ => Role::Unspecified,
        }
    }
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        Role::parse(&value)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::Member => write!(f, "member"),
            Role::Viewer => write!(f, "viewer"),
            Role::Unspecified => write!(f, "unspecified"),
        }
    }
}
