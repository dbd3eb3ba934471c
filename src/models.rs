// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Identity Data Models
//!
//! Types exchanged with the downstream identity services and returned by the
//! API. All types derive `Serialize`, `Deserialize`, and `ToSchema`, and use
//! camelCase field names on the wire.
//!
//! ## Model Categories
//!
//! - **Workspace users**: the caller's account inside a workspace
//! - **Tenant memberships**: the tenants a workspace user belongs to
//! - **Composite identity**: both of the above, composed per request

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::identity::Role;

// =============================================================================
// Workspace Users
// =============================================================================

/// A workspace user as reported by the workspace-identity service.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceUser {
    /// Workspace the user belongs to.
    pub workspace_id: String,
    /// Workspace user ID; the key for the tenant lookup.
    pub workspace_user_id: String,
    /// Email address.
    pub email: String,
    /// Display name.
    pub name: String,
}

/// Page request for workspace user listings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageRequest {
    /// Requested page size; 0 selects the default.
    pub page_size: u32,
    /// Opaque token from a previous page.
    pub page_token: Option<String>,
}

/// One page of users in the caller's workspace.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceUserPage {
    pub users: Vec<WorkspaceUser>,
    /// Token for the next page; absent on the last page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

// =============================================================================
// Tenant Memberships
// =============================================================================

/// A workspace user's membership in one tenant.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TenantMembership {
    pub tenant_id: String,
    /// The user's ID inside the tenant.
    pub tenant_user_id: String,
    pub role: Role,
}

// =============================================================================
// Composite Identity
// =============================================================================

/// The caller's full identity, composed per request and never cached.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CompositeIdentity {
    pub workspace_id: String,
    pub workspace_user_id: String,
    pub email: String,
    pub name: String,
    /// Memberships in the order the tenant service returned them.
    pub tenants: Vec<TenantMembership>,
}

impl CompositeIdentity {
    /// Combine a resolved workspace user with its memberships.
    pub fn compose(user: WorkspaceUser, tenants: Vec<TenantMembership>) -> Self {
        Self {
            workspace_id: user.workspace_id,
            workspace_user_id: user.workspace_user_id,
            email: user.email,
            name: user.name,
            tenants,
        }
    }
}
