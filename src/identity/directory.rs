// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Downstream lookup capabilities consumed by the aggregator.
//!
//! The aggregator only depends on these traits, so the seeded in-memory
//! store and the HTTP clients for the real services are interchangeable.

use async_trait::async_trait;

use crate::models::{PageRequest, TenantMembership, WorkspaceUser, WorkspaceUserPage};

/// Failure of a single downstream lookup.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LookupError {
    /// The service answered and has no such record
    #[error("record not found")]
    NotFound,
    /// Transport, status or decoding failure
    #[error("lookup failed: {0}")]
    Unavailable(String),
}

/// Workspace-identity lookups, keyed by the trusted subject.
#[async_trait]
pub trait WorkspaceDirectory: Send + Sync {
    /// Resolve the workspace user provisioned for `subject`.
    async fn get_workspace_user(&self, subject: &str) -> Result<WorkspaceUser, LookupError>;

    /// List users in the workspace `subject` belongs to, newest first.
    async fn list_workspace_users(
        &self,
        subject: &str,
        page: &PageRequest,
    ) -> Result<WorkspaceUserPage, LookupError>;
}

/// Tenant-membership lookups, keyed by workspace user ID.
#[async_trait]
pub trait TenantDirectory: Send + Sync {
    /// Memberships of `workspace_user_id`, in the service's order.
    async fn get_tenant_memberships(
        &self,
        workspace_user_id: &str,
    ) -> Result<Vec<TenantMembership>, LookupError>;
}
