// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory workspace and tenant directories.
//!
//! Stands in for the workspace-identity and tenant services when no
//! downstream URLs are configured, and backs the end-to-end tests. Records
//! are inserted before the store is shared and never change afterwards.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use crate::identity::{LookupError, Role, TenantDirectory, WorkspaceDirectory};
use crate::models::{PageRequest, TenantMembership, WorkspaceUser, WorkspaceUserPage};

/// Page size used when a request does not pick one.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Upper bound on a requested page size.
pub const MAX_PAGE_SIZE: usize = 100;

#[derive(Debug, Clone)]
pub struct WorkspaceUserRecord {
    pub id: String,
    pub workspace_id: String,
    /// Identity-provider subject (`sub` claim)
    pub subject_id: String,
    pub email: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl From<&WorkspaceUserRecord> for WorkspaceUser {
    fn from(record: &WorkspaceUserRecord) -> Self {
        Self {
            workspace_id: record.workspace_id.clone(),
            workspace_user_id: record.id.clone(),
            email: record.email.clone(),
            name: record.name.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TenantUserRecord {
    pub id: String,
    pub tenant_id: String,
    pub workspace_user_id: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    /// Workspace users keyed by subject
    workspace_users: HashMap<String, WorkspaceUserRecord>,
    /// Tenant users in insertion order
    tenant_users: Vec<TenantUserRecord>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Directory pre-populated with the demo workspace.
    ///
    /// `auth0|user002` belongs to two tenants, listed tenant-002 first.
    /// `auth0|user003` is provisioned but has no tenant memberships.
    pub fn seeded() -> Self {
        let now = Utc::now();
        let mut store = Self::new();

        for (id, subject, email, name, age_days) in [
            ("wsu-001", "auth0|6952b421821fed371daac9df", "user01@example.com", "User 01", 10),
            ("wsu-002", "auth0|user002", "user02@example.com", "User 02", 9),
            ("wsu-003", "auth0|user003", "user03@example.com", "User 03", 8),
        ] {
            store.insert_workspace_user(WorkspaceUserRecord {
                id: id.to_string(),
                workspace_id: "ws-001".to_string(),
                subject_id: subject.to_string(),
                email: email.to_string(),
                name: name.to_string(),
                created_at: now - Duration::days(age_days),
            });
        }

        for (id, tenant, workspace_user, role, age_days) in [
            ("tu-001", "tenant-001", "wsu-001", Role::Admin, 10),
            ("tu-002", "tenant-002", "wsu-001", Role::Member, 8),
            ("tu-003", "tenant-003", "wsu-001", Role::Viewer, 5),
            ("tu-004", "tenant-002", "wsu-002", Role::Member, 7),
            ("tu-005", "tenant-001", "wsu-002", Role::Viewer, 6),
        ] {
            store.insert_tenant_user(TenantUserRecord {
                id: id.to_string(),
                tenant_id: tenant.to_string(),
                workspace_user_id: workspace_user.to_string(),
                role,
                created_at: now - Duration::days(age_days),
            });
        }

        store
    }

    pub fn insert_workspace_user(&mut self, record: WorkspaceUserRecord) {
        self.workspace_users
            .insert(record.subject_id.clone(), record);
    }

    pub fn insert_tenant_user(&mut self, record: TenantUserRecord) {
        self.tenant_users.push(record);
    }
}

#[async_trait]
impl WorkspaceDirectory for InMemoryDirectory {
    async fn get_workspace_user(&self, subject: &str) -> Result<WorkspaceUser, LookupError> {
        self.workspace_users
            .get(subject)
            .map(WorkspaceUser::from)
            .ok_or(LookupError::NotFound)
    }

    async fn list_workspace_users(
        &self,
        subject: &str,
        page: &PageRequest,
    ) -> Result<WorkspaceUserPage, LookupError> {
        let caller = self
            .workspace_users
            .get(subject)
            .ok_or(LookupError::NotFound)?;

        let mut members: Vec<&WorkspaceUserRecord> = self
            .workspace_users
            .values()
            .filter(|record| record.workspace_id == caller.workspace_id)
            .collect();
        members.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));

        let page_size = match page.page_size as usize {
            0 => DEFAULT_PAGE_SIZE,
            n => n.min(MAX_PAGE_SIZE),
        };
        // Unparsable tokens restart from the first page.
        let start = page
            .page_token
            .as_deref()
            .and_then(|token| token.parse::<usize>().ok())
            .unwrap_or(0)
            .min(members.len());
        let end = start.saturating_add(page_size).min(members.len());

        Ok(WorkspaceUserPage {
            users: members[start..end].iter().map(|r| WorkspaceUser::from(*r)).collect(),
            next_page_token: (end < members.len()).then(|| end.to_string()),
        })
    }
}

#[async_trait]
impl TenantDirectory for InMemoryDirectory {
    async fn get_tenant_memberships(
        &self,
        workspace_user_id: &str,
    ) -> Result<Vec<TenantMembership>, LookupError> {
        Ok(self
            .tenant_users
            .iter()
            .filter(|record| record.workspace_user_id == workspace_user_id)
            .map(|record| TenantMembership {
                tenant_id: record.tenant_id.clone(),
                tenant_user_id: record.id.clone(),
                role: record.role,
            })
            .collect())
    }
}
