// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Composite identity aggregation.
//!
//! `get_composite` is a two-stage pipeline:
//!
//! 1. trusted subject → [`WorkspaceUser`] (workspace directory)
//! 2. workspace user ID → memberships (tenant directory)
//!
//! The stages run strictly in sequence because the second key only exists
//! once the first stage succeeds. Every stage races the request's
//! cancellation token and the aggregation deadline; losing either race fails
//! the whole operation with [`IdentityError::Canceled`].

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::directory::{LookupError, TenantDirectory, WorkspaceDirectory};
use super::error::IdentityError;
use crate::models::{CompositeIdentity, PageRequest, WorkspaceUser, WorkspaceUserPage};

/// Default deadline for one aggregation (5 seconds).
pub const DEFAULT_AGGREGATION_TIMEOUT: Duration = Duration::from_secs(5);

/// Composes the caller's identity from the two downstream directories.
#[derive(Clone)]
pub struct IdentityAggregator {
    workspaces: Arc<dyn WorkspaceDirectory>,
    tenants: Arc<dyn TenantDirectory>,
    timeout: Duration,
}

impl IdentityAggregator {
    pub fn new(workspaces: Arc<dyn WorkspaceDirectory>, tenants: Arc<dyn TenantDirectory>) -> Self {
        Self {
            workspaces,
            tenants,
            timeout: DEFAULT_AGGREGATION_TIMEOUT,
        }
    }

    /// Override the per-aggregation deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build the composite identity for a gateway-asserted subject.
    pub async fn get_composite(
        &self,
        trusted_subject: &str,
        cancel: &CancellationToken,
    ) -> Result<CompositeIdentity, IdentityError> {
        if trusted_subject.is_empty() {
            return Err(IdentityError::Unauthenticated);
        }
        let stage = StageGuard::new(cancel, self.timeout);

        let user: WorkspaceUser = stage
            .run(
                "workspace_user",
                self.workspaces.get_workspace_user(trusted_subject),
            )
            .await?;

        let tenants = stage
            .run(
                "tenant_memberships",
                self.tenants.get_tenant_memberships(&user.workspace_user_id),
            )
            .await?;

        tracing::debug!(
            workspace_user_id = %user.workspace_user_id,
            tenant_count = tenants.len(),
            "Composite identity assembled"
        );
        Ok(CompositeIdentity::compose(user, tenants))
    }

    /// List users in the caller's workspace.
    pub async fn list_workspace_users(
        &self,
        trusted_subject: &str,
        page: &PageRequest,
        cancel: &CancellationToken,
    ) -> Result<WorkspaceUserPage, IdentityError> {
        if trusted_subject.is_empty() {
            return Err(IdentityError::Unauthenticated);
        }
        StageGuard::new(cancel, self.timeout)
            .run(
                "workspace_users",
                self.workspaces.list_workspace_users(trusted_subject, page),
            )
            .await
    }
}

/// Cancellation and deadline shared by the stages of one operation.
struct StageGuard<'a> {
    cancel: &'a CancellationToken,
    deadline: Instant,
}

impl<'a> StageGuard<'a> {
    fn new(cancel: &'a CancellationToken, timeout: Duration) -> Self {
        Self {
            cancel,
            deadline: Instant::now() + timeout,
        }
    }

    async fn run<T>(
        &self,
        stage: &'static str,
        lookup: impl Future<Output = Result<T, LookupError>>,
    ) -> Result<T, IdentityError> {
        if self.cancel.is_cancelled() {
            return Err(IdentityError::Canceled);
        }

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                tracing::debug!(stage, "Identity lookup canceled");
                Err(IdentityError::Canceled)
            }
            _ = tokio::time::sleep_until(self.deadline) => {
                tracing::warn!(stage, "Identity lookup exceeded deadline");
                Err(IdentityError::Canceled)
            }
            result = lookup => result.map_err(|e| match e {
                LookupError::NotFound => IdentityError::NotFound,
                LookupError::Unavailable(message) => {
                    tracing::warn!(stage, error = %message, "Identity lookup failed");
                    IdentityError::UpstreamUnavailable(message)
                }
            }),
        }
    }
}
