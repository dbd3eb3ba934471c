// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! HTTP clients for the workspace-identity and tenant services.
//!
//! Both services sit behind the trust boundary and authenticate callers by
//! header only: the workspace-identity service reads `x-user-id`, the tenant
//! service reads `x-workspace-user-id`.

use std::time::Duration;

use async_trait::async_trait;
use axum::http::HeaderName;
use reqwest::{RequestBuilder, StatusCode};
use serde::{de::DeserializeOwned, Deserialize};
use url::Url;

use super::directory::{LookupError, TenantDirectory, WorkspaceDirectory};
use crate::auth::TRUSTED_SUBJECT_HEADER;
use crate::models::{PageRequest, TenantMembership, WorkspaceUser, WorkspaceUserPage};

/// Header carrying the resolved workspace user ID to the tenant service.
pub const WORKSPACE_USER_HEADER: HeaderName = HeaderName::from_static("x-workspace-user-id");

/// Per-request timeout for downstream calls.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Build the HTTP client shared by both directories.
pub fn http_client() -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()
}

/// Join `path` onto `base` regardless of a trailing slash on the base.
fn endpoint(base: &Url, path: &str) -> String {
    format!("{}/{}", base.as_str().trim_end_matches('/'), path)
}

/// Send `request` and decode a successful JSON body.
///
/// 404 maps to [`LookupError::NotFound`]; every other failure, including an
/// undecodable body, is [`LookupError::Unavailable`].
async fn fetch_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, LookupError> {
    let response = request
        .send()
        .await
        .map_err(|e| LookupError::Unavailable(e.to_string()))?;

    match response.status() {
        status if status.is_success() => response
            .json::<T>()
            .await
            .map_err(|e| LookupError::Unavailable(format!("invalid response body: {e}"))),
        StatusCode::NOT_FOUND => Err(LookupError::NotFound),
        status => Err(LookupError::Unavailable(format!("HTTP {status}"))),
    }
}

/// Workspace-identity service client.
#[derive(Clone)]
pub struct RemoteWorkspaceDirectory {
    base_url: Url,
    client: reqwest::Client,
}

impl RemoteWorkspaceDirectory {
    pub fn new(base_url: Url, client: reqwest::Client) -> Self {
        Self { base_url, client }
    }
}

#[async_trait]
impl WorkspaceDirectory for RemoteWorkspaceDirectory {
    async fn get_workspace_user(&self, subject: &str) -> Result<WorkspaceUser, LookupError> {
        let request = self
            .client
            .get(endpoint(&self.base_url, "v1/workspace-users/me"))
            .header(TRUSTED_SUBJECT_HEADER, subject);
        fetch_json(request).await
    }

    async fn list_workspace_users(
        &self,
        subject: &str,
        page: &PageRequest,
    ) -> Result<WorkspaceUserPage, LookupError> {
        let mut query = vec![("page_size", page.page_size.to_string())];
        if let Some(token) = &page.page_token {
            query.push(("page_token", token.clone()));
        }

        let request = self
            .client
            .get(endpoint(&self.base_url, "v1/workspace-users"))
            .header(TRUSTED_SUBJECT_HEADER, subject)
            .query(&query);
        fetch_json(request).await
    }
}

#[derive(Deserialize)]
struct TenantUsersResponse {
    #[serde(default)]
    users: Vec<TenantMembership>,
}

/// Tenant service client.
#[derive(Clone)]
pub struct RemoteTenantDirectory {
    base_url: Url,
    client: reqwest::Client,
}

impl RemoteTenantDirectory {
    pub fn new(base_url: Url, client: reqwest::Client) -> Self {
        Self { base_url, client }
    }
}

#[async_trait]
impl TenantDirectory for RemoteTenantDirectory {
    async fn get_tenant_memberships(
        &self,
        workspace_user_id: &str,
    ) -> Result<Vec<TenantMembership>, LookupError> {
        let request = self
            .client
            .get(endpoint(&self.base_url, "v1/tenant-users"))
            .header(WORKSPACE_USER_HEADER, workspace_user_id);
        let body: TenantUsersResponse = fetch_json(request).await?;
        Ok(body.users)
    }
}
