// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Identity endpoints for the authenticated caller.

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{
    auth::TrustedSubject,
    error::ApiError,
    identity::IdentityError,
    models::{CompositeIdentity, PageRequest, WorkspaceUserPage},
    state::AppState,
};

/// Query parameters for GET /v1/workspace/users
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListWorkspaceUsersQuery {
    /// Page size; defaults to 10, capped at 100
    pub page_size: Option<u32>,
    /// Token from a previous page's `nextPageToken`
    pub page_token: Option<String>,
}

impl From<ListWorkspaceUsersQuery> for PageRequest {
    fn from(query: ListWorkspaceUsersQuery) -> Self {
        Self {
            page_size: query.page_size.unwrap_or(0),
            page_token: query.page_token,
        }
    }
}

/// Get the caller's composite identity.
///
/// Resolves the caller's workspace user, then the tenants that workspace user
/// belongs to. Tenants are listed in the order the tenant service returns them.
#[utoipa::path(
    get,
    path = "/v1/me",
    tag = "Identity",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Composite identity", body = CompositeIdentity),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 404, description = "Caller has no workspace user"),
        (status = 503, description = "Identity services unavailable or request canceled"),
    )
)]
pub async fn get_me(
    State(state): State<AppState>,
    TrustedSubject(subject): TrustedSubject,
) -> Result<Json<CompositeIdentity>, IdentityError> {
    let cancel = state.shutdown.child_token();
    let identity = state.aggregator.get_composite(&subject, &cancel).await?;
    Ok(Json(identity))
}

/// List users in the caller's workspace, newest first.
#[utoipa::path(
    get,
    path = "/v1/workspace/users",
    tag = "Identity",
    security(("bearer" = [])),
    params(ListWorkspaceUsersQuery),
    responses(
        (status = 200, description = "Page of workspace users", body = WorkspaceUserPage),
        (status = 400, description = "Malformed query parameters"),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 404, description = "Caller has no workspace user"),
        (status = 503, description = "Identity services unavailable or request canceled"),
    )
)]
pub async fn list_workspace_users(
    State(state): State<AppState>,
    TrustedSubject(subject): TrustedSubject,
    query: Result<Query<ListWorkspaceUsersQuery>, QueryRejection>,
) -> Result<Json<WorkspaceUserPage>, Response> {
    let Query(query) = query.map_err(|rejection| {
        ApiError::invalid_query(rejection.body_text()).into_response()
    })?;

    let cancel = state.shutdown.child_token();
    let page = state
        .aggregator
        .list_workspace_users(&subject, &query.into(), &cancel)
        .await
        .map_err(IntoResponse::into_response)?;
    Ok(Json(page))
}
