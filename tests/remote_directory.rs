// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! HTTP directory clients against local stand-ins for the downstream services.

mod common;

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::Query,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use common::serve;
use identity_gateway::{
    identity::{
        remote::http_client, IdentityAggregator, IdentityError, LookupError,
        RemoteTenantDirectory, RemoteWorkspaceDirectory, Role, TenantDirectory,
        WorkspaceDirectory,
    },
    models::PageRequest,
};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use url::Url;

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

async fn workspace_me(headers: HeaderMap) -> Response {
    match header(&headers, "x-user-id").as_deref() {
        Some("auth0|user002") => Json(json!({
            "workspaceId": "ws-001",
            "workspaceUserId": "wsu-002",
            "email": "user02@example.com",
            "name": "User 02",
        }))
        .into_response(),
        Some("auth0|broken") => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        Some("auth0|garbled") => "not json".into_response(),
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn workspace_list(
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if header(&headers, "x-user-id").as_deref() != Some("auth0|user002") {
        return StatusCode::NOT_FOUND.into_response();
    }
    Json(json!({
        "users": [{
            "workspaceId": "ws-001",
            "workspaceUserId": "wsu-003",
            "email": "user03@example.com",
            "name": "User 03",
        }],
        "nextPageToken": format!(
            "{}:{}",
            query.get("page_size").cloned().unwrap_or_default(),
            query.get("page_token").cloned().unwrap_or_default()
        ),
    }))
    .into_response()
}

async fn tenant_users(headers: HeaderMap) -> Response {
    match header(&headers, "x-workspace-user-id").as_deref() {
        Some("wsu-002") => Json(json!({
            "users": [
                { "tenantId": "tenant-002", "tenantUserId": "tu-004", "role": "member" },
                { "tenantId": "tenant-001", "tenantUserId": "tu-005", "role": "OWNER" },
            ]
        }))
        .into_response(),
        Some("wsu-003") => Json(json!({ "users": [] })).into_response(),
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn start() -> (RemoteWorkspaceDirectory, RemoteTenantDirectory) {
    let identity = serve(
        Router::new()
            .route("/v1/workspace-users/me", get(workspace_me))
            .route("/v1/workspace-users", get(workspace_list)),
    )
    .await;
    let users = serve(Router::new().route("/v1/tenant-users", get(tenant_users))).await;

    let client = http_client().unwrap();
    (
        RemoteWorkspaceDirectory::new(
            Url::parse(&format!("http://{identity}/")).unwrap(),
            client.clone(),
        ),
        RemoteTenantDirectory::new(Url::parse(&format!("http://{users}")).unwrap(), client),
    )
}

#[tokio::test]
async fn workspace_lookup_sends_trusted_subject() {
    let (workspaces, _) = start().await;
    let user = workspaces.get_workspace_user("auth0|user002").await.unwrap();
    assert_eq!(user.workspace_user_id, "wsu-002");
    assert_eq!(user.name, "User 02");
}

#[tokio::test]
async fn status_and_body_failures_are_classified() {
    let (workspaces, _) = start().await;

    assert_eq!(
        workspaces.get_workspace_user("auth0|ghost").await,
        Err(LookupError::NotFound)
    );
    assert!(matches!(
        workspaces.get_workspace_user("auth0|broken").await,
        Err(LookupError::Unavailable(_))
    ));
    assert!(matches!(
        workspaces.get_workspace_user("auth0|garbled").await,
        Err(LookupError::Unavailable(_))
    ));
}

#[tokio::test]
async fn listing_forwards_page_parameters() {
    let (workspaces, _) = start().await;
    let page = workspaces
        .list_workspace_users(
            "auth0|user002",
            &PageRequest {
                page_size: 5,
                page_token: Some("10".to_string()),
            },
        )
        .await
        .unwrap();

    assert_eq!(page.users[0].workspace_user_id, "wsu-003");
    assert_eq!(page.next_page_token.as_deref(), Some("5:10"));
}

#[tokio::test]
async fn tenant_lookup_preserves_order_and_normalizes_roles() {
    let (_, tenants) = start().await;
    let memberships = tenants.get_tenant_memberships("wsu-002").await.unwrap();

    let order: Vec<_> = memberships.iter().map(|m| m.tenant_id.as_str()).collect();
    assert_eq!(order, ["tenant-002", "tenant-001"]);
    assert_eq!(memberships[0].role, Role::Member);
    assert_eq!(memberships[1].role, Role::Unspecified);

    assert!(tenants.get_tenant_memberships("wsu-003").await.unwrap().is_empty());
    assert_eq!(
        tenants.get_tenant_memberships("wsu-404").await,
        Err(LookupError::NotFound)
    );
}

#[tokio::test]
async fn aggregator_composes_across_both_services() {
    let (workspaces, tenants) = start().await;
    let aggregator = IdentityAggregator::new(Arc::new(workspaces), Arc::new(tenants));
    let cancel = CancellationToken::new();

    let identity = aggregator
        .get_composite("auth0|user002", &cancel)
        .await
        .unwrap();
    assert_eq!(identity.workspace_user_id, "wsu-002");
    assert_eq!(identity.tenants.len(), 2);
    assert_eq!(identity.tenants[0].tenant_user_id, "tu-004");

    assert!(matches!(
        aggregator.get_composite("auth0|broken", &cancel).await,
        Err(IdentityError::UpstreamUnavailable(_))
    ));
    assert_eq!(
        aggregator.get_composite("auth0|ghost", &cancel).await,
        Err(IdentityError::NotFound)
    );
}
