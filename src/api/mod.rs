// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{middleware, routing::get, Router};
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::trust_gateway,
    identity::Role,
    models::{CompositeIdentity, TenantMembership, WorkspaceUser, WorkspaceUserPage},
    state::AppState,
};

pub mod users;

/// Build the gateway router.
///
/// Every `/v1` route sits behind the trust gateway; the OpenAPI document
/// and Swagger UI do not.
pub fn router(state: AppState) -> Router {
    let v1_routes = Router::new()
        .route("/me", get(users::get_me))
        .route("/workspace/users", get(users::list_workspace_users))
        .route_layer(middleware::from_fn_with_state(
            state.verifier.clone(),
            trust_gateway,
        ))
        .with_state(state);

    Router::new()
        .nest("/v1", v1_routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
}

#[derive(OpenApi)]
#[openapi(
    paths(users::get_me, users::list_workspace_users),
    components(
        schemas(
            CompositeIdentity,
            TenantMembership,
            WorkspaceUser,
            WorkspaceUserPage,
            Role
        )
    ),
    tags(
        (name = "Identity", description = "Composite identity of the authenticated caller")
    )
)]
struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_gateway_routes() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/v1/me"));
        assert!(doc.paths.paths.contains_key("/v1/workspace/users"));
        assert_eq!(doc.paths.paths.len(), 2);
    }
}
