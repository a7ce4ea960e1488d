//! Permission resolution endpoints
//!
//! Thin JSON adapters over the context resolver, the permission resolver and
//! the gate. Identity is taken from the request body; authenticating the
//! caller is the job of whoever sits in front of this service.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::app::AppState;
use crate::authz::{Actor, ResolutionRequest};
use crate::errors::AppResult;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PermissionsResponse {
    #[schema(example = json!(["picture:view", "picture:upload"]))]
    pub permissions: Vec<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CheckRequest {
    #[serde(flatten)]
    pub request: ResolutionRequest,
    #[schema(example = "picture:edit")]
    pub permission: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CheckResponse {
    pub allowed: bool,
    pub permission: String,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct SpaceViewRequest {
    #[serde(default)]
    pub actor_user_id: Option<i64>,
    #[serde(default)]
    pub actor_is_admin: bool,
    /// Omit for the public gallery
    #[serde(default)]
    pub space_id: Option<i64>,
}

#[utoipa::path(
    post,
    path = "/authz/resolve",
    tag = "Authz",
    request_body = ResolutionRequest,
    responses(
        (status = 200, description = "Permissions held on the resource", body = PermissionsResponse),
        (status = 400, description = "Generic id arrived on an unrecognized route"),
        (status = 401, description = "Actor missing for a concrete resource"),
        (status = 404, description = "Referenced picture, space or member not found"),
    )
)]
pub async fn resolve_permissions(
    State(state): State<AppState>,
    Json(payload): Json<ResolutionRequest>,
) -> AppResult<Json<PermissionsResponse>> {
    let reference = state.contexts.resolve(&payload)?;
    let actor = payload.actor();

    let permissions = state.resolver().resolve(actor.as_ref(), reference).await?;

    Ok(Json(PermissionsResponse {
        permissions: permissions.into_vec(),
    }))
}

#[utoipa::path(
    post,
    path = "/authz/check",
    tag = "Authz",
    request_body = CheckRequest,
    responses(
        (status = 200, description = "Operation allowed", body = CheckResponse),
        (status = 400, description = "Generic id arrived on an unrecognized route"),
        (status = 401, description = "Actor missing for a concrete resource"),
        (status = 403, description = "Permission not held"),
        (status = 404, description = "Referenced picture, space or member not found"),
    )
)]
pub async fn check_permission(
    State(state): State<AppState>,
    Json(payload): Json<CheckRequest>,
) -> AppResult<Json<CheckResponse>> {
    let reference = state.contexts.resolve(&payload.request)?;
    let actor = payload.request.actor();

    state
        .gate
        .check(actor.as_ref(), reference, &payload.permission)
        .await?;

    Ok(Json(CheckResponse {
        allowed: true,
        permission: payload.permission,
    }))
}

#[utoipa::path(
    post,
    path = "/authz/space-view",
    tag = "Authz",
    request_body = SpaceViewRequest,
    responses(
        (status = 200, description = "Permissions to display for the space", body = PermissionsResponse),
        (status = 404, description = "Space not found"),
    )
)]
pub async fn space_view_permissions(
    State(state): State<AppState>,
    Json(payload): Json<SpaceViewRequest>,
) -> AppResult<Json<PermissionsResponse>> {
    let actor = payload
        .actor_user_id
        .map(|user_id| Actor::new(user_id).with_admin(payload.actor_is_admin));

    let permissions = state
        .resolver()
        .space_view_permissions(actor.as_ref(), payload.space_id)
        .await?;

    Ok(Json(PermissionsResponse {
        permissions: permissions.into_vec(),
    }))
}
