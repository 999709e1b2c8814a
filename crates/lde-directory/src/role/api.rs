//! Roles API
//!
//! CRUD, group association, and role assignment across many users.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Response,
    Json,
};
use utoipa_axum::{router::OpenApiRouter, routes};

use crate::membership::BulkOutcome;
use crate::role::Role;
use crate::shared::api_common::{
    bulk_response, ApiJson, GroupIdRequest, GroupIdsRequest, GroupIdsResponse, UserIdsRequest,
};
use crate::shared::error::{DirectoryError, ErrorResponse};
use crate::user::User;
use crate::DirectoryState;

#[utoipa::path(
    post,
    path = "",
    tag = "roles",
    request_body = Role,
    responses(
        (status = 201, description = "Role created", body = Role),
        (status = 400, description = "Invalid payload", body = ErrorResponse),
        (status = 500, description = "Duplicate id or storage failure", body = ErrorResponse)
    )
)]
pub async fn create_role(
    State(state): State<DirectoryState>,
    ApiJson(role): ApiJson<Role>,
) -> Result<(StatusCode, Json<Role>), DirectoryError> {
    let role = state.entities.create(role).await?;
    Ok((StatusCode::CREATED, Json(role)))
}

#[utoipa::path(
    get,
    path = "",
    tag = "roles",
    responses((status = 200, description = "All roles ordered by name", body = Vec<Role>))
)]
pub async fn list_roles(State(state): State<DirectoryState>) -> Result<Json<Vec<Role>>, DirectoryError> {
    Ok(Json(state.entities.list::<Role>().await?))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "roles",
    params(("id" = String, Path, description = "Role ID")),
    responses(
        (status = 200, description = "Role found", body = Role),
        (status = 404, description = "Role not found", body = ErrorResponse)
    )
)]
pub async fn get_role(
    State(state): State<DirectoryState>,
    Path(id): Path<String>,
) -> Result<Json<Role>, DirectoryError> {
    Ok(Json(state.entities.get::<Role>(&id).await?))
}

/// Replace a role
///
/// Users keep the snapshot they were given; this does not touch them.
#[utoipa::path(
    put,
    path = "/{id}",
    tag = "roles",
    params(("id" = String, Path, description = "Role ID")),
    request_body = Role,
    responses(
        (status = 200, description = "Role updated", body = Role),
        (status = 404, description = "Role not found", body = ErrorResponse)
    )
)]
pub async fn update_role(
    State(state): State<DirectoryState>,
    Path(id): Path<String>,
    ApiJson(role): ApiJson<Role>,
) -> Result<Json<Role>, DirectoryError> {
    Ok(Json(state.entities.update(&id, role).await?))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "roles",
    params(("id" = String, Path, description = "Role ID")),
    responses(
        (status = 204, description = "Role deleted"),
        (status = 404, description = "Role not found", body = ErrorResponse)
    )
)]
pub async fn delete_role(
    State(state): State<DirectoryState>,
    Path(id): Path<String>,
) -> Result<StatusCode, DirectoryError> {
    state.entities.delete::<Role>(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/{id}/groups",
    tag = "roles",
    params(("id" = String, Path, description = "Role ID")),
    responses(
        (status = 200, description = "Associated group IDs", body = GroupIdsResponse),
        (status = 404, description = "Role not found", body = ErrorResponse)
    )
)]
pub async fn get_role_groups(
    State(state): State<DirectoryState>,
    Path(id): Path<String>,
) -> Result<Json<GroupIdsResponse>, DirectoryError> {
    let groups = state.membership.role_groups(&id).await?;
    Ok(Json(GroupIdsResponse { groups }))
}

/// Associate a group with the role
#[utoipa::path(
    post,
    path = "/{id}/groups",
    tag = "roles",
    params(("id" = String, Path, description = "Role ID")),
    request_body = GroupIdRequest,
    responses(
        (status = 204, description = "Group associated"),
        (status = 404, description = "Role not found", body = ErrorResponse),
        (status = 500, description = "Group already associated", body = ErrorResponse)
    )
)]
pub async fn add_group(
    State(state): State<DirectoryState>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<GroupIdRequest>,
) -> Result<StatusCode, DirectoryError> {
    state.membership.add_group_to_role(&id, &req.group_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/{id}/groups/bulk",
    tag = "roles",
    params(("id" = String, Path, description = "Role ID")),
    request_body = GroupIdsRequest,
    responses(
        (status = 204, description = "Groups associated"),
        (status = 404, description = "Role not found", body = ErrorResponse),
        (status = 500, description = "All groups already associated", body = ErrorResponse)
    )
)]
pub async fn add_groups(
    State(state): State<DirectoryState>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<GroupIdsRequest>,
) -> Result<StatusCode, DirectoryError> {
    state.membership.add_groups_to_role(&id, &req.group_ids).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete,
    path = "/{id}/groups/bulk",
    tag = "roles",
    params(("id" = String, Path, description = "Role ID")),
    request_body = GroupIdsRequest,
    responses(
        (status = 204, description = "Groups removed"),
        (status = 404, description = "Role not found", body = ErrorResponse),
        (status = 500, description = "None of the groups were associated", body = ErrorResponse)
    )
)]
pub async fn remove_groups(
    State(state): State<DirectoryState>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<GroupIdsRequest>,
) -> Result<StatusCode, DirectoryError> {
    state.membership.remove_groups_from_role(&id, &req.group_ids).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete,
    path = "/{id}/groups/{group_id}",
    tag = "roles",
    params(
        ("id" = String, Path, description = "Role ID"),
        ("group_id" = String, Path, description = "Group ID")
    ),
    responses(
        (status = 204, description = "Group removed"),
        (status = 404, description = "Role not found", body = ErrorResponse),
        (status = 500, description = "Group not associated", body = ErrorResponse)
    )
)]
pub async fn remove_group(
    State(state): State<DirectoryState>,
    Path((id, group_id)): Path<(String, String)>,
) -> Result<StatusCode, DirectoryError> {
    state.membership.remove_group_from_role(&id, &group_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Users holding a snapshot of the role
#[utoipa::path(
    get,
    path = "/{id}/users",
    tag = "roles",
    params(("id" = String, Path, description = "Role ID")),
    responses((status = 200, description = "Users with the role", body = Vec<User>))
)]
pub async fn get_role_users(
    State(state): State<DirectoryState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<User>>, DirectoryError> {
    Ok(Json(state.membership.users_with_role(&id).await?))
}

/// Assign the role to several users
#[utoipa::path(
    post,
    path = "/{id}/users/bulk",
    tag = "roles",
    params(("id" = String, Path, description = "Role ID")),
    request_body = UserIdsRequest,
    responses(
        (status = 204, description = "Assigned to every user"),
        (status = 200, description = "Assigned to some users", body = BulkOutcome),
        (status = 404, description = "Role not found", body = ErrorResponse),
        (status = 500, description = "Assigned to no user", body = ErrorResponse)
    )
)]
pub async fn assign_to_users(
    State(state): State<DirectoryState>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<UserIdsRequest>,
) -> Result<Response, DirectoryError> {
    let outcome = state.membership.bulk_assign_role_to_users(&id, &req.user_ids).await?;
    Ok(bulk_response(outcome))
}

/// Remove the role from several users
#[utoipa::path(
    delete,
    path = "/{id}/users/bulk",
    tag = "roles",
    params(("id" = String, Path, description = "Role ID")),
    request_body = UserIdsRequest,
    responses(
        (status = 204, description = "Removed from every user"),
        (status = 200, description = "Removed from some users", body = BulkOutcome),
        (status = 404, description = "Role not found", body = ErrorResponse),
        (status = 500, description = "Removed from no user", body = ErrorResponse)
    )
)]
pub async fn remove_from_users(
    State(state): State<DirectoryState>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<UserIdsRequest>,
) -> Result<Response, DirectoryError> {
    let outcome = state.membership.bulk_remove_role_from_users(&id, &req.user_ids).await?;
    Ok(bulk_response(outcome))
}

pub fn roles_router(state: DirectoryState) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(create_role, list_roles))
        .routes(routes!(get_role, update_role, delete_role))
        .routes(routes!(get_role_groups, add_group))
        .routes(routes!(add_groups, remove_groups))
        .routes(routes!(remove_group))
        .routes(routes!(get_role_users))
        .routes(routes!(assign_to_users, remove_from_users))
        .with_state(state)
}
