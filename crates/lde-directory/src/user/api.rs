//! Users API
//!
//! CRUD plus the user-centred views of group membership and role assignment.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Response,
    Json,
};
use utoipa_axum::{router::OpenApiRouter, routes};

use crate::group::Group;
use crate::membership::BulkOutcome;
use crate::role::RoleSnapshot;
use crate::shared::api_common::{bulk_response, ApiJson, GroupIdsRequest, RoleIdRequest, RoleIdsRequest};
use crate::shared::error::{DirectoryError, ErrorResponse};
use crate::user::User;
use crate::DirectoryState;

/// Create a user
///
/// An empty or missing `id` is replaced with a generated UUID.
#[utoipa::path(
    post,
    path = "",
    tag = "users",
    request_body = User,
    responses(
        (status = 201, description = "User created", body = User),
        (status = 400, description = "Invalid payload", body = ErrorResponse),
        (status = 500, description = "Duplicate id or storage failure", body = ErrorResponse)
    )
)]
pub async fn create_user(
    State(state): State<DirectoryState>,
    ApiJson(user): ApiJson<User>,
) -> Result<(StatusCode, Json<User>), DirectoryError> {
    let user = state.entities.create(user).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// List users ordered by name
#[utoipa::path(
    get,
    path = "",
    tag = "users",
    responses((status = 200, description = "All users", body = Vec<User>))
)]
pub async fn list_users(State(state): State<DirectoryState>) -> Result<Json<Vec<User>>, DirectoryError> {
    Ok(Json(state.entities.list::<User>().await?))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "users",
    params(("id" = String, Path, description = "User ID")),
    responses(
        (status = 200, description = "User found", body = User),
        (status = 404, description = "User not found", body = ErrorResponse)
    )
)]
pub async fn get_user(
    State(state): State<DirectoryState>,
    Path(id): Path<String>,
) -> Result<Json<User>, DirectoryError> {
    Ok(Json(state.entities.get::<User>(&id).await?))
}

/// Replace a user
#[utoipa::path(
    put,
    path = "/{id}",
    tag = "users",
    params(("id" = String, Path, description = "User ID")),
    request_body = User,
    responses(
        (status = 200, description = "User updated", body = User),
        (status = 404, description = "User not found", body = ErrorResponse)
    )
)]
pub async fn update_user(
    State(state): State<DirectoryState>,
    Path(id): Path<String>,
    ApiJson(user): ApiJson<User>,
) -> Result<Json<User>, DirectoryError> {
    Ok(Json(state.entities.update(&id, user).await?))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "users",
    params(("id" = String, Path, description = "User ID")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 404, description = "User not found", body = ErrorResponse)
    )
)]
pub async fn delete_user(
    State(state): State<DirectoryState>,
    Path(id): Path<String>,
) -> Result<StatusCode, DirectoryError> {
    state.entities.delete::<User>(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Groups that list the user as a member
#[utoipa::path(
    get,
    path = "/{id}/groups",
    tag = "users",
    params(("id" = String, Path, description = "User ID")),
    responses((status = 200, description = "Groups containing the user", body = Vec<Group>))
)]
pub async fn get_user_groups(
    State(state): State<DirectoryState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Group>>, DirectoryError> {
    Ok(Json(state.membership.groups_for_user(&id).await?))
}

/// Add the user to several groups
#[utoipa::path(
    post,
    path = "/{id}/groups/bulk",
    tag = "users",
    params(("id" = String, Path, description = "User ID")),
    request_body = GroupIdsRequest,
    responses(
        (status = 204, description = "Added to every group"),
        (status = 200, description = "Added to some groups", body = BulkOutcome),
        (status = 500, description = "Added to no group", body = ErrorResponse)
    )
)]
pub async fn add_user_to_groups(
    State(state): State<DirectoryState>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<GroupIdsRequest>,
) -> Result<Response, DirectoryError> {
    let outcome = state.membership.bulk_add_user_to_groups(&id, &req.group_ids).await?;
    Ok(bulk_response(outcome))
}

/// Remove the user from several groups
#[utoipa::path(
    delete,
    path = "/{id}/groups/bulk",
    tag = "users",
    params(("id" = String, Path, description = "User ID")),
    request_body = GroupIdsRequest,
    responses(
        (status = 204, description = "Removed from every group"),
        (status = 200, description = "Removed from some groups", body = BulkOutcome),
        (status = 500, description = "Removed from no group", body = ErrorResponse)
    )
)]
pub async fn remove_user_from_groups(
    State(state): State<DirectoryState>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<GroupIdsRequest>,
) -> Result<Response, DirectoryError> {
    let outcome = state.membership.bulk_remove_user_from_groups(&id, &req.group_ids).await?;
    Ok(bulk_response(outcome))
}

/// Role snapshots held by the user
#[utoipa::path(
    get,
    path = "/{id}/roles",
    tag = "users",
    params(("id" = String, Path, description = "User ID")),
    responses(
        (status = 200, description = "Assigned roles", body = Vec<RoleSnapshot>),
        (status = 404, description = "User not found", body = ErrorResponse)
    )
)]
pub async fn get_user_roles(
    State(state): State<DirectoryState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<RoleSnapshot>>, DirectoryError> {
    Ok(Json(state.membership.user_roles(&id).await?))
}

/// Assign a role to the user
#[utoipa::path(
    post,
    path = "/{id}/roles",
    tag = "users",
    params(("id" = String, Path, description = "User ID")),
    request_body = RoleIdRequest,
    responses(
        (status = 204, description = "Role assigned"),
        (status = 404, description = "User or role not found", body = ErrorResponse),
        (status = 500, description = "Role already held", body = ErrorResponse)
    )
)]
pub async fn assign_role(
    State(state): State<DirectoryState>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<RoleIdRequest>,
) -> Result<StatusCode, DirectoryError> {
    state.membership.assign_role_to_user(&id, &req.role_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Assign several roles to the user
#[utoipa::path(
    post,
    path = "/{id}/roles/bulk",
    tag = "users",
    params(("id" = String, Path, description = "User ID")),
    request_body = RoleIdsRequest,
    responses(
        (status = 204, description = "Roles assigned"),
        (status = 404, description = "User or a role not found", body = ErrorResponse),
        (status = 500, description = "All roles already held", body = ErrorResponse)
    )
)]
pub async fn assign_roles(
    State(state): State<DirectoryState>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<RoleIdsRequest>,
) -> Result<StatusCode, DirectoryError> {
    state.membership.assign_roles_to_user(&id, &req.role_ids).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Remove several roles from the user
#[utoipa::path(
    delete,
    path = "/{id}/roles/bulk",
    tag = "users",
    params(("id" = String, Path, description = "User ID")),
    request_body = RoleIdsRequest,
    responses(
        (status = 204, description = "Roles removed"),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "None of the roles were held", body = ErrorResponse)
    )
)]
pub async fn remove_roles(
    State(state): State<DirectoryState>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<RoleIdsRequest>,
) -> Result<StatusCode, DirectoryError> {
    state.membership.remove_roles_from_user(&id, &req.role_ids).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete,
    path = "/{id}/roles/{role_id}",
    tag = "users",
    params(
        ("id" = String, Path, description = "User ID"),
        ("role_id" = String, Path, description = "Role ID")
    ),
    responses(
        (status = 204, description = "Role removed"),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Role not held", body = ErrorResponse)
    )
)]
pub async fn remove_role(
    State(state): State<DirectoryState>,
    Path((id, role_id)): Path<(String, String)>,
) -> Result<StatusCode, DirectoryError> {
    state.membership.remove_role_from_user(&id, &role_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn users_router(state: DirectoryState) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(create_user, list_users))
        .routes(routes!(get_user, update_user, delete_user))
        .routes(routes!(get_user_groups))
        .routes(routes!(add_user_to_groups, remove_user_from_groups))
        .routes(routes!(get_user_roles, assign_role))
        .routes(routes!(assign_roles, remove_roles))
        .routes(routes!(remove_role))
        .with_state(state)
}
