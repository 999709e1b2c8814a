//! Groups API
//!
//! CRUD plus membership of users in a group.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use utoipa_axum::{router::OpenApiRouter, routes};

use crate::group::Group;
use crate::role::Role;
use crate::shared::api_common::{ApiJson, MembersResponse, UserIdRequest, UserIdsRequest};
use crate::shared::error::{DirectoryError, ErrorResponse};
use crate::DirectoryState;

/// Create a group
#[utoipa::path(
    post,
    path = "",
    tag = "groups",
    request_body = Group,
    responses(
        (status = 201, description = "Group created", body = Group),
        (status = 400, description = "Invalid payload", body = ErrorResponse),
        (status = 500, description = "Duplicate id or storage failure", body = ErrorResponse)
    )
)]
pub async fn create_group(
    State(state): State<DirectoryState>,
    ApiJson(group): ApiJson<Group>,
) -> Result<(StatusCode, Json<Group>), DirectoryError> {
    let group = state.entities.create(group).await?;
    Ok((StatusCode::CREATED, Json(group)))
}

#[utoipa::path(
    get,
    path = "",
    tag = "groups",
    responses((status = 200, description = "All groups ordered by name", body = Vec<Group>))
)]
pub async fn list_groups(State(state): State<DirectoryState>) -> Result<Json<Vec<Group>>, DirectoryError> {
    Ok(Json(state.entities.list::<Group>().await?))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "groups",
    params(("id" = String, Path, description = "Group ID")),
    responses(
        (status = 200, description = "Group found", body = Group),
        (status = 404, description = "Group not found", body = ErrorResponse)
    )
)]
pub async fn get_group(
    State(state): State<DirectoryState>,
    Path(id): Path<String>,
) -> Result<Json<Group>, DirectoryError> {
    Ok(Json(state.entities.get::<Group>(&id).await?))
}

#[utoipa::path(
    put,
    path = "/{id}",
    tag = "groups",
    params(("id" = String, Path, description = "Group ID")),
    request_body = Group,
    responses(
        (status = 200, description = "Group updated", body = Group),
        (status = 404, description = "Group not found", body = ErrorResponse)
    )
)]
pub async fn update_group(
    State(state): State<DirectoryState>,
    Path(id): Path<String>,
    ApiJson(group): ApiJson<Group>,
) -> Result<Json<Group>, DirectoryError> {
    Ok(Json(state.entities.update(&id, group).await?))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "groups",
    params(("id" = String, Path, description = "Group ID")),
    responses(
        (status = 204, description = "Group deleted"),
        (status = 404, description = "Group not found", body = ErrorResponse)
    )
)]
pub async fn delete_group(
    State(state): State<DirectoryState>,
    Path(id): Path<String>,
) -> Result<StatusCode, DirectoryError> {
    state.entities.delete::<Group>(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Add a user to the group
#[utoipa::path(
    post,
    path = "/{id}/users",
    tag = "groups",
    params(("id" = String, Path, description = "Group ID")),
    request_body = UserIdRequest,
    responses(
        (status = 204, description = "User added"),
        (status = 404, description = "Group not found", body = ErrorResponse),
        (status = 500, description = "User already a member", body = ErrorResponse)
    )
)]
pub async fn add_user(
    State(state): State<DirectoryState>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<UserIdRequest>,
) -> Result<StatusCode, DirectoryError> {
    state.membership.add_user_to_group(&id, &req.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Add several users to the group
#[utoipa::path(
    post,
    path = "/{id}/users/bulk",
    tag = "groups",
    params(("id" = String, Path, description = "Group ID")),
    request_body = UserIdsRequest,
    responses(
        (status = 204, description = "Users added"),
        (status = 404, description = "Group not found", body = ErrorResponse),
        (status = 500, description = "All users already members", body = ErrorResponse)
    )
)]
pub async fn add_users(
    State(state): State<DirectoryState>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<UserIdsRequest>,
) -> Result<StatusCode, DirectoryError> {
    state.membership.add_users_to_group(&id, &req.user_ids).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Remove several users from the group
#[utoipa::path(
    delete,
    path = "/{id}/users/bulk",
    tag = "groups",
    params(("id" = String, Path, description = "Group ID")),
    request_body = UserIdsRequest,
    responses(
        (status = 204, description = "Users removed"),
        (status = 404, description = "Group not found", body = ErrorResponse),
        (status = 500, description = "None of the users were members", body = ErrorResponse)
    )
)]
pub async fn remove_users(
    State(state): State<DirectoryState>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<UserIdsRequest>,
) -> Result<StatusCode, DirectoryError> {
    state.membership.remove_users_from_group(&id, &req.user_ids).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete,
    path = "/{id}/users/{user_id}",
    tag = "groups",
    params(
        ("id" = String, Path, description = "Group ID"),
        ("user_id" = String, Path, description = "User ID")
    ),
    responses(
        (status = 204, description = "User removed"),
        (status = 404, description = "Group not found", body = ErrorResponse),
        (status = 500, description = "User not a member", body = ErrorResponse)
    )
)]
pub async fn remove_user(
    State(state): State<DirectoryState>,
    Path((id, user_id)): Path<(String, String)>,
) -> Result<StatusCode, DirectoryError> {
    state.membership.remove_user_from_group(&id, &user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/{id}/members",
    tag = "groups",
    params(("id" = String, Path, description = "Group ID")),
    responses(
        (status = 200, description = "Member user IDs", body = MembersResponse),
        (status = 404, description = "Group not found", body = ErrorResponse)
    )
)]
pub async fn get_members(
    State(state): State<DirectoryState>,
    Path(id): Path<String>,
) -> Result<Json<MembersResponse>, DirectoryError> {
    let members = state.membership.group_members(&id).await?;
    Ok(Json(MembersResponse { members }))
}

/// Roles associated with the group
#[utoipa::path(
    get,
    path = "/{id}/roles",
    tag = "groups",
    params(("id" = String, Path, description = "Group ID")),
    responses((status = 200, description = "Roles listing the group", body = Vec<Role>))
)]
pub async fn get_group_roles(
    State(state): State<DirectoryState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Role>>, DirectoryError> {
    Ok(Json(state.membership.roles_for_group(&id).await?))
}

pub fn groups_router(state: DirectoryState) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(create_group, list_groups))
        .routes(routes!(get_group, update_group, delete_group))
        .routes(routes!(add_user))
        .routes(routes!(add_users, remove_users))
        .routes(routes!(remove_user))
        .routes(routes!(get_members))
        .routes(routes!(get_group_roles))
        .with_state(state)
}
