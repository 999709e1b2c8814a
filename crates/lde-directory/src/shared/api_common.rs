//! Common API types and utilities

use axum::{
    extract::{rejection::JsonRejection, FromRequest},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::membership::BulkOutcome;
use crate::shared::error::DirectoryError;

/// JSON body extractor whose rejections use the directory error body (400).
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(DirectoryError))]
pub struct ApiJson<T>(pub T);

impl From<JsonRejection> for DirectoryError {
    fn from(rejection: JsonRejection) -> Self {
        DirectoryError::validation(rejection.body_text())
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UserIdRequest {
    pub user_id: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UserIdsRequest {
    pub user_ids: Vec<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct GroupIdRequest {
    pub group_id: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct GroupIdsRequest {
    pub group_ids: Vec<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RoleIdRequest {
    pub role_id: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RoleIdsRequest {
    pub role_ids: Vec<String>,
}

/// Member user IDs of a group
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MembersResponse {
    pub members: Vec<String>,
}

/// Group IDs associated with a role
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GroupIdsResponse {
    pub groups: Vec<String>,
}

/// 204 when every target succeeded, otherwise 200 with the outcome.
pub fn bulk_response(outcome: BulkOutcome) -> Response {
    if outcome.is_complete() {
        StatusCode::NO_CONTENT.into_response()
    } else {
        (StatusCode::OK, Json(outcome)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::membership::BulkItemFailure;

    #[test]
    fn test_bulk_response_status() {
        let complete = BulkOutcome { success_count: 2, failures: vec![] };
        assert_eq!(bulk_response(complete).status(), StatusCode::NO_CONTENT);

        let partial = BulkOutcome {
            success_count: 1,
            failures: vec![BulkItemFailure { target_id: "u2".into(), error: "user not found: u2".into() }],
        };
        assert_eq!(bulk_response(partial).status(), StatusCode::OK);
    }
}
