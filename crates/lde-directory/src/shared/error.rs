//! Directory Error Types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use thiserror::Error;
use utoipa::ToSchema;

use crate::membership::{BulkItemFailure, Relation};
use crate::store::{EntityKind, StoreError};

#[derive(Error, Debug)]
pub enum DirectoryError {
    #[error("{entity_type} not found: {id}")]
    NotFound { entity_type: String, id: String },

    #[error("{}", .relation.already_exists_message(.owner_id, .member_id))]
    AlreadyExists {
        relation: Relation,
        owner_id: String,
        member_id: String,
    },

    #[error("{}", .relation.not_associated_message(.owner_id, .member_id))]
    NotAssociated {
        relation: Relation,
        owner_id: String,
        member_id: String,
    },

    #[error("{message}")]
    NoOp {
        relation: Relation,
        owner_id: String,
        message: &'static str,
    },

    #[error("{message}: [{}]", describe_failures(.failures))]
    BulkFailure {
        message: String,
        failures: Vec<BulkItemFailure>,
    },

    #[error("{context}: {source}")]
    Storage {
        context: String,
        #[source]
        source: StoreError,
    },

    #[error("{entity_type} {id} was modified concurrently, gave up after {attempts} attempts")]
    Conflict {
        entity_type: String,
        id: String,
        attempts: u32,
    },

    #[error("{entity_type} with id {id} already exists")]
    Duplicate { entity_type: String, id: String },

    #[error("Validation error: {message}")]
    Validation { message: String },
}

fn describe_failures(failures: &[BulkItemFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("{}: {}", f.target_id, f.error))
        .collect::<Vec<_>>()
        .join("; ")
}

impl DirectoryError {
    pub fn not_found(kind: EntityKind, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: kind.label().to_string(),
            id: id.into(),
        }
    }

    pub fn already_exists(relation: Relation, owner_id: impl Into<String>, member_id: impl Into<String>) -> Self {
        Self::AlreadyExists {
            relation,
            owner_id: owner_id.into(),
            member_id: member_id.into(),
        }
    }

    pub fn not_associated(relation: Relation, owner_id: impl Into<String>, member_id: impl Into<String>) -> Self {
        Self::NotAssociated {
            relation,
            owner_id: owner_id.into(),
            member_id: member_id.into(),
        }
    }

    pub fn nothing_to_add(relation: Relation, owner_id: impl Into<String>) -> Self {
        Self::NoOp {
            relation,
            owner_id: owner_id.into(),
            message: relation.nothing_to_add(),
        }
    }

    pub fn nothing_to_remove(relation: Relation, owner_id: impl Into<String>) -> Self {
        Self::NoOp {
            relation,
            owner_id: owner_id.into(),
            message: relation.nothing_to_remove(),
        }
    }

    pub fn storage(context: impl Into<String>, source: StoreError) -> Self {
        Self::Storage {
            context: context.into(),
            source,
        }
    }

    pub fn conflict(kind: EntityKind, id: impl Into<String>, attempts: u32) -> Self {
        Self::Conflict {
            entity_type: kind.label().to_string(),
            id: id.into(),
            attempts,
        }
    }

    pub fn duplicate(kind: EntityKind, id: impl Into<String>) -> Self {
        Self::Duplicate {
            entity_type: kind.label().to_string(),
            id: id.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation { message: message.into() }
    }

    /// Stable code used in the JSON error body.
    pub fn code(&self) -> &'static str {
        match self {
            DirectoryError::NotFound { .. } => "NOT_FOUND",
            DirectoryError::AlreadyExists { .. } => "ALREADY_EXISTS",
            DirectoryError::NotAssociated { .. } => "NOT_ASSOCIATED",
            DirectoryError::NoOp { .. } => "NO_OP",
            DirectoryError::BulkFailure { .. } => "BULK_FAILURE",
            DirectoryError::Storage { .. } => "STORAGE_ERROR",
            DirectoryError::Conflict { .. } => "CONFLICT",
            DirectoryError::Duplicate { .. } => "DUPLICATE",
            DirectoryError::Validation { .. } => "VALIDATION_ERROR",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            DirectoryError::NotFound { .. } => StatusCode::NOT_FOUND,
            DirectoryError::Validation { .. } => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type Result<T> = std::result::Result<T, DirectoryError>;

/// Attach an operation description to a store failure.
pub trait StorageContext<T> {
    fn storage_context(self, context: &str) -> Result<T>;
}

impl<T> StorageContext<T> for std::result::Result<T, StoreError> {
    fn storage_context(self, context: &str) -> Result<T> {
        self.map_err(|source| DirectoryError::storage(context, source))
    }
}

/// Error response body
#[derive(Debug, serde::Serialize, serde::Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl IntoResponse for DirectoryError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(code = self.code(), error = %self, "Request failed");
        }

        let body = ErrorResponse {
            error: self.code().to_string(),
            message: self.to_string(),
        };

        (status, Json(body)).into_response()
    }
}
