//! Shared Module
//!
//! Cross-cutting concerns and shared utilities.

pub mod api_common;
pub mod error;
pub mod health_api;
pub mod retry;

pub use error::{DirectoryError, ErrorResponse, Result};
pub use health_api::health_router;
