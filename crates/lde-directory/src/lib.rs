//! Lotus Directory Engine
//!
//! Users, groups and roles with many-to-many relationships kept as ID lists
//! embedded in the owning entity:
//! - `Group.members` - user IDs
//! - `Role.groups` - group IDs
//! - `User.roles` - role snapshots taken at assignment time
//!
//! ## Module Organization
//!
//! - `store` - document store contract with Postgres and in-memory backends
//! - `user`, `group`, `role` - entities and REST endpoints per aggregate
//! - `membership` - relationship mutations and bulk coordination
//! - `service` - plain entity CRUD

pub mod group;
pub mod membership;
pub mod role;
pub mod service;
pub mod shared;
pub mod store;
pub mod user;

use std::sync::Arc;

use axum::http::HeaderValue;
use axum::Router;
use lde_config::{HttpConfig, MembershipConfig};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;
use utoipa_axum::router::OpenApiRouter;
use utoipa_swagger_ui::SwaggerUi;

pub use group::Group;
pub use membership::{BulkItemFailure, BulkOutcome, MembershipEngine};
pub use role::{Role, RoleSnapshot};
pub use service::EntityService;
pub use shared::error::{DirectoryError, ErrorResponse, Result};
pub use store::{DirectoryStore, EntityKind, MemoryStore, PgStore, StoreError};
pub use user::User;

/// Shared handler state.
#[derive(Clone)]
pub struct DirectoryState {
    pub entities: Arc<EntityService>,
    pub membership: Arc<MembershipEngine>,
}

impl DirectoryState {
    pub fn new(store: Arc<dyn DirectoryStore>, config: &MembershipConfig) -> Self {
        Self {
            entities: Arc::new(EntityService::new(store.clone(), config)),
            membership: Arc::new(MembershipEngine::new(store, config)),
        }
    }
}

/// Build the full HTTP application: REST routes, health probes, OpenAPI and Swagger UI.
pub fn app(state: DirectoryState, http: &HttpConfig) -> Router {
    let (router, mut openapi) = OpenApiRouter::new()
        .nest("/api/v1/users", user::users_router(state.clone()))
        .nest("/api/v1/groups", group::groups_router(state.clone()))
        .nest("/api/v1/roles", role::roles_router(state.clone()))
        .merge(shared::health_router(state.entities.clone()))
        .split_for_parts();

    openapi.info.title = "Lotus Directory Engine API".to_string();
    openapi.info.version = env!("CARGO_PKG_VERSION").to_string();
    openapi.info.description = Some("Users, groups, roles and their memberships".to_string());

    Router::new()
        .merge(router)
        .merge(SwaggerUi::new("/swagger-ui").url("/q/openapi", openapi))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(http))
}

fn cors_layer(http: &HttpConfig) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if http.allows_any_origin() {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = http
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(origins))
}
