use std::sync::Arc;

use axum::http::Method;
use axum::routing::{get, post};
use axum::Router;
use sqlx::SqlitePool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::authz::{AuthzMode, ContextResolver, PermissionGate, PermissionResolver, RoleProfileTable};
use crate::routes::{authz, health};
use crate::store::SqliteStore;

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub contexts: Arc<ContextResolver>,
    pub gate: PermissionGate<SqliteStore>,
}

impl AppState {
    pub fn new(pool: SqlitePool, profiles: Arc<RoleProfileTable>, mode: AuthzMode) -> Self {
        let resolver = PermissionResolver::new(profiles, SqliteStore::new(pool.clone()));
        Self {
            pool,
            contexts: Arc::new(ContextResolver::default()),
            gate: PermissionGate::new(Arc::new(resolver), mode),
        }
    }

    pub fn resolver(&self) -> &PermissionResolver<SqliteStore> {
        self.gate.resolver()
    }
}

pub fn create_app(pool: SqlitePool, profiles: Arc<RoleProfileTable>, mode: AuthzMode) -> Router {
    let state = AppState::new(pool, profiles, mode);

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_origin(Any)
        .allow_headers(Any);

    let authz_routes = Router::new()
        .route("/resolve", post(authz::resolve_permissions))
        .route("/check", post(authz::check_permission))
        .route("/space-view", post(authz::space_view_permissions));

    Router::new()
        .route("/api/health", get(health::health))
        .nest("/authz", authz_routes)
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
