//! HTTP front end and pipeline of the gateway authorizer.

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod authorizer;
pub mod error;
pub mod grants;
pub mod handlers;
pub mod models;
pub mod server;

pub use authorizer::{
    Authorizer, AuthorizerConfig, Decision, DenyReason, ANONYMOUS_PRINCIPAL, DEFAULT_TOKEN_HEADER,
};
pub use error::{ApiError, AuthorizerError};
pub use grants::{AllowAll, GrantRule, GrantStrategy, GrantsFileError, StaticGrants};
pub use models::AuthorizerEvent;
pub use server::{start_server_with_config, ApiConfig};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub authorizer: Arc<Authorizer>,
}

/// Create the main API router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    let api_v1 = Router::new()
        .route("/authorize", post(handlers::authorize::authorize))
        .route("/health", get(handlers::health::health_check));

    Router::new()
        .nest("/api/v1", api_v1)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
