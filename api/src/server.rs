use crate::{authorizer::Authorizer, create_router, AppState};
use std::sync::Arc;
use tracing::info;

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Port to listen on
    pub port: u16,
    /// Address to bind
    pub host: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            port: 3030,
            host: "0.0.0.0".to_string(),
        }
    }
}

impl ApiConfig {
    /// Create a new API configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the bind address
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }
}

/// Start the API server with the given configuration
pub async fn start_server_with_config(
    authorizer: Arc<Authorizer>,
    config: ApiConfig,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let app = create_router(AppState { authorizer });

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("Authorizer listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
