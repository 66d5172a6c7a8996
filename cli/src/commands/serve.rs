use anyhow::{anyhow, Result};
use std::sync::Arc;
use tracing::info;

use api::ApiConfig;
use user::{EnvSigningKey, SigningKeyProvider};

use super::AuthorizerArgs;

/// Run the HTTP authorizer until the process is stopped
pub async fn execute(host: String, port: u16, args: AuthorizerArgs) -> Result<()> {
    // Fail at startup rather than on the first request
    EnvSigningKey::default().signing_key()?;

    let authorizer = Arc::new(args.build().await?);
    info!(
        token_header = %authorizer.config().token_header,
        database = %args.store.database.display(),
        "Starting gateway authorizer"
    );

    let config = ApiConfig::new().with_host(host).with_port(port);
    api::start_server_with_config(authorizer, config)
        .await
        .map_err(|e| anyhow!(e))
}
