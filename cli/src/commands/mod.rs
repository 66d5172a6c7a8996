use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use api::{Authorizer, AuthorizerConfig, StaticGrants, DEFAULT_TOKEN_HEADER};
use user::{EnvSigningKey, PrincipalDatabaseConfig, SqlitePrincipalStore};

pub mod authorize;
pub mod principal;
pub mod serve;
pub mod token;

/// Location of the principal database
#[derive(Args, Debug, Clone)]
pub struct StoreArgs {
    /// SQLite database holding principals
    #[arg(long, env = "AUTHORIZER_DATABASE", default_value = "data/authorizer/principals.db")]
    pub database: PathBuf,
}

impl StoreArgs {
    pub async fn open(&self) -> Result<SqlitePrincipalStore> {
        SqlitePrincipalStore::new(PrincipalDatabaseConfig::with_path(&self.database))
            .await
            .with_context(|| format!("Failed to open {}", self.database.display()))
    }
}

/// Settings shared by every command that evaluates events
#[derive(Args, Debug, Clone)]
pub struct AuthorizerArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Header carrying the bearer token
    #[arg(long, env = "AUTHORIZER_TOKEN_HEADER", default_value = DEFAULT_TOKEN_HEADER)]
    pub token_header: String,

    /// JSON file of static grants; recognized principals get every route otherwise
    #[arg(long, env = "AUTHORIZER_GRANTS")]
    pub grants: Option<PathBuf>,
}

impl AuthorizerArgs {
    /// Wire the authorizer from the environment-backed signing key, the
    /// SQLite store and the optional grants file.
    pub async fn build(&self) -> Result<Authorizer> {
        let store = self.store.open().await?;
        let config = AuthorizerConfig::default().with_token_header(&self.token_header);

        let mut authorizer =
            Authorizer::new(config, Arc::new(EnvSigningKey::default()), Arc::new(store));

        if let Some(path) = &self.grants {
            let grants = StaticGrants::from_json_file(path)
                .with_context(|| format!("Failed to load grants from {}", path.display()))?;
            info!(
                "Loaded {} static grant(s) from {}",
                grants.grants().len(),
                path.display()
            );
            authorizer = authorizer.with_grants(Arc::new(grants));
        }

        Ok(authorizer)
    }
}
