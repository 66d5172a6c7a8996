use async_trait::async_trait;
use sqlx::{migrate::MigrateDatabase, sqlite::SqlitePoolOptions, Pool, Sqlite};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{Result, UserError};
use crate::principal::{Principal, PrincipalStore};

/// Configuration for the principal database
#[derive(Debug, Clone)]
pub struct PrincipalDatabaseConfig {
    /// Path to the database file
    pub database_path: PathBuf,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Connection timeout in seconds
    pub connection_timeout: u64,
}

impl Default for PrincipalDatabaseConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("data/authorizer/principals.db"),
            max_connections: 5,
            connection_timeout: 30,
        }
    }
}

impl PrincipalDatabaseConfig {
    pub fn with_path(database_path: impl Into<PathBuf>) -> Self {
        Self {
            database_path: database_path.into(),
            ..Self::default()
        }
    }
}

/// SQLite-backed principal store
pub struct SqlitePrincipalStore {
    pool: Pool<Sqlite>,
    config: PrincipalDatabaseConfig,
}

impl SqlitePrincipalStore {
    /// Open (and create if needed) the principal database
    pub async fn new(config: PrincipalDatabaseConfig) -> Result<Self> {
        if let Some(parent) = config.database_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db_url = format!("sqlite:{}", config.database_path.display());

        if !Sqlite::database_exists(&db_url).await.unwrap_or(false) {
            info!(
                "Creating principal database at: {}",
                config.database_path.display()
            );
            Sqlite::create_database(&db_url).await.map_err(|e| {
                UserError::Initialization(format!("Failed to create database: {}", e))
            })?;
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect_with(
                sqlx::sqlite::SqliteConnectOptions::new()
                    .filename(&config.database_path)
                    .create_if_missing(true),
            )
            .await?;

        let store = Self { pool, config };
        store.run_migrations().await?;

        info!("Principal database initialized successfully");

        Ok(store)
    }

    async fn run_migrations(&self) -> Result<()> {
        info!("Running principal database migrations");

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS principals (
                username TEXT PRIMARY KEY,
                scopes TEXT NOT NULL DEFAULT '[]',
                created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Insert or replace a principal
    pub async fn insert_principal(&self, principal: &Principal) -> Result<()> {
        let scopes = serde_json::to_string(&principal.scopes)?;

        sqlx::query(
            r#"
            INSERT INTO principals (username, scopes) VALUES (?, ?)
            ON CONFLICT(username) DO UPDATE SET scopes = excluded.scopes
            "#,
        )
        .bind(&principal.username)
        .bind(scopes)
        .execute(&self.pool)
        .await?;

        info!("Stored principal: {}", principal.username);
        Ok(())
    }

    /// Remove a principal, returning whether it existed
    pub async fn remove_principal(&self, username: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM principals WHERE username = ?")
            .bind(username)
            .execute(&self.pool)
            .await?;

        let removed = result.rows_affected() > 0;
        if removed {
            info!("Removed principal: {}", username);
        } else {
            warn!("No principal to remove: {}", username);
        }
        Ok(removed)
    }

    /// Number of stored principals
    pub async fn count(&self) -> Result<i64> {
        Ok(sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM principals")
            .fetch_one(&self.pool)
            .await?)
    }

    pub fn config(&self) -> &PrincipalDatabaseConfig {
        &self.config
    }

    /// Close the database connection
    pub async fn close(self) -> Result<()> {
        self.pool.close().await;
        info!("Principal database connection closed");
        Ok(())
    }
}

#[async_trait]
impl PrincipalStore for SqlitePrincipalStore {
    async fn find_principal(&self, username: &str) -> Result<Option<Principal>> {
        debug!("Looking up principal: {}", username);

        let row = sqlx::query_as::<_, (String, String)>(
            "SELECT username, scopes FROM principals WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some((username, scopes)) => Ok(Some(Principal {
                username,
                scopes: serde_json::from_str(&scopes)?,
            })),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn open(temp_dir: &TempDir) -> SqlitePrincipalStore {
        let config = PrincipalDatabaseConfig::with_path(temp_dir.path().join("principals.db"));
        SqlitePrincipalStore::new(config).await.unwrap()
    }

    #[tokio::test]
    async fn test_database_initialization() {
        let temp_dir = TempDir::new().unwrap();
        let store = open(&temp_dir).await;

        assert!(store.config().database_path.exists());
        assert_eq!(store.count().await.unwrap(), 0);

        store.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_insert_and_find() {
        let temp_dir = TempDir::new().unwrap();
        let store = open(&temp_dir).await;

        let alice = Principal::new("alice").with_scopes(vec!["posts:read".into()]);
        store.insert_principal(&alice).await.unwrap();

        let found = store.find_principal("alice").await.unwrap();
        assert_eq!(found, Some(alice));

        assert!(store.find_principal("mallory").await.unwrap().is_none());
        store.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_lookup_is_case_sensitive() {
        let temp_dir = TempDir::new().unwrap();
        let store = open(&temp_dir).await;

        store.insert_principal(&Principal::new("alice")).await.unwrap();
        assert!(store.find_principal("Alice").await.unwrap().is_none());

        store.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_insert_replaces_scopes() {
        let temp_dir = TempDir::new().unwrap();
        let store = open(&temp_dir).await;

        store.insert_principal(&Principal::new("bob")).await.unwrap();
        store
            .insert_principal(&Principal::new("bob").with_scopes(vec!["admin".into()]))
            .await
            .unwrap();

        assert_eq!(store.count().await.unwrap(), 1);
        let found = store.find_principal("bob").await.unwrap().unwrap();
        assert_eq!(found.scopes, vec!["admin".to_string()]);

        store.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_remove_principal() {
        let temp_dir = TempDir::new().unwrap();
        let store = open(&temp_dir).await;

        store.insert_principal(&Principal::new("carol")).await.unwrap();
        assert!(store.remove_principal("carol").await.unwrap());
        assert!(!store.remove_principal("carol").await.unwrap());
        assert!(store.find_principal("carol").await.unwrap().is_none());

        store.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_reopen_keeps_principals() {
        let temp_dir = TempDir::new().unwrap();

        let store = open(&temp_dir).await;
        store.insert_principal(&Principal::new("dave")).await.unwrap();
        store.close().await.unwrap();

        let store = open(&temp_dir).await;
        assert!(store.find_principal("dave").await.unwrap().is_some());
        store.close().await.unwrap();
    }
}
