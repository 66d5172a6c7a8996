//! Signing key retrieval.

use std::env;
use tracing::debug;

use crate::error::{Result, UserError};

/// Environment variable read by [`EnvSigningKey::default`].
pub const DEFAULT_SIGNING_KEY_VAR: &str = "AUTHORIZER_SIGNING_KEY";

/// Source of the shared HS256 signing key.
///
/// Implementations must not block on I/O for long: the key is fetched on the
/// request path, ahead of the principal lookup.
pub trait SigningKeyProvider: Send + Sync {
    fn signing_key(&self) -> Result<Vec<u8>>;
}

/// A key held in memory.
#[derive(Clone)]
pub struct StaticSigningKey(Vec<u8>);

impl StaticSigningKey {
    pub fn new(key: impl Into<Vec<u8>>) -> Self {
        Self(key.into())
    }
}

impl SigningKeyProvider for StaticSigningKey {
    fn signing_key(&self) -> Result<Vec<u8>> {
        Ok(self.0.clone())
    }
}

/// Reads the key from an environment variable on every call, so a rotated
/// key is picked up without a restart.
#[derive(Debug, Clone)]
pub struct EnvSigningKey {
    var: String,
}

impl EnvSigningKey {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }

    pub fn var(&self) -> &str {
        &self.var
    }
}

impl Default for EnvSigningKey {
    fn default() -> Self {
        Self::new(DEFAULT_SIGNING_KEY_VAR)
    }
}

impl SigningKeyProvider for EnvSigningKey {
    fn signing_key(&self) -> Result<Vec<u8>> {
        debug!("Reading signing key from {}", self.var);

        match env::var(&self.var) {
            Ok(value) if !value.is_empty() => Ok(value.into_bytes()),
            Ok(_) => Err(UserError::Configuration(format!("{} is empty", self.var))),
            Err(_) => Err(UserError::Configuration(format!("{} is not set", self.var))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_key() {
        let provider = StaticSigningKey::new("secret");
        assert_eq!(provider.signing_key().unwrap(), b"secret".to_vec());
    }

    #[test]
    fn test_env_key() {
        let var = "USER_SECRETS_TEST_KEY_PRESENT";
        env::set_var(var, "from-env");

        let provider = EnvSigningKey::new(var);
        assert_eq!(provider.signing_key().unwrap(), b"from-env".to_vec());

        env::remove_var(var);
    }

    #[test]
    fn test_env_key_missing() {
        let provider = EnvSigningKey::new("USER_SECRETS_TEST_KEY_MISSING");
        let result = provider.signing_key();
        assert!(matches!(result, Err(UserError::Configuration(_))));
    }

    #[test]
    fn test_env_key_empty() {
        let var = "USER_SECRETS_TEST_KEY_EMPTY";
        env::set_var(var, "");

        let result = EnvSigningKey::new(var).signing_key();
        assert!(matches!(result, Err(UserError::Configuration(msg)) if msg.contains("empty")));

        env::remove_var(var);
    }

    #[test]
    fn test_default_var() {
        assert_eq!(EnvSigningKey::default().var(), DEFAULT_SIGNING_KEY_VAR);
    }
}
