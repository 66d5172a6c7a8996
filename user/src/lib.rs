//! Identity for the gateway authorizer.
//!
//! - [`token`]: claims carried by bearer tokens, HS256 validation and issuance
//! - [`principal`]: the principal store contract and the resolver that
//!   confirms a claimed identity still exists
//! - [`database`]: SQLite-backed principal store
//! - [`secrets`]: where the signing key comes from

pub mod database;
pub mod error;
pub mod principal;
pub mod secrets;
pub mod token;

// Re-export commonly used types
pub use database::{PrincipalDatabaseConfig, SqlitePrincipalStore};
pub use error::{Result as UserResult, UserError};
pub use principal::{MemoryPrincipalStore, Principal, PrincipalResolver, PrincipalStore, Resolution};
pub use secrets::{EnvSigningKey, SigningKeyProvider, StaticSigningKey, DEFAULT_SIGNING_KEY_VAR};
pub use token::{
    Claim, TokenIssuer, TokenValidator, ValidationFailure, DEFAULT_TOKEN_TTL_SECS,
};
