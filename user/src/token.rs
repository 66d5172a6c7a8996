//! Bearer token claims, validation and issuance.
//!
//! Tokens are HS256 JWTs carrying the username, the granted scopes and an
//! expiry. Validation never raises: a bad token is reported as a
//! [`ValidationFailure`] so the authorizer can answer with a deny document.

use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::error::{Result, UserError};

/// Default lifetime of an issued token.
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 24 * 60 * 60;

/// Claims carried by an authorizer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    /// The principal the token was issued to.
    pub username: String,

    #[serde(default)]
    pub scope: Vec<String>,

    /// Expiry, seconds since the Unix epoch.
    pub exp: i64,

    /// Issuance time, seconds since the Unix epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
}

impl Claim {
    /// Fails when `ttl` puts the expiry outside the representable time range.
    pub fn new(username: impl Into<String>, scope: Vec<String>, ttl: Duration) -> Result<Self> {
        let now = Utc::now();
        let expires = now.checked_add_signed(ttl).ok_or_else(|| {
            UserError::Configuration(format!("token lifetime out of range: {}s", ttl.num_seconds()))
        })?;

        Ok(Self {
            username: username.into(),
            scope,
            exp: expires.timestamp(),
            iat: Some(now.timestamp()),
        })
    }

    /// A claim is no longer valid once `now` is past its expiry.
    pub fn is_expired_at(&self, now: i64) -> bool {
        now > self.exp
    }
}

/// Why a token was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationFailure {
    Expired,
    InvalidSignature,
    /// Not a well formed HS256 token with the required claims.
    Malformed(String),
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationFailure::Expired => write!(f, "token expired"),
            ValidationFailure::InvalidSignature => write!(f, "invalid signature"),
            ValidationFailure::Malformed(reason) => write!(f, "malformed token: {}", reason),
        }
    }
}

impl From<jsonwebtoken::errors::Error> for ValidationFailure {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::ExpiredSignature => ValidationFailure::Expired,
            ErrorKind::InvalidSignature => ValidationFailure::InvalidSignature,
            _ => ValidationFailure::Malformed(err.to_string()),
        }
    }
}

/// Verifies HS256 tokens against a shared signing key.
pub struct TokenValidator {
    key: DecodingKey,
    validation: Validation,
}

impl TokenValidator {
    pub fn new(signing_key: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            key: DecodingKey::from_secret(signing_key),
            validation,
        }
    }

    /// Checks signature, algorithm and expiry and returns the claims.
    pub fn validate(&self, token: &str) -> std::result::Result<Claim, ValidationFailure> {
        let data = decode::<Claim>(token, &self.key, &self.validation).map_err(|e| {
            let failure = ValidationFailure::from(e);
            debug!(reason = %failure, "Token rejected");
            failure
        })?;

        Ok(data.claims)
    }
}

/// Signs HS256 tokens for principals.
pub struct TokenIssuer {
    key: EncodingKey,
}

impl TokenIssuer {
    pub fn new(signing_key: &[u8]) -> Self {
        Self {
            key: EncodingKey::from_secret(signing_key),
        }
    }

    /// Issues a token for `username` that expires after `ttl`.
    pub fn issue(&self, username: &str, scope: Vec<String>, ttl: Duration) -> Result<String> {
        self.encode(&Claim::new(username, scope, ttl)?)
    }

    pub fn encode(&self, claim: &Claim) -> Result<String> {
        Ok(encode(&Header::new(Algorithm::HS256), claim, &self.key)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const KEY: &[u8] = b"test-signing-key";

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(KEY)
    }

    #[test]
    fn test_round_trip() {
        let token = issuer()
            .issue("alice", vec!["posts:read".into()], Duration::hours(1))
            .unwrap();

        let claim = TokenValidator::new(KEY).validate(&token).unwrap();
        assert_eq!(claim.username, "alice");
        assert_eq!(claim.scope, vec!["posts:read".to_string()]);
        assert!(claim.iat.is_some());
        assert!(!claim.is_expired_at(Utc::now().timestamp()));
    }

    #[test]
    fn test_expired_token() {
        let claim = Claim {
            username: "alice".into(),
            scope: vec![],
            exp: Utc::now().timestamp() - 60,
            iat: None,
        };
        let token = issuer().encode(&claim).unwrap();

        let result = TokenValidator::new(KEY).validate(&token);
        assert_eq!(result, Err(ValidationFailure::Expired));
    }

    #[test]
    fn test_wrong_key() {
        let token = issuer().issue("alice", vec![], Duration::hours(1)).unwrap();

        let result = TokenValidator::new(b"another-key").validate(&token);
        assert_eq!(result, Err(ValidationFailure::InvalidSignature));
    }

    #[test]
    fn test_tampered_payload() {
        let token = issuer().issue("alice", vec![], Duration::hours(1)).unwrap();
        let forged = issuer().issue("mallory", vec![], Duration::hours(1)).unwrap();

        // alice's header and signature around mallory's payload
        let parts: Vec<&str> = token.split('.').collect();
        let forged_parts: Vec<&str> = forged.split('.').collect();
        let spliced = format!("{}.{}.{}", parts[0], forged_parts[1], parts[2]);

        let result = TokenValidator::new(KEY).validate(&spliced);
        assert_eq!(result, Err(ValidationFailure::InvalidSignature));
    }

    #[test]
    fn test_out_of_range_ttl_is_an_error() {
        let result = issuer().issue("alice", vec![], Duration::seconds(i64::MAX / 1000));
        assert!(matches!(result, Err(UserError::Configuration(_))));
    }

    #[rstest]
    #[case("")]
    #[case("not-a-token")]
    #[case("a.b.c")]
    fn test_garbage_is_malformed(#[case] token: &str) {
        let result = TokenValidator::new(KEY).validate(token);
        assert!(
            matches!(result, Err(ValidationFailure::Malformed(_))),
            "{:?} should be malformed",
            token
        );
    }

    #[test]
    fn test_other_algorithm_rejected() {
        let claim = Claim::new("alice", vec![], Duration::hours(1)).unwrap();
        let token = encode(
            &Header::new(Algorithm::HS512),
            &claim,
            &EncodingKey::from_secret(KEY),
        )
        .unwrap();

        let result = TokenValidator::new(KEY).validate(&token);
        assert!(matches!(result, Err(ValidationFailure::Malformed(_))));
    }

    #[test]
    fn test_missing_expiry_rejected() {
        #[derive(Serialize)]
        struct NoExpiry {
            username: String,
        }

        let token = encode(
            &Header::new(Algorithm::HS256),
            &NoExpiry {
                username: "alice".into(),
            },
            &EncodingKey::from_secret(KEY),
        )
        .unwrap();

        let result = TokenValidator::new(KEY).validate(&token);
        assert!(matches!(result, Err(ValidationFailure::Malformed(_))));
    }

    #[test]
    fn test_scope_defaults_to_empty() {
        #[derive(Serialize)]
        struct Minimal {
            username: String,
            exp: i64,
        }

        let token = encode(
            &Header::new(Algorithm::HS256),
            &Minimal {
                username: "alice".into(),
                exp: Utc::now().timestamp() + 60,
            },
            &EncodingKey::from_secret(KEY),
        )
        .unwrap();

        let claim = TokenValidator::new(KEY).validate(&token).unwrap();
        assert!(claim.scope.is_empty());
        assert!(claim.iat.is_none());
    }
}
