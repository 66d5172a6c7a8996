//! Error types for policy construction.
//!
//! Every variant here is a construction defect: a bad verb or path handed to
//! the builder, a malformed route ARN from the gateway, or an attempt to build
//! a document with no grants. None of them is an authorization outcome. The
//! pipeline turns "not allowed" into a deny-all document; these errors instead
//! propagate so the host observes a fault rather than a silently wrong policy.

use thiserror::Error;

/// Errors that can occur while assembling a policy document.
#[derive(Debug, Error)]
pub enum AuthzError {
    /// The verb is not one of the supported HTTP verbs or `*`.
    #[error("Invalid HTTP verb: {0}")]
    InvalidVerb(String),

    /// The effect is neither `Allow` nor `Deny`.
    #[error("Invalid effect: {0}")]
    InvalidEffect(String),

    /// The resource path contains characters outside the allowed set.
    #[error("Invalid resource path: {path}. Path should match {pattern}")]
    InvalidPath { path: String, pattern: String },

    /// `build()` was called without a single allow or deny grant.
    #[error("No statements defined for the policy")]
    EmptyPolicy,

    /// The inbound route ARN could not be split into its routing parts.
    #[error("Invalid resource ARN: {0}")]
    InvalidResourceArn(String),

    /// The compiled document could not be serialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A specialized Result type for policy construction.
pub type Result<T> = std::result::Result<T, AuthzError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AuthzError::InvalidVerb("FETCH".to_string());
        assert_eq!(err.to_string(), "Invalid HTTP verb: FETCH");

        let err = AuthzError::EmptyPolicy;
        assert_eq!(err.to_string(), "No statements defined for the policy");

        let err = AuthzError::InvalidPath {
            path: "/pets?x=1".into(),
            pattern: "^[a-z]+$".into(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid resource path: /pets?x=1. Path should match ^[a-z]+$"
        );
    }

    #[test]
    fn test_error_types() {
        let errors = vec![
            AuthzError::InvalidVerb("test".into()),
            AuthzError::InvalidPath {
                path: "test".into(),
                pattern: "test".into(),
            },
            AuthzError::InvalidEffect("test".into()),
            AuthzError::EmptyPolicy,
            AuthzError::InvalidResourceArn("test".into()),
        ];

        for err in errors {
            let _ = format!("{}", err);
            let _ = format!("{:?}", err);
        }
    }
}
