use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use authz::AuthzError;
use user::UserError;

/// Faults raised by the authorization pipeline.
///
/// None of these is an authorization outcome: a caller who is not allowed
/// gets a deny decision, not an error. These mean the authorizer itself could
/// not produce a trustworthy document.
#[derive(Error, Debug)]
pub enum AuthorizerError {
    /// Invalid verb or path, a malformed route ARN, or an empty policy.
    #[error("Policy construction failed: {0}")]
    Construction(#[from] AuthzError),

    #[error("Signing key unavailable: {0}")]
    SigningKey(#[source] UserError),

    #[error("Principal lookup failed: {0}")]
    PrincipalStore(#[source] UserError),
}

impl AuthorizerError {
    /// True when the inbound event itself was unusable.
    pub fn is_bad_request(&self) -> bool {
        matches!(
            self,
            AuthorizerError::Construction(AuthzError::InvalidResourceArn(_))
        )
    }
}

/// Result type for the authorization pipeline
pub type Result<T> = std::result::Result<T, AuthorizerError>;

/// API Error types
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

/// Error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Convert error to HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get error code for the error type
    pub fn error_code(&self) -> &str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Unavailable(_) => "UNAVAILABLE",
            ApiError::InternalError(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_response = ApiErrorResponse {
            error: ErrorDetail {
                code: self.error_code().to_string(),
                message: self.to_string(),
                details: None,
            },
        };

        (status, Json(error_response)).into_response()
    }
}

impl From<AuthorizerError> for ApiError {
    fn from(err: AuthorizerError) -> Self {
        if err.is_bad_request() {
            return ApiError::BadRequest(err.to_string());
        }
        match err {
            AuthorizerError::PrincipalStore(_) => ApiError::Unavailable(err.to_string()),
            _ => ApiError::InternalError(err.to_string()),
        }
    }
}

/// Result type for API operations
pub type ApiResult<T> = std::result::Result<T, ApiError>;
