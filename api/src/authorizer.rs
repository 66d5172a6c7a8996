//! The authorization pipeline.
//!
//! For every gateway event:
//!
//! 1. the route ARN is parsed into a [`RoutingContext`],
//! 2. a missing token header is denied outright,
//! 3. the token is validated against the signing key,
//! 4. the claimed principal is looked up in the store,
//! 5. a recognized principal receives the grants of the [`GrantStrategy`].
//!
//! Every "no" is a deny-all document wrapped in [`Decision::Deny`]. Only
//! faults in the authorizer itself (bad grants, a malformed event, an
//! unreachable store or key) are returned as [`AuthorizerError`].

use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

use authz::{AuthorizerResponse, PolicyBuilder, RoutingContext};
use user::{
    PrincipalResolver, PrincipalStore, Resolution, SigningKeyProvider, TokenValidator,
    ValidationFailure,
};

use crate::error::{AuthorizerError, Result};
use crate::grants::{AllowAll, GrantStrategy};
use crate::models::AuthorizerEvent;

/// Header carrying the bearer token.
pub const DEFAULT_TOKEN_HEADER: &str = "authorization-token";

/// Principal id reported when no trustworthy identity is available.
pub const ANONYMOUS_PRINCIPAL: &str = "anonymous";

/// Authorizer settings
#[derive(Debug, Clone)]
pub struct AuthorizerConfig {
    pub token_header: String,
    pub anonymous_principal: String,
}

impl Default for AuthorizerConfig {
    fn default() -> Self {
        Self {
            token_header: DEFAULT_TOKEN_HEADER.to_string(),
            anonymous_principal: ANONYMOUS_PRINCIPAL.to_string(),
        }
    }
}

impl AuthorizerConfig {
    pub fn with_token_header(mut self, header: impl Into<String>) -> Self {
        self.token_header = header.into();
        self
    }
}

/// Why a request was denied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DenyReason {
    MissingCredential,
    InvalidCredential(ValidationFailure),
    UnrecognizedPrincipal,
    /// The principal is known but its grants allow nothing.
    NothingGranted,
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DenyReason::MissingCredential => write!(f, "missing credential"),
            DenyReason::InvalidCredential(failure) => write!(f, "invalid credential: {}", failure),
            DenyReason::UnrecognizedPrincipal => write!(f, "unrecognized principal"),
            DenyReason::NothingGranted => write!(f, "no allow grants"),
        }
    }
}

/// The authorizer's answer for one event.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    Allow(AuthorizerResponse),
    Deny {
        reason: DenyReason,
        response: AuthorizerResponse,
    },
}

impl Decision {
    pub fn is_allow(&self) -> bool {
        matches!(self, Decision::Allow(_))
    }

    pub fn response(&self) -> &AuthorizerResponse {
        match self {
            Decision::Allow(response) => response,
            Decision::Deny { response, .. } => response,
        }
    }

    pub fn into_response(self) -> AuthorizerResponse {
        match self {
            Decision::Allow(response) => response,
            Decision::Deny { response, .. } => response,
        }
    }

    pub fn deny_reason(&self) -> Option<&DenyReason> {
        match self {
            Decision::Allow(_) => None,
            Decision::Deny { reason, .. } => Some(reason),
        }
    }
}

/// Turns gateway events into policy decisions.
///
/// Holds no per-request state; one instance serves concurrent requests.
#[derive(Clone)]
pub struct Authorizer {
    config: AuthorizerConfig,
    keys: Arc<dyn SigningKeyProvider>,
    resolver: PrincipalResolver,
    grants: Arc<dyn GrantStrategy>,
}

impl Authorizer {
    /// Creates an authorizer that allows all methods to recognized principals.
    pub fn new(
        config: AuthorizerConfig,
        keys: Arc<dyn SigningKeyProvider>,
        store: Arc<dyn PrincipalStore>,
    ) -> Self {
        Self {
            config,
            keys,
            resolver: PrincipalResolver::new(store),
            grants: Arc::new(AllowAll),
        }
    }

    /// Replaces the grant strategy for recognized principals.
    pub fn with_grants(mut self, grants: Arc<dyn GrantStrategy>) -> Self {
        self.grants = grants;
        self
    }

    pub fn config(&self) -> &AuthorizerConfig {
        &self.config
    }

    pub async fn authorize(&self, event: &AuthorizerEvent) -> Result<Decision> {
        let routing = RoutingContext::parse(&event.route_arn)?;

        debug!(
            route_arn = %event.route_arn,
            method = routing.method.as_deref().unwrap_or("-"),
            "Authorizer received event"
        );

        let Some(token) = event.header(&self.config.token_header) else {
            return self.deny(
                &self.config.anonymous_principal,
                routing,
                DenyReason::MissingCredential,
            );
        };

        let key = self.keys.signing_key().map_err(AuthorizerError::SigningKey)?;

        let claim = match TokenValidator::new(&key).validate(token) {
            Ok(claim) => claim,
            Err(failure) => {
                return self.deny(
                    &self.config.anonymous_principal,
                    routing,
                    DenyReason::InvalidCredential(failure),
                );
            }
        };

        let resolution = self
            .resolver
            .resolve(&claim.username)
            .await
            .map_err(AuthorizerError::PrincipalStore)?;

        match resolution {
            Resolution::Recognized(principal) => {
                let mut policy = PolicyBuilder::new(claim.username.as_str(), routing);
                self.grants.apply(&principal, &claim, &mut policy)?;
                let response = policy.build()?;

                if response.allow_statements().next().is_none() {
                    warn!(
                        principal = %claim.username,
                        route_arn = %event.route_arn,
                        reason = %DenyReason::NothingGranted,
                        "User not authorized"
                    );
                    return Ok(Decision::Deny {
                        reason: DenyReason::NothingGranted,
                        response,
                    });
                }

                info!(
                    principal = %claim.username,
                    route_arn = %event.route_arn,
                    statements = response.policy_document.statement.len(),
                    "User authorized"
                );

                Ok(Decision::Allow(response))
            }
            Resolution::NotAuthorized => {
                self.deny(&claim.username, routing, DenyReason::UnrecognizedPrincipal)
            }
        }
    }

    fn deny(
        &self,
        principal_id: &str,
        routing: RoutingContext,
        reason: DenyReason,
    ) -> Result<Decision> {
        let route = routing.to_string();
        let mut policy = PolicyBuilder::new(principal_id, routing);
        policy.deny_all_methods()?;
        let response = policy.build()?;

        match &reason {
            DenyReason::MissingCredential => info!(route = %route, "No token was passed"),
            _ => warn!(
                principal = %principal_id,
                route = %route,
                reason = %reason,
                "User not authorized"
            ),
        }

        Ok(Decision::Deny { reason, response })
    }
}
