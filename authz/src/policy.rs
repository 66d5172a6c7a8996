//! Accumulates grants for one authorization decision and compiles them into
//! the statement list the gateway evaluates.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::arn::{ArnTemplate, RoutingContext};
use crate::error::{AuthzError, Result};
use crate::types::{
    AuthorizerResponse, Conditions, Effect, Grant, HttpVerb, PolicyDocument, Statement,
    PATH_PATTERN, POLICY_VERSION,
};

static PATH_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(PATH_PATTERN).expect("PATH_PATTERN is a valid regex"));

/// Builds the policy for a single request.
///
/// A builder is created per decision and consumed by [`PolicyBuilder::build`],
/// so grants can never leak from one request into the next.
///
/// ```rust
/// use authz::{HttpVerb, PolicyBuilder, RoutingContext};
///
/// let ctx = RoutingContext::parse(
///     "arn:aws:execute-api:us-east-1:123456789012:abcdef123/prod/GET/pets",
/// )?;
/// let mut policy = PolicyBuilder::new("alice", ctx);
/// policy.allow_method(HttpVerb::Get, "/pets")?;
/// policy.deny_method(HttpVerb::Delete, "/pets/*")?;
///
/// let response = policy.build()?;
/// assert_eq!(response.policy_document.statement.len(), 2);
/// # Ok::<(), authz::AuthzError>(())
/// ```
#[derive(Debug, Clone)]
pub struct PolicyBuilder {
    principal_id: String,
    routing: RoutingContext,
    allow: Vec<Grant>,
    deny: Vec<Grant>,
}

impl PolicyBuilder {
    pub fn new(principal_id: impl Into<String>, routing: RoutingContext) -> Self {
        Self {
            principal_id: principal_id.into(),
            routing,
            allow: Vec::new(),
            deny: Vec::new(),
        }
    }

    pub fn principal_id(&self) -> &str {
        &self.principal_id
    }

    pub fn routing(&self) -> &RoutingContext {
        &self.routing
    }

    /// Grants accumulated so far, allows first.
    pub fn grants(&self) -> impl Iterator<Item = &Grant> {
        self.allow.iter().chain(self.deny.iter())
    }

    pub fn is_empty(&self) -> bool {
        self.allow.is_empty() && self.deny.is_empty()
    }

    /// Validates the path, renders the resource ARN and records a grant.
    pub fn add_grant(
        &mut self,
        effect: Effect,
        verb: HttpVerb,
        path: &str,
        conditions: Option<Conditions>,
    ) -> Result<&mut Self> {
        if !PATH_REGEX.is_match(path) {
            return Err(AuthzError::InvalidPath {
                path: path.to_string(),
                pattern: PATH_PATTERN.to_string(),
            });
        }

        let path = path.strip_prefix('/').unwrap_or(path);
        let resource_arn = ArnTemplate::render(&self.routing, verb, path);

        debug!(effect = %effect, verb = %verb, resource = %resource_arn, "Adding grant");

        let grant = Grant {
            effect,
            verb,
            path: path.to_string(),
            resource_arn,
            conditions,
        };

        match effect {
            Effect::Allow => self.allow.push(grant),
            Effect::Deny => self.deny.push(grant),
        }

        Ok(self)
    }

    /// Like [`add_grant`](Self::add_grant) but takes the verb as text, for
    /// grants loaded from configuration.
    pub fn add_method(
        &mut self,
        effect: Effect,
        verb: &str,
        path: &str,
        conditions: Option<Conditions>,
    ) -> Result<&mut Self> {
        let verb: HttpVerb = verb.parse()?;
        self.add_grant(effect, verb, path, conditions)
    }

    pub fn allow_method(&mut self, verb: HttpVerb, path: &str) -> Result<&mut Self> {
        self.add_grant(Effect::Allow, verb, path, None)
    }

    pub fn deny_method(&mut self, verb: HttpVerb, path: &str) -> Result<&mut Self> {
        self.add_grant(Effect::Deny, verb, path, None)
    }

    pub fn allow_method_with_conditions(
        &mut self,
        verb: HttpVerb,
        path: &str,
        conditions: Conditions,
    ) -> Result<&mut Self> {
        self.add_grant(Effect::Allow, verb, path, Some(conditions))
    }

    pub fn deny_method_with_conditions(
        &mut self,
        verb: HttpVerb,
        path: &str,
        conditions: Conditions,
    ) -> Result<&mut Self> {
        self.add_grant(Effect::Deny, verb, path, Some(conditions))
    }

    /// Allows every verb on every path of the stage.
    pub fn allow_all_methods(&mut self) -> Result<&mut Self> {
        self.add_grant(Effect::Allow, HttpVerb::All, "*", None)
    }

    /// Denies every verb on every path of the stage.
    pub fn deny_all_methods(&mut self) -> Result<&mut Self> {
        self.add_grant(Effect::Deny, HttpVerb::All, "*", None)
    }

    /// Compiles the accumulated grants.
    ///
    /// For each effect, conditioned grants become single-resource statements
    /// of their own and the remaining grants share one statement, in the order
    /// they were added. Allow statements come before deny statements.
    pub fn build(self) -> Result<AuthorizerResponse> {
        if self.is_empty() {
            return Err(AuthzError::EmptyPolicy);
        }

        let mut statement = statements_for_effect(Effect::Allow, &self.allow);
        statement.extend(statements_for_effect(Effect::Deny, &self.deny));

        debug!(
            principal = %self.principal_id,
            statements = statement.len(),
            "Compiled policy document"
        );

        Ok(AuthorizerResponse {
            principal_id: self.principal_id,
            policy_document: PolicyDocument {
                version: POLICY_VERSION.to_string(),
                statement,
            },
        })
    }
}

fn statements_for_effect(effect: Effect, grants: &[Grant]) -> Vec<Statement> {
    let mut statements = Vec::new();
    let mut shared = Statement::empty(effect);

    for grant in grants {
        if grant.is_conditional() {
            statements.push(Statement {
                resource: vec![grant.resource_arn.clone()],
                condition: grant.conditions.clone(),
                ..Statement::empty(effect)
            });
        } else {
            shared.resource.push(grant.resource_arn.clone());
        }
    }

    if !shared.resource.is_empty() {
        statements.push(shared);
    }

    statements
}
