//! Core types for gateway policy documents.
//!
//! The serialized shapes in this module are a wire contract with the gateway:
//! field names, their casing and the version string must not change.
//!
//! ```json
//! {
//!   "principalId": "alice",
//!   "policyDocument": {
//!     "Version": "2012-10-17",
//!     "Statement": [
//!       { "Action": "execute-api:Invoke", "Effect": "Allow", "Resource": ["..."] }
//!     ]
//!   }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{AuthzError, Result};

/// Policy language version understood by the gateway.
pub const POLICY_VERSION: &str = "2012-10-17";

/// The only action an authorizer statement grants or denies.
pub const INVOKE_ACTION: &str = "execute-api:Invoke";

/// Allowed characters for a resource path in a grant.
pub const PATH_PATTERN: &str = r"^[/.a-zA-Z0-9\-*]+$";

/// Condition block attached to a statement, e.g.
/// `{"IpAddress": {"aws:SourceIp": ["10.0.0.0/8"]}}`.
pub type Conditions = serde_json::Map<String, serde_json::Value>;

/// HTTP verbs a grant may target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HttpVerb {
    #[serde(rename = "GET")]
    Get,
    #[serde(rename = "POST")]
    Post,
    #[serde(rename = "PUT")]
    Put,
    #[serde(rename = "PATCH")]
    Patch,
    #[serde(rename = "HEAD")]
    Head,
    #[serde(rename = "DELETE")]
    Delete,
    #[serde(rename = "OPTIONS")]
    Options,
    /// Matches every verb.
    #[serde(rename = "*")]
    All,
}

impl HttpVerb {
    /// Every accepted verb, wildcard last.
    pub const ALL_VERBS: [HttpVerb; 8] = [
        HttpVerb::Get,
        HttpVerb::Post,
        HttpVerb::Put,
        HttpVerb::Patch,
        HttpVerb::Head,
        HttpVerb::Delete,
        HttpVerb::Options,
        HttpVerb::All,
    ];

    /// The token used for this verb inside a resource ARN.
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpVerb::Get => "GET",
            HttpVerb::Post => "POST",
            HttpVerb::Put => "PUT",
            HttpVerb::Patch => "PATCH",
            HttpVerb::Head => "HEAD",
            HttpVerb::Delete => "DELETE",
            HttpVerb::Options => "OPTIONS",
            HttpVerb::All => "*",
        }
    }
}

impl fmt::Display for HttpVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpVerb {
    type Err = AuthzError;

    /// Verbs are matched exactly; `get` is not `GET`.
    fn from_str(s: &str) -> Result<Self> {
        HttpVerb::ALL_VERBS
            .into_iter()
            .find(|verb| verb.as_str() == s)
            .ok_or_else(|| AuthzError::InvalidVerb(s.to_string()))
    }
}

/// Statement effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Effect {
    Allow,
    Deny,
}

impl Effect {
    pub fn as_str(&self) -> &'static str {
        match self {
            Effect::Allow => "Allow",
            Effect::Deny => "Deny",
        }
    }
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Effect {
    type Err = AuthzError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "allow" => Ok(Effect::Allow),
            "deny" => Ok(Effect::Deny),
            _ => Err(AuthzError::InvalidEffect(s.to_string())),
        }
    }
}

/// A single verb + resource entry waiting to be compiled into a statement.
#[derive(Debug, Clone, PartialEq)]
pub struct Grant {
    pub effect: Effect,
    pub verb: HttpVerb,
    /// Resource path as given, with any leading `/` removed.
    pub path: String,
    /// Fully rendered resource ARN.
    pub resource_arn: String,
    pub conditions: Option<Conditions>,
}

impl Grant {
    /// Grants with an empty condition map are treated as unconditioned.
    pub fn is_conditional(&self) -> bool {
        self.conditions.as_ref().is_some_and(|c| !c.is_empty())
    }
}

/// One compiled policy statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    #[serde(rename = "Action")]
    pub action: String,

    #[serde(rename = "Effect")]
    pub effect: Effect,

    #[serde(rename = "Resource")]
    pub resource: Vec<String>,

    #[serde(rename = "Condition", default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Conditions>,
}

impl Statement {
    /// An invoke statement with no resources yet.
    pub fn empty(effect: Effect) -> Self {
        Self {
            action: INVOKE_ACTION.to_string(),
            effect,
            resource: Vec::new(),
            condition: None,
        }
    }
}

/// The `policyDocument` body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyDocument {
    #[serde(rename = "Version")]
    pub version: String,

    #[serde(rename = "Statement")]
    pub statement: Vec<Statement>,
}

/// Complete authorizer output returned to the gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorizerResponse {
    #[serde(rename = "principalId")]
    pub principal_id: String,

    #[serde(rename = "policyDocument")]
    pub policy_document: PolicyDocument,
}

impl AuthorizerResponse {
    pub fn allow_statements(&self) -> impl Iterator<Item = &Statement> {
        self.statements_for(Effect::Allow)
    }

    pub fn deny_statements(&self) -> impl Iterator<Item = &Statement> {
        self.statements_for(Effect::Deny)
    }

    fn statements_for(&self, effect: Effect) -> impl Iterator<Item = &Statement> {
        self.policy_document
            .statement
            .iter()
            .filter(move |s| s.effect == effect)
    }

    /// True when the document is exactly one unconditioned wildcard Allow.
    pub fn is_allow_all(&self) -> bool {
        self.is_wildcard_only(Effect::Allow)
    }

    /// True when the document is exactly one unconditioned wildcard Deny.
    pub fn is_deny_all(&self) -> bool {
        self.is_wildcard_only(Effect::Deny)
    }

    fn is_wildcard_only(&self, effect: Effect) -> bool {
        match self.policy_document.statement.as_slice() {
            [only] => {
                only.effect == effect
                    && only.condition.is_none()
                    && only.resource.len() == 1
                    && only.resource[0].ends_with("/*/*")
            }
            _ => false,
        }
    }

    pub fn to_json(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}
