//! What a recognized principal is granted.
//!
//! The default is [`AllowAll`]: any principal the store still knows may call
//! every route of the stage. [`StaticGrants`] swaps that for a fixed list of
//! verb/path grants, typically loaded from a JSON file.

use serde::{Deserialize, Serialize};
use std::path::Path;

use authz::{AuthzError, Conditions, Effect, HttpVerb, PolicyBuilder, RoutingContext};
use user::{Claim, Principal};

/// Populates the policy of a recognized principal.
pub trait GrantStrategy: Send + Sync {
    fn apply(
        &self,
        principal: &Principal,
        claim: &Claim,
        policy: &mut PolicyBuilder,
    ) -> authz::Result<()>;
}

/// Grants every verb on every path.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl GrantStrategy for AllowAll {
    fn apply(
        &self,
        _principal: &Principal,
        _claim: &Claim,
        policy: &mut PolicyBuilder,
    ) -> authz::Result<()> {
        policy.allow_all_methods()?;
        Ok(())
    }
}

/// One configured grant, as written in a grants file.
///
/// Effect and verb stay textual until the grant is added to a policy, so an
/// unknown verb is reported as a construction error naming the verb.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrantRule {
    pub effect: String,
    pub verb: String,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<Conditions>,
}

impl GrantRule {
    pub fn new(effect: Effect, verb: HttpVerb, path: impl Into<String>) -> Self {
        Self {
            effect: effect.to_string(),
            verb: verb.to_string(),
            path: path.into(),
            conditions: None,
        }
    }

    pub fn allow(verb: HttpVerb, path: impl Into<String>) -> Self {
        Self::new(Effect::Allow, verb, path)
    }

    pub fn deny(verb: HttpVerb, path: impl Into<String>) -> Self {
        Self::new(Effect::Deny, verb, path)
    }

    pub fn with_conditions(mut self, conditions: Conditions) -> Self {
        self.conditions = Some(conditions);
        self
    }

    fn add_to(&self, policy: &mut PolicyBuilder) -> authz::Result<()> {
        let effect: Effect = self.effect.parse()?;
        policy.add_method(effect, &self.verb, &self.path, self.conditions.clone())?;
        Ok(())
    }
}

/// The same fixed grant list for every recognized principal.
#[derive(Debug, Clone)]
pub struct StaticGrants {
    grants: Vec<GrantRule>,
}

impl StaticGrants {
    /// Validates every grant up front so a bad entry fails at startup rather
    /// than on the first request.
    pub fn new(grants: Vec<GrantRule>) -> authz::Result<Self> {
        let mut check = PolicyBuilder::new("validation", RoutingContext::new("region", "0", "api", "stage"));
        for grant in &grants {
            grant.add_to(&mut check)?;
        }
        if check.is_empty() {
            return Err(AuthzError::EmptyPolicy);
        }

        Ok(Self { grants })
    }

    /// Reads a JSON array of grants.
    pub fn from_json_file(path: &Path) -> Result<Self, GrantsFileError> {
        let text = std::fs::read_to_string(path)?;
        let grants: Vec<GrantRule> = serde_json::from_str(&text)?;
        Ok(Self::new(grants)?)
    }

    pub fn grants(&self) -> &[GrantRule] {
        &self.grants
    }
}

impl GrantStrategy for StaticGrants {
    fn apply(
        &self,
        _principal: &Principal,
        _claim: &Claim,
        policy: &mut PolicyBuilder,
    ) -> authz::Result<()> {
        for grant in &self.grants {
            grant.add_to(policy)?;
        }
        Ok(())
    }
}

/// Failure loading a grants file.
#[derive(Debug, thiserror::Error)]
pub enum GrantsFileError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid grants file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid grant: {0}")]
    Grant(#[from] AuthzError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::io::Write;

    fn claim() -> Claim {
        Claim::new("alice", vec![], Duration::hours(1)).unwrap()
    }

    fn policy() -> PolicyBuilder {
        PolicyBuilder::new("alice", RoutingContext::new("us-east-1", "1", "api", "prod"))
    }

    #[test]
    fn test_allow_all() {
        let mut policy = policy();
        AllowAll
            .apply(&Principal::new("alice"), &claim(), &mut policy)
            .unwrap();
        assert!(policy.build().unwrap().is_allow_all());
    }

    #[test]
    fn test_static_grants_applied_in_order() {
        let grants = StaticGrants::new(vec![
            GrantRule::allow(HttpVerb::Get, "/posts/*"),
            GrantRule::allow(HttpVerb::Post, "/posts"),
            GrantRule::deny(HttpVerb::Delete, "/users/*"),
        ])
        .unwrap();

        let mut policy = policy();
        grants
            .apply(&Principal::new("alice"), &claim(), &mut policy)
            .unwrap();

        let response = policy.build().unwrap();
        let allow: Vec<_> = response.allow_statements().collect();
        assert_eq!(allow.len(), 1);
        assert_eq!(
            allow[0].resource,
            vec![
                "arn:aws:execute-api:us-east-1:1:api/prod/GET/posts/*".to_string(),
                "arn:aws:execute-api:us-east-1:1:api/prod/POST/posts".to_string(),
            ]
        );
        assert_eq!(response.deny_statements().count(), 1);
    }

    #[test]
    fn test_static_grants_reject_bad_path() {
        let result = StaticGrants::new(vec![GrantRule::allow(HttpVerb::Get, "/posts?all")]);
        assert!(matches!(result, Err(AuthzError::InvalidPath { .. })));
    }

    #[test]
    fn test_static_grants_reject_empty_list() {
        let result = StaticGrants::new(vec![]);
        assert!(matches!(result, Err(AuthzError::EmptyPolicy)));
    }

    #[test]
    fn test_grants_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[
                {{ "effect": "Allow", "verb": "GET", "path": "/posts" }},
                {{ "effect": "Deny", "verb": "*", "path": "/admin/*",
                   "conditions": {{ "IpAddress": {{ "aws:SourceIp": ["0.0.0.0/0"] }} }} }}
            ]"#
        )
        .unwrap();

        let grants = StaticGrants::from_json_file(file.path()).unwrap();
        assert_eq!(grants.grants().len(), 2);
        assert_eq!(grants.grants()[1].verb, "*");
        assert!(grants.grants()[1].conditions.is_some());
    }

    #[test]
    fn test_grants_file_unknown_verb() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"[{{ "effect": "Allow", "verb": "FETCH", "path": "/posts" }}]"#).unwrap();

        let result = StaticGrants::from_json_file(file.path());
        assert!(matches!(
            result,
            Err(GrantsFileError::Grant(AuthzError::InvalidVerb(verb))) if verb == "FETCH"
        ));
    }

    #[test]
    fn test_grants_file_effect_ignores_case() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"[{{ "effect": "allow", "verb": "GET", "path": "/posts" }}]"#).unwrap();

        let grants = StaticGrants::from_json_file(file.path()).unwrap();
        let mut policy = policy();
        grants
            .apply(&Principal::new("alice"), &claim(), &mut policy)
            .unwrap();
        assert_eq!(policy.build().unwrap().allow_statements().count(), 1);
    }

    #[test]
    fn test_grants_file_unknown_effect() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"[{{ "effect": "Permit", "verb": "GET", "path": "/posts" }}]"#).unwrap();

        let result = StaticGrants::from_json_file(file.path());
        assert!(matches!(
            result,
            Err(GrantsFileError::Grant(AuthzError::InvalidEffect(_)))
        ));
    }

    #[test]
    fn test_conditioned_rule_gets_own_statement() {
        let mut conditions = Conditions::new();
        conditions.insert("IpAddress".into(), serde_json::json!({ "aws:SourceIp": ["10.0.0.0/8"] }));
        let grants = StaticGrants::new(vec![
            GrantRule::allow(HttpVerb::Get, "/posts"),
            GrantRule::allow(HttpVerb::Post, "/posts").with_conditions(conditions),
        ])
        .unwrap();

        let mut policy = policy();
        grants
            .apply(&Principal::new("alice"), &claim(), &mut policy)
            .unwrap();
        assert_eq!(policy.build().unwrap().allow_statements().count(), 2);
    }
}
