//! Resource ARN parsing and rendering.
//!
//! The gateway hands the authorizer the ARN of the route being invoked:
//!
//! ```text
//! arn:aws:execute-api:us-east-1:123456789012:abcdef123/prod/GET/pets
//! ```
//!
//! [`RoutingContext::parse`] recovers the deployment coordinates once per
//! request, and [`ArnTemplate::render`] combines them with a verb and path to
//! name the resources a statement applies to.

use std::fmt;

use crate::error::{AuthzError, Result};
use crate::types::HttpVerb;

/// Deployment coordinates of an API stage.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RoutingContext {
    pub partition: String,
    pub service: String,
    pub region: String,
    pub account_id: String,
    pub api_id: String,
    pub stage: String,
    /// Verb of the inbound call, if the ARN carried one.
    pub method: Option<String>,
    /// Path of the inbound call, if the ARN carried one.
    pub resource_path: Option<String>,
}

impl RoutingContext {
    pub const DEFAULT_PARTITION: &'static str = "aws";
    pub const DEFAULT_SERVICE: &'static str = "execute-api";

    /// Creates a context for a stage in the default partition and service.
    pub fn new(
        region: impl Into<String>,
        account_id: impl Into<String>,
        api_id: impl Into<String>,
        stage: impl Into<String>,
    ) -> Self {
        Self {
            partition: Self::DEFAULT_PARTITION.to_string(),
            service: Self::DEFAULT_SERVICE.to_string(),
            region: region.into(),
            account_id: account_id.into(),
            api_id: api_id.into(),
            stage: stage.into(),
            method: None,
            resource_path: None,
        }
    }

    /// Parses a gateway route ARN.
    ///
    /// The ARN must have six `:`-separated fields, the first being `arn`, and
    /// the last must contain at least `api-id/stage`. Anything after the stage
    /// is kept as the inbound method and path.
    pub fn parse(resource_arn: &str) -> Result<Self> {
        let invalid = |why: &str| AuthzError::InvalidResourceArn(format!("{resource_arn}: {why}"));

        let fields: Vec<&str> = resource_arn.splitn(6, ':').collect();
        let [prefix, partition, service, region, account_id, route] = fields.as_slice() else {
            return Err(invalid("expected six ':' separated fields"));
        };

        if *prefix != "arn" {
            return Err(invalid("missing 'arn' prefix"));
        }

        let mut segments = route.splitn(4, '/');
        let api_id = segments.next().unwrap_or_default();
        let stage = segments.next().unwrap_or_default();

        if api_id.is_empty() || stage.is_empty() {
            return Err(invalid("missing api id or stage"));
        }

        let method = segments.next().filter(|s| !s.is_empty()).map(str::to_string);
        let resource_path = segments.next().map(str::to_string);

        Ok(Self {
            partition: partition.to_string(),
            service: service.to_string(),
            region: region.to_string(),
            account_id: account_id.to_string(),
            api_id: api_id.to_string(),
            stage: stage.to_string(),
            method,
            resource_path,
        })
    }
}

impl fmt::Display for RoutingContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "arn:{}:{}:{}:{}:{}/{}",
            self.partition, self.service, self.region, self.account_id, self.api_id, self.stage
        )
    }
}

/// Renders resource ARNs for a stage.
pub struct ArnTemplate;

impl ArnTemplate {
    /// Builds `arn:partition:service:region:account:api/stage/VERB/path`.
    ///
    /// A single leading `/` on `path` is dropped so `/pets` and `pets` name the
    /// same resource.
    pub fn render(ctx: &RoutingContext, verb: HttpVerb, path: &str) -> String {
        let path = path.strip_prefix('/').unwrap_or(path);
        format!("{}/{}/{}", ctx, verb.as_str(), path)
    }
}
