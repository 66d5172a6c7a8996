use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

/// Event the gateway sends to the authorizer.
///
/// Only the headers and the route ARN are read; other fields the gateway
/// includes are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizerEvent {
    /// Gateways send `null` for a request without headers.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub headers: HashMap<String, String>,

    #[serde(rename = "routeArn", alias = "methodArn")]
    pub route_arn: String,
}

impl AuthorizerEvent {
    pub fn new(route_arn: impl Into<String>) -> Self {
        Self {
            headers: HashMap::new(),
            route_arn: route_arn.into(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Header value by name.
    ///
    /// An exact-case match wins. Otherwise the name is matched ignoring case,
    /// and several headers differing only in case count as absent.
    pub fn header(&self, name: &str) -> Option<&str> {
        if let Some(value) = self.headers.get(name) {
            return Some(value.as_str());
        }

        let mut matches = self
            .headers
            .iter()
            .filter(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str());

        match (matches.next(), matches.next()) {
            (Some(value), None) => Some(value),
            _ => None,
        }
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<HashMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<HashMap<String, String>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
}
