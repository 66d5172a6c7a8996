//! Policy documents for a gateway request authorizer.
//!
//! An authorizer sitting in front of an API gateway answers each inbound call
//! with a policy document: a principal id plus Allow/Deny statements over the
//! resource ARNs of the API stage. The gateway evaluates the document and
//! caches it against the caller's token.
//!
//! This crate is the pure, synchronous half of that job:
//!
//! 1. [`RoutingContext`] recovers region, account, API id and stage from the
//!    route ARN the gateway sends.
//! 2. [`ArnTemplate`] renders resource ARNs for a verb and path.
//! 3. [`PolicyBuilder`] validates and accumulates grants, then compiles them
//!    into the minimal statement list ([`AuthorizerResponse`]).
//!
//! Identity (tokens, principals) lives in the `user` crate and the request
//! pipeline in `api`.
//!
//! # Errors
//!
//! Everything in [`AuthzError`] is a construction defect. A request that is
//! not allowed is expressed as a deny document, never as an error from here.

pub mod arn;
pub mod error;
pub mod policy;
pub mod types;

pub use arn::{ArnTemplate, RoutingContext};
pub use error::{AuthzError, Result};
pub use policy::PolicyBuilder;
pub use types::{
    AuthorizerResponse, Conditions, Effect, Grant, HttpVerb, PolicyDocument, Statement,
    INVOKE_ACTION, PATH_PATTERN, POLICY_VERSION,
};
