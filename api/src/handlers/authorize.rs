use axum::{
    extract::State,
    http::{HeaderName, HeaderValue},
    response::IntoResponse,
    Json,
};

use crate::{error::ApiResult, models::AuthorizerEvent, AppState};

/// Header naming the decision, for callers that don't parse the document.
pub const DECISION_HEADER: &str = "x-authorizer-decision";

/// Evaluate a gateway event
///
/// POST /api/v1/authorize
///
/// Allow and deny decisions are both answered with 200 and the policy
/// document; only authorizer faults produce an error status.
pub async fn authorize(
    State(state): State<AppState>,
    Json(event): Json<AuthorizerEvent>,
) -> ApiResult<impl IntoResponse> {
    let decision = state.authorizer.authorize(&event).await?;

    let label = if decision.is_allow() { "allow" } else { "deny" };
    let header = (
        HeaderName::from_static(DECISION_HEADER),
        HeaderValue::from_static(label),
    );

    Ok(([header], Json(decision.into_response())))
}
