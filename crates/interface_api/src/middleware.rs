//! API middleware and request extractors

use axum::{
    async_trait,
    body::Body,
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use tracing::{info, warn};

use core_kernel::{Actor, RequestContext, StaffId};

use crate::error::ApiError;

pub const STAFF_ID_HEADER: &str = "x-staff-id";
pub const STAFF_NAME_HEADER: &str = "x-staff-name";
pub const REQUEST_ID_HEADER: &str = "x-request-id";

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|h| h.to_str().ok()).filter(|v| !v.is_empty())
}

/// The staff member performing a mutation, taken from request headers
///
/// Authentication happens upstream; this only turns the forwarded staff id
/// into an explicit [`RequestContext`] for the services.
#[derive(Debug, Clone)]
pub struct CurrentActor(pub RequestContext);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentActor
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = header(&parts.headers, STAFF_ID_HEADER).ok_or_else(|| {
            warn!(uri = %parts.uri, "Missing staff id header");
            ApiError::BadRequest(format!("Missing {} header", STAFF_ID_HEADER))
        })?;
        let staff_id: StaffId = raw
            .parse()
            .map_err(|_| ApiError::BadRequest(format!("Invalid {} header: {}", STAFF_ID_HEADER, raw)))?;
        let name = header(&parts.headers, STAFF_NAME_HEADER).unwrap_or("staff");

        let mut ctx = RequestContext::new(Actor::staff(staff_id, name));
        if let Some(request_id) = header(&parts.headers, REQUEST_ID_HEADER) {
            ctx = ctx.with_correlation_id(request_id);
        }
        Ok(CurrentActor(ctx))
    }
}

/// Audit logging middleware
///
/// Logs every API request with the acting staff member
pub async fn audit_middleware(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let staff = header(request.headers(), STAFF_ID_HEADER)
        .unwrap_or("anonymous")
        .to_string();

    let start = Utc::now();
    let response = next.run(request).await;
    let duration = Utc::now() - start;
    let status = response.status();

    info!(
        method = %method,
        uri = %uri,
        staff = %staff,
        status = %status.as_u16(),
        duration_ms = duration.num_milliseconds(),
        "API request"
    );

    response
}
