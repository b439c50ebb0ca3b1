//! Request extractors shared by handlers.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::domain::Principal;
use crate::error::GatewayError;

/// Header carrying the caller identity.
pub const PRINCIPAL_HEADER: &str = "x-principal";

/// Identity of the account issuing the request, taken from the
/// `x-principal` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller(pub Principal);

impl<S: Send + Sync> FromRequestParts<S> for Caller {
    type Rejection = GatewayError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(PRINCIPAL_HEADER)
            .ok_or(GatewayError::Unauthenticated)?
            .to_str()
            .map_err(|_| GatewayError::InvalidRequest("x-principal is not valid ASCII".into()))?
            .trim();
        if raw.is_empty() {
            return Err(GatewayError::Unauthenticated);
        }
        Ok(Self(Principal::new(raw)))
    }
}
