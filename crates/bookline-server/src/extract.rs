//! Request extractors.
//!
//! Authentication is a black box upstream of this service: the
//! authenticated principal arrives as an `X-User-Id` header. A missing
//! or malformed header is a 401.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

use bookline_api::ApiError;

pub const USER_ID_HEADER: &str = "x-user-id";

/// The authenticated user, before identity resolution.
#[derive(Debug, Clone, Copy)]
pub struct Principal(pub Uuid);

impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::unauthorized("missing X-User-Id header"))?;
        let user_id = Uuid::parse_str(header)
            .map_err(|_| ApiError::unauthorized("X-User-Id is not a valid UUID"))?;
        Ok(Self(user_id))
    }
}
