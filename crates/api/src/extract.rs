//! Request extractors.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use common::UserId;

use crate::error::ApiError;

/// Header carrying the authenticated caller's id.
pub const USER_ID_HEADER: &str = "x-user-id";

/// The caller, as identified by the upstream gateway.
#[derive(Debug, Clone, Copy)]
pub struct Caller(pub UserId);

impl<S: Send + Sync> FromRequestParts<S> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(USER_ID_HEADER)
            .ok_or_else(|| ApiError::Unauthorized(format!("missing {USER_ID_HEADER} header")))?;

        let user_id = value
            .to_str()
            .ok()
            .and_then(|v| v.parse::<UserId>().ok())
            .ok_or_else(|| ApiError::BadRequest(format!("invalid {USER_ID_HEADER} header")))?;

        Ok(Caller(user_id))
    }
}
