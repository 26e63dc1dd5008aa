use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use serde::{Deserialize, Serialize};
use taskhub_core::{AppError, EntityId};

use crate::error::HttpAppError;

/// Claims carried by access tokens issued by the auth service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    pub id: String,
    pub username: String,
    /// Expiration timestamp (seconds since the epoch).
    pub exp: usize,
}

/// Authenticated caller, stored in request extensions by [`auth_middleware`].
///
/// [`auth_middleware`]: super::middleware::auth_middleware
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub user_id: EntityId,
    pub username: String,
}

impl TryFrom<AccessClaims> for AuthContext {
    type Error = AppError;

    fn try_from(claims: AccessClaims) -> Result<Self, Self::Error> {
        let user_id = EntityId::parse(&claims.id)
            .map_err(|_| AppError::Unauthorized("Invalid or expired token!".to_string()))?;
        Ok(AuthContext {
            user_id,
            username: claims.username,
        })
    }
}

// Read straight from the request parts so it composes with `Multipart`.
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = HttpAppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<AuthContext>().cloned().ok_or_else(|| {
            HttpAppError(AppError::Unauthorized(
                "Missing authentication context!".to_string(),
            ))
        })
    }
}
