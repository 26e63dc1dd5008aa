use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use std::sync::Arc;
use taskhub_core::AppError;

use super::models::{AccessClaims, AuthContext};
use crate::error::HttpAppError;

const BEARER_PREFIX: &str = "Bearer ";

/// Verification material for HS256 access tokens.
#[derive(Clone)]
pub struct AuthState {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl AuthState {
    pub fn new(secret: &str) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    pub fn verify(&self, token: &str) -> Result<AuthContext, AppError> {
        let data = decode::<AccessClaims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            tracing::debug!(error = %e, "Access token rejected");
            AppError::Unauthorized("Invalid or expired token!".to_string())
        })?;
        AuthContext::try_from(data.claims)
    }
}

fn unauthorized(message: &str) -> Response {
    HttpAppError(AppError::Unauthorized(message.to_string())).into_response()
}

pub async fn auth_middleware(
    State(auth_state): State<Arc<AuthState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let auth_header = match request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
    {
        Some(h) => h,
        None => return unauthorized("Missing authorization header!"),
    };

    let Some(token) = auth_header.strip_prefix(BEARER_PREFIX) else {
        return unauthorized("Invalid authorization header format!");
    };

    let context = match auth_state.verify(token.trim()) {
        Ok(context) => context,
        Err(err) => return HttpAppError(err).into_response(),
    };

    tracing::debug!(user_id = %context.user_id, username = %context.username, "Request authenticated");
    request.extensions_mut().insert(context);
    next.run(request).await
}
