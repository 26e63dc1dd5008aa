//! HTTP error response conversion
//!
//! Handlers return `Result<_, HttpAppError>`; any `AppError` converts into it
//! with `?` and renders as the `Failed` envelope with the variant's status.
//! Extractor rejections are mapped here too, so clients never see a raw
//! library message.

use axum::{
    body::Bytes,
    extract::rejection::{JsonRejection, QueryRejection},
    extract::{FromRequest, FromRequestParts, Query, Request},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::de::DeserializeOwned;
use taskhub_core::{AppError, ErrorMetadata, LogLevel};

use crate::response::ApiResponse;

/// Shown for any body that is not the JSON the endpoint expects.
pub const INVALID_BODY_MESSAGE: &str = "Invalid request body!";

/// Shown for a query string that does not fit the endpoint's parameters.
pub const INVALID_QUERY_MESSAGE: &str = "Invalid query parameters!";

/// Wrapper type for AppError to implement IntoResponse
/// (orphan rule: both the trait and `AppError` live in other crates).
#[derive(Debug)]
pub struct HttpAppError(pub AppError);

impl From<AppError> for HttpAppError {
    fn from(err: AppError) -> Self {
        HttpAppError(err)
    }
}

impl From<anyhow::Error> for HttpAppError {
    fn from(err: anyhow::Error) -> Self {
        HttpAppError(AppError::from(err))
    }
}

impl From<JsonRejection> for HttpAppError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!(rejection = %rejection.body_text(), "Rejected JSON body");
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return HttpAppError(AppError::PayloadTooLarge(
                "Request body is too large!".to_string(),
            ));
        }
        HttpAppError(AppError::InvalidInput(INVALID_BODY_MESSAGE.to_string()))
    }
}

impl From<QueryRejection> for HttpAppError {
    fn from(rejection: QueryRejection) -> Self {
        tracing::debug!(rejection = %rejection.body_text(), "Rejected query string");
        HttpAppError(AppError::InvalidInput(INVALID_QUERY_MESSAGE.to_string()))
    }
}

/// `Json<T>` with rejections rendered as the `Failed` envelope.
#[derive(Debug, Clone, Copy)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = HttpAppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(inner) = Json::<T>::from_request(req, state)
            .await
            .map_err(HttpAppError::from)?;
        Ok(ValidatedJson(inner))
    }
}

/// JSON body that may be missing entirely; an empty body yields `T::default()`.
///
/// Partial-update endpoints use this so an empty request reaches the handler
/// and is answered with the endpoint's own "nothing to update" message.
#[derive(Debug, Clone, Copy)]
pub struct OptionalJson<T>(pub T);

impl<T, S> FromRequest<S> for OptionalJson<T>
where
    T: DeserializeOwned + Default + Send,
    S: Send + Sync,
{
    type Rejection = HttpAppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state).await.map_err(|rejection| {
            tracing::debug!(rejection = %rejection.body_text(), "Failed to buffer request body");
            if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
                HttpAppError(AppError::PayloadTooLarge(
                    "Request body is too large!".to_string(),
                ))
            } else {
                HttpAppError(AppError::InvalidInput(INVALID_BODY_MESSAGE.to_string()))
            }
        })?;

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(OptionalJson(T::default()));
        }

        serde_json::from_slice(&bytes)
            .map(OptionalJson)
            .map_err(|e| {
                tracing::debug!(error = %e, "Rejected JSON body");
                HttpAppError(AppError::InvalidInput(INVALID_BODY_MESSAGE.to_string()))
            })
    }
}

/// `Query<T>` with rejections rendered as the `Failed` envelope.
#[derive(Debug, Clone, Copy)]
pub struct ValidatedQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ValidatedQuery<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = HttpAppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(inner) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(HttpAppError::from)?;
        Ok(ValidatedQuery(inner))
    }
}

fn log_error(error: &AppError) {
    let error_type = error.error_type();
    let code = error.error_code();
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(error = %error, error_type, code, "Request failed");
        }
        LogLevel::Warn => {
            tracing::warn!(error = %error, error_type, code, "Request failed");
        }
        LogLevel::Error => {
            // Sensitive variants carry the underlying cause; it stays in the log.
            tracing::error!(error = ?error, error_type, code, "Request failed");
        }
    }
}

impl IntoResponse for HttpAppError {
    fn into_response(self) -> Response {
        let app_error = &self.0;

        let status = StatusCode::from_u16(app_error.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        log_error(app_error);

        let errors = app_error.field_errors().map(<[_]>::to_vec);
        let body = ApiResponse::failed(app_error.client_message(), errors);

        (status, Json(body)).into_response()
    }
}
