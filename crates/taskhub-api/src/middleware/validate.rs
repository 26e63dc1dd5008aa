//! Field validation against a per-route [`RuleSet`].
//!
//! Path params, query string and JSON body are collected into
//! [`RequestFields`], validated, and written back sanitized: the query string
//! is re-encoded and a JSON body is re-serialized, so the handler only ever
//! sees trimmed values.

use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    http::{
        header::{CONTENT_LENGTH, CONTENT_TYPE},
        uri::PathAndQuery,
        HeaderValue, Uri,
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use serde_json::{Map, Value};
use taskhub_core::{AppError, RequestFields, RuleSet};

use super::raw_path_params;
use crate::error::{HttpAppError, INVALID_BODY_MESSAGE, INVALID_QUERY_MESSAGE};

/// Bodies on validated routes are small JSON documents.
const MAX_VALIDATED_BODY_BYTES: usize = 1024 * 1024;

/// Mount with `from_fn_with_state(&*RULES, validate_fields)`.
pub async fn validate_fields(
    State(rules): State<&'static RuleSet>,
    request: Request,
    next: Next,
) -> Response {
    match sanitize_request(rules, request).await {
        Ok(request) => next.run(request).await,
        Err(err) => err.into_response(),
    }
}

async fn sanitize_request(rules: &RuleSet, request: Request) -> Result<Request, HttpAppError> {
    let (mut parts, body) = request.into_parts();

    let params = raw_path_params(&mut parts)
        .await?
        .into_iter()
        .map(|(name, value)| (name, Value::String(value)))
        .collect();
    let query = parse_query(parts.uri.query())?;

    let bytes = to_bytes(body, MAX_VALIDATED_BODY_BYTES).await.map_err(|e| {
        tracing::debug!(error = %e, "Failed to buffer request body");
        AppError::PayloadTooLarge("Request body is too large!".to_string())
    })?;
    let has_body = !bytes.iter().all(u8::is_ascii_whitespace);
    let body = if has_body { parse_body(&bytes)? } else { Map::new() };

    let mut fields = RequestFields::new(params, query, body);
    rules.validate(&mut fields).map_err(AppError::from)?;

    parts.uri = rewrite_query(&parts.uri, fields.query())?;

    let body = if has_body {
        let json = serde_json::to_vec(fields.body())
            .map_err(|e| AppError::Internal(format!("Failed to re-encode body: {}", e)))?;
        parts
            .headers
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        parts.headers.insert(CONTENT_LENGTH, HeaderValue::from(json.len()));
        Body::from(json)
    } else {
        Body::from(bytes)
    };

    Ok(Request::from_parts(parts, body))
}

fn parse_query(raw: Option<&str>) -> Result<Map<String, Value>, HttpAppError> {
    let Some(raw) = raw else {
        return Ok(Map::new());
    };
    let pairs: Vec<(String, String)> = serde_urlencoded::from_str(raw).map_err(|e| {
        tracing::debug!(error = %e, "Rejected query string");
        AppError::InvalidInput(INVALID_QUERY_MESSAGE.to_string())
    })?;
    Ok(pairs
        .into_iter()
        .map(|(name, value)| (name, Value::String(value)))
        .collect())
}

fn parse_body(bytes: &Bytes) -> Result<Map<String, Value>, HttpAppError> {
    match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(AppError::InvalidInput(INVALID_BODY_MESSAGE.to_string()).into()),
        Err(e) => {
            tracing::debug!(error = %e, "Rejected JSON body");
            Err(AppError::InvalidInput(INVALID_BODY_MESSAGE.to_string()).into())
        }
    }
}

fn query_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn rewrite_query(uri: &Uri, query: &Map<String, Value>) -> Result<Uri, HttpAppError> {
    if uri.query().is_none() && query.is_empty() {
        return Ok(uri.clone());
    }

    let pairs: Vec<(&str, String)> = query
        .iter()
        .map(|(name, value)| (name.as_str(), query_value(value)))
        .collect();
    let encoded = serde_urlencoded::to_string(&pairs)
        .map_err(|e| AppError::Internal(format!("Failed to re-encode query: {}", e)))?;

    let path_and_query = if encoded.is_empty() {
        uri.path().to_string()
    } else {
        format!("{}?{}", uri.path(), encoded)
    };

    let mut uri_parts = uri.clone().into_parts();
    uri_parts.path_and_query = Some(
        PathAndQuery::try_from(path_and_query)
            .map_err(|e| AppError::Internal(format!("Invalid rewritten URI: {}", e)))?,
    );
    Uri::from_parts(uri_parts)
        .map_err(|e| AppError::Internal(format!("Invalid rewritten URI: {}", e)).into())
}
