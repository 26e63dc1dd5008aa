//! Common utilities for multipart upload handlers

use axum::extract::multipart::{Field, MultipartError};
use axum::http::StatusCode;
use bytes::{Bytes, BytesMut};
use taskhub_core::AppError;

/// Shown for any multipart parsing failure; the parser's message is logged only.
pub const READ_FAILURE_MESSAGE: &str = "Failed to read the uploaded file!";

/// Map a multipart parsing error to a client-safe error.
pub fn multipart_error(err: MultipartError, max_size: usize) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return payload_too_large(max_size);
    }
    tracing::warn!(error = %err.body_text(), "Failed to read multipart body");
    AppError::UploadRejected(READ_FAILURE_MESSAGE.to_string())
}

fn payload_too_large(max_size: usize) -> AppError {
    AppError::PayloadTooLarge(format!(
        "File size exceeds maximum allowed size of {} MB!",
        max_size / 1024 / 1024
    ))
}

/// Validate file size
pub fn validate_file_size(file_size: usize, max_size: usize) -> Result<(), AppError> {
    if file_size > max_size {
        return Err(payload_too_large(max_size));
    }
    Ok(())
}

/// Buffer a field chunk by chunk, aborting as soon as it exceeds `max_size`.
pub async fn read_field_limited(mut field: Field<'_>, max_size: usize) -> Result<Bytes, AppError> {
    let mut buffer = BytesMut::new();
    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| multipart_error(e, max_size))?
    {
        validate_file_size(buffer.len() + chunk.len(), max_size)?;
        buffer.extend_from_slice(&chunk);
    }
    Ok(buffer.freeze())
}

/// Normalize MIME type by stripping parameters (e.g. "image/jpeg; charset=utf-8" -> "image/jpeg").
pub fn normalize_mime_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or(content_type)
        .trim()
        .to_lowercase()
}

pub fn is_image_mime_type(content_type: &str) -> bool {
    normalize_mime_type(content_type)
        .strip_prefix("image/")
        .is_some_and(|subtype| !subtype.is_empty())
}

/// Longest stem accepted as a single path segment.
pub const MAX_FILE_STEM_LENGTH: usize = 128;

/// Whether `raw` can be used unchanged as a file stem: non-empty, at most
/// [`MAX_FILE_STEM_LENGTH`] bytes, and only `[A-Za-z0-9_-]`.
pub fn is_safe_file_stem(raw: &str) -> bool {
    !raw.is_empty()
        && raw.len() <= MAX_FILE_STEM_LENGTH
        && raw
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

/// Lowercased extension of an uploaded filename, if it has a usable one.
pub fn file_extension(filename: &str) -> Option<String> {
    let name = std::path::Path::new(filename).file_name()?.to_str()?;
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() || ext.len() > 10 {
        return None;
    }
    ext.chars()
        .all(|c| c.is_ascii_alphanumeric())
        .then(|| ext.to_ascii_lowercase())
}
