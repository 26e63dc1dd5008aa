//! Response envelope shared by every endpoint.

use serde::Serialize;
use taskhub_core::FieldError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ResponseStatus {
    Success,
    Failed,
}

/// `{status, message, data?, errors?}`
#[derive(Debug, Serialize)]
pub struct ApiResponse<T = serde_json::Value> {
    pub status: ResponseStatus,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
}

impl<T> ApiResponse<T> {
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self {
            status: ResponseStatus::Success,
            message: message.into(),
            data: Some(data),
            errors: None,
        }
    }
}

impl ApiResponse {
    pub fn failed(message: impl Into<String>, errors: Option<Vec<FieldError>>) -> Self {
        Self {
            status: ResponseStatus::Failed,
            message: message.into(),
            data: None,
            errors,
        }
    }
}
