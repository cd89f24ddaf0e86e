use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    BadRequest,
    NotFound,
    Validation,
    Internal,
    Unavailable,
    Unexpected,
}

impl ErrorCode {
    pub fn from_status(status: u16) -> Self {
        match status {
            400 => Self::BadRequest,
            404 => Self::NotFound,
            422 => Self::Validation,
            502..=504 => Self::Unavailable,
            500..=599 => Self::Internal,
            _ => Self::Unexpected,
        }
    }
}

/// Error body returned by the fleet backend: `{"detail": ...}`.
///
/// `detail` is a plain string for handled errors and a list of field errors
/// for request validation failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    #[serde(default)]
    pub detail: Value,
}

impl ApiError {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: Value::String(detail.into()),
        }
    }

    pub fn message(&self) -> Option<String> {
        match &self.detail {
            Value::String(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
            Value::Array(entries) => {
                let parts: Vec<String> = entries
                    .iter()
                    .filter_map(|entry| {
                        entry
                            .get("msg")
                            .and_then(Value::as_str)
                            .map(str::to_string)
                            .or_else(|| entry.as_str().map(str::to_string))
                    })
                    .collect();
                if parts.is_empty() {
                    None
                } else {
                    Some(parts.join("; "))
                }
            }
            _ => None,
        }
    }
}
