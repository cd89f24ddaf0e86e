use shared::error::ErrorCode;
use thiserror::Error;

pub type GatewayResult<T> = std::result::Result<T, GatewayError>;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("invalid fleet API base url '{0}'")]
    InvalidBaseUrl(String),
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
    #[error("request to {path} failed: {source}")]
    Transport {
        path: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{}", describe_status(.status, .message))]
    Status {
        path: String,
        status: u16,
        code: ErrorCode,
        message: Option<String>,
    },
    #[error("unexpected response body from {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl GatewayError {
    pub fn status(path: impl Into<String>, status: u16, message: Option<String>) -> Self {
        Self::Status {
            path: path.into(),
            status,
            code: ErrorCode::from_status(status),
            message,
        }
    }

    /// Message shown in a section or coordinator error slot. Falls back to
    /// `fallback` when the backend answered without any detail.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Status {
                status,
                message: None,
                ..
            } => format!("{fallback} (HTTP {status})"),
            other => other.to_string(),
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }
}

fn describe_status(status: &u16, message: &Option<String>) -> String {
    match message {
        Some(message) => message.clone(),
        None => format!("backend answered HTTP {status}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_message_prefers_backend_detail() {
        let err = GatewayError::status("/api/usage/2001", 404, Some("sim not found".into()));
        assert_eq!(err.user_message("usage data could not be loaded"), "sim not found");
        assert!(matches!(
            err,
            GatewayError::Status {
                code: ErrorCode::NotFound,
                ..
            }
        ));
    }

    #[test]
    fn user_message_falls_back_without_detail() {
        let err = GatewayError::status("/api/anomalies/2001", 503, None);
        assert_eq!(
            err.user_message("anomaly data could not be loaded"),
            "anomaly data could not be loaded (HTTP 503)"
        );
        assert_eq!(err.to_string(), "backend answered HTTP 503");
    }
}
