#[cfg(feature = "server")]
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
#[cfg(feature = "server")]
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IcpError {
    #[error("Invalid host: {0}")]
    InvalidHost(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Configuration error: {0}")]
    ConfigError(#[from] config::ConfigError),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IcpError {
    /// Short label used for error metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            IcpError::InvalidHost(_) => "invalid_host",
            IcpError::InvalidUrl(_) => "invalid_url",
            IcpError::UnknownProvider(_) => "unknown_provider",
            IcpError::HttpError(_) => "http",
            IcpError::JsonError(_) => "json",
            IcpError::IoError(_) => "io",
            IcpError::StorageError(_) => "storage",
            IcpError::ConfigError(_) => "config",
            IcpError::Internal(_) => "internal",
        }
    }
}

#[cfg(feature = "server")]
impl IntoResponse for IcpError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            IcpError::InvalidHost(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            IcpError::InvalidUrl(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string()),
        };

        let body = Json(json!({
            "error": error_message,
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}
