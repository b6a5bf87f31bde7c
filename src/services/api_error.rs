//! Error type shared by the upstream HTTP clients

use reqwest::StatusCode;

/// Why a single upstream request failed
#[derive(Debug)]
pub enum ApiError {
    RateLimited,
    Status(StatusCode),
    Request(reqwest::Error),
    Decode(String),
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::RateLimited => write!(f, "429 Too Many Requests"),
            ApiError::Status(status) => write!(f, "HTTP error: {}", status),
            ApiError::Request(e) => write!(f, "Request error: {}", e),
            ApiError::Decode(msg) => write!(f, "Decode error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        ApiError::Request(e)
    }
}
