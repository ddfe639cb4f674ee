use thiserror::Error;

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status} from {url}")]
    Status { status: u16, url: String },

    #[error("failed to decode response from {url}: {reason}")]
    Decode { url: String, reason: String },

    #[error("exchange API error ({exchange}): {message}")]
    Api { exchange: String, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("mail delivery failed: {0}")]
    Mail(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type MonitorResult<T> = Result<T, MonitorError>;
