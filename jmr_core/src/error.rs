use reqwest::StatusCode;
use thiserror::Error;

/// Errors produced while talking to the backend API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a usable response: connection refused,
    /// timeout, or a body that was not valid JSON.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a non-success HTTP status.
    #[error("server returned HTTP {0}")]
    Http(StatusCode),

    /// The response envelope reported `success: false`. Carries the
    /// backend's own message.
    #[error("backend error: {0}")]
    Backend(String),
}

impl ApiError {
    /// Whether a retry could plausibly succeed. Backend refusals are
    /// definitive: an unknown download id stays unknown.
    pub fn is_transient(&self) -> bool {
        match self {
            ApiError::Transport(_) => true,
            ApiError::Http(status) => status.is_server_error(),
            ApiError::Backend(_) => false,
        }
    }
}

/// Terminal outcome of a monitoring session that did not end in a
/// completed download.
#[derive(Debug, Error)]
pub enum MonitorError {
    /// The backend reported that the download itself failed.
    #[error("download failed: {0}")]
    Terminal(String),

    /// A progress poll failed and no retry budget was left.
    #[error("progress poll failed: {0}")]
    Poll(#[from] ApiError),
}
