use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Failed to connect to ChessQL server. Make sure it's running.")]
    Unreachable(#[source] reqwest::Error),

    /// Non-success response; `detail` is the backend's `{"detail": ...}` text.
    #[error("{detail}")]
    Api { status: u16, detail: String },

    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Page {page} is out of range (1-{total})")]
    PageOutOfRange { page: usize, total: usize },

    #[error("No active search")]
    NoActiveSearch,

    #[error("OAuth failed: {0}")]
    OAuth(String),
}

impl AppError {
    /// Map a transport error, separating "server not running" from the rest.
    pub fn from_transport(e: reqwest::Error) -> Self {
        if e.is_connect() || e.is_timeout() {
            AppError::Unreachable(e)
        } else {
            AppError::Request(e)
        }
    }
}
