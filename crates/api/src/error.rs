use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Non-2xx response. `message` is the backend's `detail` when it sent one.
    #[error("{message}")]
    Http { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl ApiError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ApiError::Http { status: 401, .. } => "You are not signed in.",
            ApiError::Http { status, .. } if *status >= 500 => {
                "Server error. Please try again later."
            }
            ApiError::Http { .. } => "The request was rejected.",
            ApiError::Network(_) => "Network error. Check your connection.",
            ApiError::Decode(_) => "The server sent an unexpected response.",
            ApiError::InvalidUrl(_) => "The API address is misconfigured.",
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            ApiError::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// True for the responses `/auth/me` uses to say "nobody is logged in".
    pub fn is_unauthenticated(&self) -> bool {
        match self {
            ApiError::Http { status, message } => {
                *status == 401
                    || message.contains("Not authenticated")
                    || message.contains("User not found")
            }
            _ => false,
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
