use aptwise_api::{ApiError, Provider};
use thiserror::Error;

/// Every way a popup handshake can fail. Each one rejects the handshake exactly once.
#[derive(Debug, Error)]
pub enum OAuthError {
    /// The backend would not hand out an authorization URL.
    #[error("Could not start {provider} authentication: {source}")]
    Configuration {
        provider: Provider,
        #[source]
        source: ApiError,
    },

    /// The provider redirected back with an error, or with unusable parameters.
    #[error("{message}")]
    Provider { provider: Provider, message: String },

    #[error("Authentication window was closed")]
    Abandoned { provider: Provider },

    /// The backend refused the code/state pair after the provider reported success.
    #[error("{source}")]
    Exchange {
        provider: Provider,
        #[source]
        source: ApiError,
    },

    #[error("Could not open the {provider} authentication window: {reason}")]
    PopupBlocked { provider: Provider, reason: String },
}

impl OAuthError {
    pub fn provider(&self) -> Provider {
        match self {
            OAuthError::Configuration { provider, .. }
            | OAuthError::Provider { provider, .. }
            | OAuthError::Abandoned { provider }
            | OAuthError::Exchange { provider, .. }
            | OAuthError::PopupBlocked { provider, .. } => *provider,
        }
    }

    /// Line suitable for an alert; registration falls back to the manual form after showing it.
    pub fn user_message(&self) -> String {
        match self {
            OAuthError::Configuration { provider, .. } => format!(
                "{} sign-in is not available right now. Please fill in the form manually.",
                provider
            ),
            OAuthError::Provider { provider, message } => {
                format!("{} authentication failed: {}", provider, message)
            }
            OAuthError::Abandoned { .. } => "Authentication window was closed".to_string(),
            OAuthError::Exchange { provider, source } => {
                format!("{} authentication failed: {}", provider, source)
            }
            OAuthError::PopupBlocked { provider, .. } => format!(
                "Could not open the {} window. Please allow popups and try again.",
                provider
            ),
        }
    }
}
