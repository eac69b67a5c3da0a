//! The page loaded inside the popup once the provider redirects back to the application. It turns
//! the redirect query into one message for the opener, then closes the popup.

use crate::message::{CallbackMessage, INVALID_CALLBACK_PARAMETERS};
use crate::window::{Opener, Popup};
use aptwise_api::Provider;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// Time left for the posted message to flush before the popup closes itself.
pub const DEFAULT_CLOSE_DELAY: Duration = Duration::from_millis(1500);

#[derive(Debug, Clone)]
pub struct CallbackRelay {
    provider: Provider,
    origin: String,
    close_delay: Duration,
}

impl CallbackRelay {
    /// `origin` is the application's own origin; messages are only posted to it.
    pub fn new(provider: Provider, origin: impl Into<String>) -> Self {
        Self {
            provider,
            origin: origin.into(),
            close_delay: DEFAULT_CLOSE_DELAY,
        }
    }

    pub fn with_close_delay(mut self, close_delay: Duration) -> Self {
        self.close_delay = close_delay;
        self
    }

    /// Maps the redirect URL to the message the opener should receive.
    pub fn interpret(&self, url: &Url) -> CallbackMessage {
        let param = |name: &str| {
            url.query_pairs()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.into_owned())
                .filter(|value| !value.is_empty())
        };

        if let Some(error) = param("error") {
            return CallbackMessage::Error {
                provider: self.provider,
                error: Some(param("error_description").unwrap_or(error)),
            };
        }

        match (param("code"), param("state")) {
            (Some(code), Some(state)) => CallbackMessage::Success {
                provider: self.provider,
                code,
                state,
            },
            _ => CallbackMessage::Error {
                provider: self.provider,
                error: Some(INVALID_CALLBACK_PARAMETERS.to_string()),
            },
        }
    }

    /// Posts the outcome to `opener` (skipped when there is none or it has closed), then closes
    /// `popup` after the close delay whatever happened.
    pub async fn run<O, P>(&self, url: &Url, opener: Option<&O>, popup: &P) -> CallbackMessage
    where
        O: Opener + ?Sized,
        P: Popup + ?Sized,
    {
        let message = self.interpret(url);
        match opener {
            Some(opener) if !opener.is_closed() => {
                info!(provider = %self.provider, "Relaying OAuth callback to opener");
                opener.post_message(message.to_wire(), &self.origin);
            }
            _ => debug!(provider = %self.provider, "No opener to relay OAuth callback to"),
        }

        tokio::time::sleep(self.close_delay).await;
        popup.close();
        message
    }
}
