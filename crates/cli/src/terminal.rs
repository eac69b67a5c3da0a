//! Popup host for a terminal. The "popup" is the user's own browser: the authorization URL is
//! printed, the user pastes back the address the provider redirected to, and the callback relay
//! runs on it locally. An empty line or end of input counts as closing the window.

use crate::prompt::Prompt;
use aptwise_oauth::{
    CallbackRelay, LocalPopup, LocalWindows, OAuthError, Popup, PopupFeatures, PopupHost, Provider,
    WindowMessage,
};
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, warn};
use url::Url;

#[derive(Clone)]
pub struct TerminalHost {
    windows: LocalWindows,
    prompt: Prompt,
    close_delay: Duration,
}

impl TerminalHost {
    pub fn new(origin: impl Into<String>, prompt: Prompt, close_delay: Duration) -> Self {
        Self {
            windows: LocalWindows::new(origin),
            prompt,
            close_delay,
        }
    }
}

/// The provider a redirect belongs to: from its path (`/auth/github/callback`), else from the popup
/// name (`github_auth`).
fn provider_for(redirect: &Url, window: &str) -> Option<Provider> {
    redirect
        .path_segments()
        .into_iter()
        .flatten()
        .find_map(|segment| segment.parse().ok())
        .or_else(|| window.split('_').next()?.parse().ok())
}

impl PopupHost for TerminalHost {
    type Popup = LocalPopup;

    fn origin(&self) -> &str {
        self.windows.origin()
    }

    fn open(
        &self,
        url: &Url,
        name: &str,
        features: &PopupFeatures,
    ) -> Result<LocalPopup, OAuthError> {
        let popup = self.windows.open(url, name, features)?;

        println!();
        println!("Open this address in your browser to continue:");
        println!();
        println!("  {}", url);
        println!();
        println!("Then paste the address you were sent back to (empty line cancels).");

        let windows = self.windows.clone();
        let prompt = self.prompt.clone();
        let origin = self.windows.origin().to_string();
        let close_delay = self.close_delay;
        let name = name.to_string();
        let handle = popup.clone();
        tokio::spawn(async move {
            loop {
                let line = match prompt.read_line("> ").await {
                    Ok(Some(line)) => line,
                    Ok(None) => String::new(),
                    Err(e) => {
                        warn!("Failed to read redirect address: {}", e);
                        String::new()
                    }
                };
                if handle.is_closed() {
                    return;
                }
                if line.is_empty() {
                    debug!(window = %name, "User closed the authentication window");
                    handle.close();
                    return;
                }
                let redirect = match Url::parse(&line) {
                    Ok(redirect) => redirect,
                    Err(e) => {
                        println!("That is not a full address ({}). Try again:", e);
                        continue;
                    }
                };
                let Some(provider) = provider_for(&redirect, &name) else {
                    warn!(window = %name, "Could not tell which provider the redirect is for");
                    handle.close();
                    return;
                };
                // The relay page runs wherever the provider sent the browser.
                let opener =
                    windows.opener_for(&redirect.origin().ascii_serialization(), Some(&name));
                CallbackRelay::new(provider, origin.as_str())
                    .with_close_delay(close_delay)
                    .run(&redirect, Some(&opener), &handle)
                    .await;
                return;
            }
        });

        Ok(popup)
    }

    fn listen(&self) -> broadcast::Receiver<WindowMessage> {
        self.windows.listen()
    }
}
