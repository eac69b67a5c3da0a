use aptwise_api::Provider;
use std::fmt;

/// What the caller wants out of the handshake. Selects the backend exchange endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Purpose {
    /// Log in, creating the account on first use (`/auth/{provider}/callback`).
    Authenticate,
    /// Link the provider to the logged-in user (`/auth/{provider}/connect`).
    Connect,
    /// Fetch the provider profile for the registration form without creating a user
    /// (`/auth/{provider}/profile`).
    Register,
}

impl Purpose {
    fn window_suffix(self) -> &'static str {
        match self {
            Purpose::Authenticate => "auth",
            Purpose::Connect => "connect",
            Purpose::Register => "register",
        }
    }
}

impl fmt::Display for Purpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Purpose::Authenticate => "authenticate",
            Purpose::Connect => "connect",
            Purpose::Register => "register",
        })
    }
}

/// Per-provider constants the coordinator and relay are parameterised by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderMeta {
    pub provider: Provider,
    /// Prefix of the cross-window message types, e.g. `GITHUB` in `GITHUB_AUTH_SUCCESS`.
    pub message_prefix: &'static str,
}

impl ProviderMeta {
    pub const fn of(provider: Provider) -> Self {
        let message_prefix = match provider {
            Provider::LinkedIn => "LINKEDIN",
            Provider::GitHub => "GITHUB",
        };
        Self {
            provider,
            message_prefix,
        }
    }

    /// Looks up the provider owning a message type prefix.
    pub fn from_prefix(prefix: &str) -> Option<Self> {
        Provider::ALL
            .into_iter()
            .map(Self::of)
            .find(|meta| meta.message_prefix == prefix)
    }

    pub fn success_type(&self) -> String {
        format!("{}_AUTH_SUCCESS", self.message_prefix)
    }

    pub fn error_type(&self) -> String {
        format!("{}_AUTH_ERROR", self.message_prefix)
    }

    /// Popup name; distinct per (provider, purpose) so a stale handle is never reused.
    pub fn window_name(&self, purpose: Purpose) -> String {
        format!("{}_{}", self.provider.slug(), purpose.window_suffix())
    }

    pub fn fallback_error(&self) -> String {
        format!("{} authentication failed", self.provider)
    }
}
