use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// OAuth identity providers the backend can broker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    LinkedIn,
    GitHub,
}

impl Provider {
    pub const ALL: [Provider; 2] = [Provider::LinkedIn, Provider::GitHub];

    /// Path segment and field prefix used by the backend (`/auth/linkedin/...`, `linkedin_id`).
    pub fn slug(self) -> &'static str {
        match self {
            Provider::LinkedIn => "linkedin",
            Provider::GitHub => "github",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Provider::LinkedIn => "LinkedIn",
            Provider::GitHub => "GitHub",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "linkedin" => Ok(Provider::LinkedIn),
            "github" => Ok(Provider::GitHub),
            other => Err(format!("Unknown provider: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserId {
    Int(i64),
    Str(String),
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserId::Int(id) => write!(f, "{}", id),
            UserId::Str(id) => f.write_str(id),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub id: Option<UserId>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub linkedin_url: Option<String>,
    #[serde(default)]
    pub github_url: Option<String>,
    #[serde(default)]
    pub profile_picture_url: Option<String>,
    #[serde(default)]
    pub is_linkedin_connected: bool,
    #[serde(default)]
    pub is_github_connected: bool,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl User {
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.full_name.as_deref())
            .or(self.email.as_deref())
            .unwrap_or("unknown user")
    }

    pub fn is_connected(&self, provider: Provider) -> bool {
        match provider {
            Provider::LinkedIn => self.is_linkedin_connected || self.linkedin_url.is_some(),
            Provider::GitHub => self.is_github_connected || self.github_url.is_some(),
        }
    }
}

/// `/auth/me` answers either `{ "user": {...} }` or the bare user object.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum MeResponse {
    Wrapped { user: User },
    Bare(User),
}

impl MeResponse {
    pub(crate) fn into_user(self) -> User {
        match self {
            MeResponse::Wrapped { user } | MeResponse::Bare(user) => user,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub user: Option<User>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizationUrl {
    pub authorization_url: String,
    #[serde(default)]
    pub state: Option<String>,
}

/// Body of every code-for-result exchange (`callback`, `connect`, `profile`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeExchange {
    pub code: String,
    pub state: String,
}

/// Backend answer to a code exchange, kept as raw JSON since each endpoint returns a different shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExchangeResult {
    pub body: Value,
}

impl ExchangeResult {
    pub fn new(body: Value) -> Self {
        Self { body }
    }

    /// The existing-user identity, if the backend returned one. Null ids count as absent.
    pub fn user_id(&self) -> Option<&Value> {
        self.body
            .get("user")
            .and_then(|u| u.get("id"))
            .filter(|id| !id.is_null())
    }

    pub fn user(&self) -> Option<User> {
        self.body
            .get("user")
            .filter(|u| u.is_object())
            .and_then(|u| serde_json::from_value(u.clone()).ok())
    }

    pub fn message(&self) -> Option<&str> {
        self.body.get("message").and_then(|v| v.as_str())
    }

    /// Profile data for registration pre-fill, read from `profile` or from the top level.
    pub fn profile(&self, provider: Provider) -> Option<OAuthProfile> {
        let source = match self.body.get("profile") {
            Some(p) if p.is_object() => p,
            _ => &self.body,
        };
        OAuthProfile::from_json(provider, source)
    }
}

/// Provider profile subset used to pre-fill the registration form. Held only in memory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OAuthProfile {
    pub provider: Option<Provider>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub profile_url: Option<String>,
    pub provider_id: Option<String>,
    pub username: Option<String>,
    pub access_token: Option<String>,
    pub profile_picture_url: Option<String>,
}

impl OAuthProfile {
    pub fn from_json(provider: Provider, data: &Value) -> Option<Self> {
        let obj = data.as_object()?;
        let slug = provider.slug();
        let text = |key: &str| -> Option<String> {
            match obj.get(key)? {
                Value::String(s) if !s.is_empty() => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            }
        };

        let profile = Self {
            provider: Some(provider),
            name: text("name").or_else(|| text("full_name")),
            email: text("email"),
            profile_url: text(&format!("{}_url", slug)),
            provider_id: text(&format!("{}_id", slug)),
            username: text("username").or_else(|| text("login")),
            access_token: text(&format!("{}_access_token", slug))
                .or_else(|| text("access_token")),
            profile_picture_url: text("profile_picture_url"),
        };

        if profile.provider_id.is_none() && profile.email.is_none() && profile.name.is_none() {
            return None;
        }
        Some(profile)
    }

    /// The public profile link, synthesised from the id or username when the backend sent none.
    pub fn public_url(&self) -> Option<String> {
        if let Some(url) = &self.profile_url {
            return Some(url.clone());
        }
        match self.provider? {
            Provider::LinkedIn => self
                .provider_id
                .as_ref()
                .map(|id| format!("https://linkedin.com/in/{}", id)),
            Provider::GitHub => self
                .username
                .as_ref()
                .or(self.provider_id.as_ref())
                .map(|name| format!("https://github.com/{}", name)),
        }
    }
}

/// `POST /auth/create-account` body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateAccount {
    pub name: String,
    pub email: String,
    /// `None` only for OAuth-only registrations; the backend generates a password then.
    pub password: Option<String>,
    pub linkedin_url: Option<String>,
    pub github_url: Option<String>,
    pub skills: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub interview_categories: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub linkedin_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub linkedin_access_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub is_linkedin_connected: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub github_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub github_access_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub is_github_connected: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub profile_picture_url: Option<String>,
    pub is_oauth_only: bool,
}
