use crate::error::{ApiError, ApiResult};
use crate::types::{
    AuthorizationUrl, CodeExchange, CreateAccount, Credentials, ExchangeResult, LoginResponse,
    MeResponse, Provider, User,
};
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

/// Single choke point for backend calls. Carries the session cookie between requests; no retries,
/// no caching.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> ApiResult<Self> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> ApiResult<Self> {
        Url::parse(base_url)?;
        let http = Client::builder()
            .user_agent("aptwise/0.1")
            .cookie_store(true)
            .connect_timeout(Duration::from_secs(5))
            .timeout(timeout)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Issues a body-less request and decodes the JSON answer.
    pub async fn request<T: DeserializeOwned>(&self, method: Method, path: &str) -> ApiResult<T> {
        let builder = self.http.request(method.clone(), self.url(path));
        self.send(method, path, builder).await
    }

    /// Issues a request with a JSON body and decodes the JSON answer.
    pub async fn request_json<T, B>(&self, method: Method, path: &str, body: &B) -> ApiResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let builder = self.http.request(method.clone(), self.url(path)).json(body);
        self.send(method, path, builder).await
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        builder: RequestBuilder,
    ) -> ApiResult<T> {
        debug!("API request: {} {}", method, path);
        let response = builder.send().await?;
        let status = response.status();
        debug!("API response status: {} for {}", status.as_u16(), path);

        let bytes = response.bytes().await?;
        if !status.is_success() {
            return Err(ApiError::Http {
                status: status.as_u16(),
                message: error_message(status.as_u16(), &bytes),
            });
        }

        let data: Value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)?
        };
        Ok(serde_json::from_value(data)?)
    }

    pub async fn create_account(&self, account: &CreateAccount) -> ApiResult<User> {
        self.request_json(Method::POST, "/auth/create-account", account)
            .await
    }

    pub async fn login(&self, credentials: &Credentials) -> ApiResult<LoginResponse> {
        self.request_json(Method::POST, "/auth/login", credentials)
            .await
    }

    pub async fn logout(&self) -> ApiResult<Value> {
        self.request(Method::POST, "/auth/logout").await
    }

    /// The logged-in user, or `None` when the backend says nobody is authenticated.
    pub async fn current_user(&self) -> ApiResult<Option<User>> {
        match self.request::<MeResponse>(Method::GET, "/auth/me").await {
            Ok(me) => Ok(Some(me.into_user())),
            Err(e) if e.is_unauthenticated() => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn delete_account(&self) -> ApiResult<Value> {
        self.request(Method::DELETE, "/auth/delete-account").await
    }

    pub async fn update_profile(&self, profile: &Value) -> ApiResult<Value> {
        self.request_json(Method::PUT, "/auth/profile", profile)
            .await
    }

    pub async fn update_password(&self, passwords: &Value) -> ApiResult<Value> {
        self.request_json(Method::PUT, "/auth/password", passwords)
            .await
    }

    pub async fn skills(&self) -> ApiResult<Value> {
        self.request(Method::GET, "/auth/skills").await
    }

    pub async fn add_skill(&self, skill: &Value) -> ApiResult<Value> {
        self.request_json(Method::POST, "/auth/skills", skill).await
    }

    pub async fn remove_skill(&self, skill: &Value) -> ApiResult<Value> {
        self.request_json(Method::DELETE, "/auth/skills", skill)
            .await
    }

    pub async fn authorization_url(&self, provider: Provider) -> ApiResult<AuthorizationUrl> {
        self.request(Method::GET, &format!("/auth/{}/authorize", provider.slug()))
            .await
    }

    /// Login or account creation from a provider code.
    pub async fn oauth_callback(
        &self,
        provider: Provider,
        exchange: &CodeExchange,
    ) -> ApiResult<ExchangeResult> {
        self.request_json(
            Method::POST,
            &format!("/auth/{}/callback", provider.slug()),
            exchange,
        )
        .await
    }

    /// Links the provider account to the user of the current session.
    pub async fn oauth_connect(
        &self,
        provider: Provider,
        exchange: &CodeExchange,
    ) -> ApiResult<ExchangeResult> {
        self.request_json(
            Method::POST,
            &format!("/auth/{}/connect", provider.slug()),
            exchange,
        )
        .await
    }

    /// Fetches the provider profile without creating or logging in a user.
    pub async fn oauth_profile(
        &self,
        provider: Provider,
        exchange: &CodeExchange,
    ) -> ApiResult<ExchangeResult> {
        self.request_json(
            Method::POST,
            &format!("/auth/{}/profile", provider.slug()),
            exchange,
        )
        .await
    }

    pub async fn disconnect(&self, provider: Provider) -> ApiResult<Value> {
        // The backend registered LinkedIn's route as DELETE and GitHub's as POST.
        let method = match provider {
            Provider::LinkedIn => Method::DELETE,
            Provider::GitHub => Method::POST,
        };
        self.request(method, &format!("/auth/{}/disconnect", provider.slug()))
            .await
    }
}

fn error_message(status: u16, body: &[u8]) -> String {
    let detail = serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(|v| v.get("detail").cloned());
    match detail {
        Some(Value::String(s)) => s,
        Some(Value::Null) | None => format!("HTTP error! status: {}", status),
        Some(other) => other.to_string(),
    }
}
