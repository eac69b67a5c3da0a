use crate::client::ApiClient;
use crate::error::ApiResult;
use crate::types::{Credentials, LoginResponse, User};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info};

/// Client-side view of who is logged in. The backend cookie is the source of truth; this only
/// mirrors `/auth/me`.
#[derive(Clone)]
pub struct SessionStore {
    api: ApiClient,
    user: Arc<RwLock<Option<User>>>,
}

impl SessionStore {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            user: Arc::new(RwLock::new(None)),
        }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub async fn user(&self) -> Option<User> {
        self.user.read().await.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.user.read().await.is_some()
    }

    pub async fn set_user(&self, user: Option<User>) {
        *self.user.write().await = user;
    }

    /// Startup check. Any failure leaves the session logged out.
    pub async fn check(&self) -> Option<User> {
        let user = match self.api.current_user().await {
            Ok(user) => user,
            Err(e) => {
                error!("Auth check failed: {}", e);
                None
            }
        };
        self.set_user(user.clone()).await;
        user
    }

    pub async fn login(&self, credentials: &Credentials) -> ApiResult<LoginResponse> {
        let response = self.api.login(credentials).await?;
        match self.api.current_user().await {
            Ok(user) => self.set_user(user).await,
            Err(e) => {
                error!("Failed to get user data after login: {}", e);
                if let Some(user) = response.user.clone() {
                    self.set_user(Some(user)).await;
                }
            }
        }
        info!("Logged in");
        Ok(response)
    }

    /// Always ends logged out locally, whatever the backend says.
    pub async fn logout(&self) {
        if let Err(e) = self.api.logout().await {
            error!("Logout error: {}", e);
        }
        self.set_user(None).await;
    }

    pub async fn refresh(&self) -> ApiResult<Option<User>> {
        match self.api.current_user().await {
            Ok(user) => {
                self.set_user(user.clone()).await;
                Ok(user)
            }
            Err(e) => {
                error!("Failed to refresh user data: {}", e);
                self.set_user(None).await;
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn credentials() -> Credentials {
        Credentials {
            email: "ada@example.com".into(),
            password: "Secret1!".into(),
        }
    }

    #[tokio::test]
    async fn test_login_falls_back_to_response_user() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "message": "Login successful",
                "user": {"id": 5, "name": "Ada"}
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/auth/me"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let session = SessionStore::new(ApiClient::new(&server.uri()).unwrap());
        session.login(&credentials()).await.unwrap();
        let user = session.user().await.unwrap();
        assert_eq!(user.display_name(), "Ada");
    }

    #[tokio::test]
    async fn test_failed_login_keeps_session_empty() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({"detail": "Invalid credentials"})),
            )
            .mount(&server)
            .await;

        let session = SessionStore::new(ApiClient::new(&server.uri()).unwrap());
        let err = session.login(&credentials()).await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid credentials");
        assert!(!session.is_authenticated().await);
    }

    #[tokio::test]
    async fn test_logout_clears_even_when_backend_fails() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/logout"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let session = SessionStore::new(ApiClient::new(&server.uri()).unwrap());
        session
            .set_user(Some(User {
                name: Some("Ada".into()),
                ..Default::default()
            }))
            .await;
        session.logout().await;
        assert!(!session.is_authenticated().await);
    }

    #[tokio::test]
    async fn test_refresh_error_clears_user_and_propagates() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/me"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let session = SessionStore::new(ApiClient::new(&server.uri()).unwrap());
        session.set_user(Some(User::default())).await;
        assert!(session.refresh().await.is_err());
        assert!(session.user().await.is_none());
        assert!(session.check().await.is_none());
    }
}
