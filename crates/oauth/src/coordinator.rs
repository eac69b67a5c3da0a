//! Drives one OAuth popup round-trip.
//!
//! ```text
//! Idle -> AwaitingProviderRedirect -> SettlingSuccess | SettlingError | Abandoned -> Closed
//! ```
//!
//! Each call to [`OAuthCoordinator::initiate`] owns its popup handle and its own message
//! subscription, so concurrent handshakes never share state. A handshake settles exactly once:
//! the first callback message ends the wait, the subscription is dropped right there, and nothing
//! received afterwards is looked at. Nothing is retried; callers re-invoke `initiate`.

use crate::error::OAuthError;
use crate::message::CallbackMessage;
use crate::provider::{ProviderMeta, Purpose};
use crate::window::{Popup, PopupFeatures, PopupHost, WindowMessage};
use aptwise_api::{
    ApiClient, ApiError, CodeExchange, ExchangeResult, OAuthProfile, Provider, User,
};
use std::time::Duration;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, warn};
use url::Url;

/// Browsers have no "popup closed" event; the popup is polled at this interval instead, which
/// bounds how late an abandoned handshake is noticed.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Floor for the close-poll period; tokio intervals cannot tick at zero.
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

#[derive(Debug, Clone, Copy)]
pub struct CoordinatorSettings {
    pub poll_interval: Duration,
    pub features: PopupFeatures,
}

impl Default for CoordinatorSettings {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            features: PopupFeatures::default(),
        }
    }
}

/// Successful handshake: the backend's answer plus flags derived from it.
#[derive(Debug, Clone, PartialEq)]
pub struct HandshakeOutcome {
    pub provider: Provider,
    pub purpose: Purpose,
    pub result: ExchangeResult,
    /// No existing user came back; the caller should continue registration.
    pub is_new_user: bool,
    /// The provider account already belongs to a user.
    pub is_linked_account: bool,
}

impl HandshakeOutcome {
    fn new(provider: Provider, purpose: Purpose, result: ExchangeResult) -> Self {
        let is_linked_account = result.user_id().is_some();
        Self {
            provider,
            purpose,
            result,
            is_new_user: !is_linked_account,
            is_linked_account,
        }
    }

    pub fn user(&self) -> Option<User> {
        self.result.user()
    }

    pub fn profile(&self) -> Option<OAuthProfile> {
        self.result.profile(self.provider)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HandshakeState {
    AwaitingProviderRedirect,
    SettlingSuccess,
    SettlingError,
    Abandoned,
    Closed,
}

enum Signal {
    Success(CodeExchange),
    Error(Option<String>),
    Abandoned,
}

/// Per-call state: the popup and the listener. Dropping it (including when the caller drops the
/// `initiate` future) closes the popup if the handshake never reached `Closed`.
struct PendingHandshake<'a, P: Popup> {
    meta: ProviderMeta,
    purpose: Purpose,
    window_name: String,
    origin: &'a str,
    popup: P,
    listener: Option<broadcast::Receiver<WindowMessage>>,
    state: HandshakeState,
}

impl<'a, P: Popup> PendingHandshake<'a, P> {
    fn transition(&mut self, next: HandshakeState) {
        debug!(
            provider = %self.meta.provider,
            purpose = %self.purpose,
            from = ?self.state,
            to = ?next,
            "Handshake state change"
        );
        self.state = next;
    }

    /// Waits for the first relevant message or for the popup to be closed, whichever comes
    /// first, then detaches the listener.
    async fn wait(&mut self, poll_interval: Duration) -> Signal {
        let mut ticker = time::interval(poll_interval.max(MIN_POLL_INTERVAL));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;

        let signal = loop {
            tokio::select! {
                biased;
                received = recv(&mut self.listener) => match received {
                    Ok(message) => {
                        if let Some(signal) = self.accept(message) {
                            break signal;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Message listener lagged; some window messages were dropped");
                    }
                    Err(RecvError::Closed) => {
                        warn!("Message bus closed; only watching the popup from now on");
                        self.listener = None;
                    }
                },
                _ = ticker.tick() => {
                    if self.popup.is_closed() {
                        break Signal::Abandoned;
                    }
                }
            }
        };

        self.listener = None;
        signal
    }

    fn accept(&self, message: WindowMessage) -> Option<Signal> {
        if message.origin != self.origin {
            warn!(origin = %message.origin, "Ignoring message from foreign origin");
            return None;
        }
        if message
            .source
            .as_deref()
            .is_some_and(|source| source != self.window_name)
        {
            return None;
        }
        match CallbackMessage::from_wire(&message.data)? {
            msg if msg.provider() != self.meta.provider => None,
            CallbackMessage::Success { code, state, .. } => {
                Some(Signal::Success(CodeExchange { code, state }))
            }
            CallbackMessage::Error { error, .. } => Some(Signal::Error(error)),
        }
    }

    fn close(&mut self) {
        self.popup.close();
        self.transition(HandshakeState::Closed);
    }
}

impl<P: Popup> Drop for PendingHandshake<'_, P> {
    fn drop(&mut self) {
        if self.state != HandshakeState::Closed {
            self.popup.close();
        }
    }
}

async fn recv(
    listener: &mut Option<broadcast::Receiver<WindowMessage>>,
) -> Result<WindowMessage, RecvError> {
    match listener {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

pub struct OAuthCoordinator<H: PopupHost> {
    api: ApiClient,
    host: H,
    settings: CoordinatorSettings,
}

impl<H: PopupHost> OAuthCoordinator<H> {
    pub fn new(api: ApiClient, host: H) -> Self {
        Self::with_settings(api, host, CoordinatorSettings::default())
    }

    pub fn with_settings(api: ApiClient, host: H, settings: CoordinatorSettings) -> Self {
        Self {
            api,
            host,
            settings,
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Runs one handshake to completion.
    pub async fn initiate(
        &self,
        provider: Provider,
        purpose: Purpose,
    ) -> Result<HandshakeOutcome, OAuthError> {
        let meta = ProviderMeta::of(provider);
        info!(%provider, %purpose, "Starting OAuth handshake");

        let auth = self
            .api
            .authorization_url(provider)
            .await
            .map_err(|source| OAuthError::Configuration { provider, source })?;
        let url = Url::parse(&auth.authorization_url).map_err(|e| OAuthError::Configuration {
            provider,
            source: ApiError::InvalidUrl(e),
        })?;

        // Subscribe before opening so a fast popup cannot post into the void.
        let listener = self.host.listen();
        let window_name = meta.window_name(purpose);
        let popup = self
            .host
            .open(&url, &window_name, &self.settings.features)?;

        let mut pending = PendingHandshake {
            meta,
            purpose,
            window_name,
            origin: self.host.origin(),
            popup,
            listener: Some(listener),
            state: HandshakeState::AwaitingProviderRedirect,
        };

        match pending.wait(self.settings.poll_interval).await {
            Signal::Success(exchange) => {
                pending.transition(HandshakeState::SettlingSuccess);
                let result = self.exchange(provider, purpose, &exchange).await;
                pending.close();
                match result {
                    Ok(result) => {
                        let outcome = HandshakeOutcome::new(provider, purpose, result);
                        info!(
                            %provider,
                            %purpose,
                            is_new_user = outcome.is_new_user,
                            "OAuth handshake succeeded"
                        );
                        Ok(outcome)
                    }
                    Err(source) => {
                        warn!(%provider, %purpose, "Backend rejected OAuth code: {}", source);
                        Err(OAuthError::Exchange { provider, source })
                    }
                }
            }
            Signal::Error(error) => {
                pending.transition(HandshakeState::SettlingError);
                pending.close();
                let message = error.unwrap_or_else(|| meta.fallback_error());
                warn!(%provider, %purpose, "Provider reported an error: {}", message);
                Err(OAuthError::Provider { provider, message })
            }
            Signal::Abandoned => {
                pending.transition(HandshakeState::Abandoned);
                pending.close();
                info!(%provider, %purpose, "Authentication window was closed");
                Err(OAuthError::Abandoned { provider })
            }
        }
    }

    async fn exchange(
        &self,
        provider: Provider,
        purpose: Purpose,
        exchange: &CodeExchange,
    ) -> Result<ExchangeResult, ApiError> {
        match purpose {
            Purpose::Authenticate => self.api.oauth_callback(provider, exchange).await,
            Purpose::Connect => self.api.oauth_connect(provider, exchange).await,
            Purpose::Register => self.api.oauth_profile(provider, exchange).await,
        }
    }

    /// Unlinks the provider from the logged-in user.
    pub async fn disconnect(&self, provider: Provider) -> Result<(), ApiError> {
        self.api.disconnect(provider).await?;
        info!(%provider, "Provider disconnected");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::window::{LocalWindows, OpenedPopup, Opener};
    use serde_json::json;
    use std::sync::Arc;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const ORIGIN: &str = "http://localhost:5174";

    fn settings() -> CoordinatorSettings {
        CoordinatorSettings {
            poll_interval: Duration::from_millis(10),
            features: PopupFeatures::default(),
        }
    }

    async fn mount_authorize(server: &MockServer, provider: Provider) {
        Mock::given(method("GET"))
            .and(path(format!("/auth/{}/authorize", provider.slug())))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "authorization_url": format!("https://{}.example/authorize?state=s", provider.slug())
            })))
            .mount(server)
            .await;
    }

    fn coordinator(
        server: &MockServer,
        windows: &LocalWindows,
    ) -> Arc<OAuthCoordinator<LocalWindows>> {
        coordinator_with(server, windows, settings())
    }

    fn coordinator_with(
        server: &MockServer,
        windows: &LocalWindows,
        settings: CoordinatorSettings,
    ) -> Arc<OAuthCoordinator<LocalWindows>> {
        Arc::new(OAuthCoordinator::with_settings(
            ApiClient::new(&server.uri()).unwrap(),
            windows.clone(),
            settings,
        ))
    }

    async fn next_popup(opened: &mut broadcast::Receiver<OpenedPopup>) -> OpenedPopup {
        opened.recv().await.unwrap()
    }

    #[tokio::test]
    async fn test_github_authenticate_scenario() {
        let server = MockServer::start().await;
        mount_authorize(&server, Provider::GitHub).await;
        Mock::given(method("POST"))
            .and(path("/auth/github/callback"))
            .and(body_json(json!({"code": "abc", "state": "xyz"})))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"user": {"id": 42}})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let windows = LocalWindows::new(ORIGIN);
        let mut opened = windows.on_open();
        let coordinator = coordinator(&server, &windows);
        let task = tokio::spawn({
            let coordinator = coordinator.clone();
            async move { coordinator.initiate(Provider::GitHub, Purpose::Authenticate).await }
        });

        let popup = next_popup(&mut opened).await;
        assert_eq!(popup.name, "github_auth");
        assert_eq!(popup.url.host_str(), Some("github.example"));
        popup.popup.opener().post_message(
            json!({"type": "GITHUB_AUTH_SUCCESS", "code": "abc", "state": "xyz"}),
            ORIGIN,
        );

        let outcome = task.await.unwrap().unwrap();
        assert_eq!(outcome.result.body, json!({"user": {"id": 42}}));
        assert!(outcome.is_linked_account);
        assert!(!outcome.is_new_user);
        assert!(popup.popup.is_closed());
    }

    #[tokio::test]
    async fn test_register_uses_profile_endpoint_and_flags_new_user() {
        let server = MockServer::start().await;
        mount_authorize(&server, Provider::LinkedIn).await;
        Mock::given(method("POST"))
            .and(path("/auth/linkedin/profile"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "Grace", "email": "grace@example.com", "linkedin_id": "grace-h",
                "access_token": "tok"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let windows = LocalWindows::new(ORIGIN);
        let mut opened = windows.on_open();
        let coordinator = coordinator(&server, &windows);
        let task = tokio::spawn({
            let coordinator = coordinator.clone();
            async move { coordinator.initiate(Provider::LinkedIn, Purpose::Register).await }
        });

        let popup = next_popup(&mut opened).await;
        assert_eq!(popup.name, "linkedin_register");
        popup.popup.opener().post_message(
            json!({"type": "LINKEDIN_AUTH_SUCCESS", "code": "c", "state": "s"}),
            ORIGIN,
        );

        let outcome = task.await.unwrap().unwrap();
        assert!(outcome.is_new_user);
        assert!(!outcome.is_linked_account);
        let profile = outcome.profile().unwrap();
        assert_eq!(profile.email.as_deref(), Some("grace@example.com"));
        assert_eq!(profile.access_token.as_deref(), Some("tok"));
    }

    #[tokio::test]
    async fn test_connect_uses_connect_endpoint() {
        let server = MockServer::start().await;
        mount_authorize(&server, Provider::GitHub).await;
        Mock::given(method("POST"))
            .and(path("/auth/github/connect"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "success", "message": "GitHub account connected successfully"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let windows = LocalWindows::new(ORIGIN);
        let mut opened = windows.on_open();
        let coordinator = coordinator(&server, &windows);
        let task = tokio::spawn({
            let coordinator = coordinator.clone();
            async move { coordinator.initiate(Provider::GitHub, Purpose::Connect).await }
        });

        let popup = next_popup(&mut opened).await;
        assert_eq!(popup.name, "github_connect");
        popup.popup.opener().post_message(
            json!({"type": "GITHUB_AUTH_SUCCESS", "code": "c", "state": "s"}),
            ORIGIN,
        );

        let outcome = task.await.unwrap().unwrap();
        assert_eq!(
            outcome.result.message(),
            Some("GitHub account connected successfully")
        );
    }

    #[tokio::test]
    async fn test_authorization_url_failure_is_configuration_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/github/authorize"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({
                "detail": "GitHub OAuth not configured"
            })))
            .mount(&server)
            .await;

        let windows = LocalWindows::new(ORIGIN);
        let mut opened = windows.on_open();
        let err = coordinator(&server, &windows)
            .initiate(Provider::GitHub, Purpose::Authenticate)
            .await
            .unwrap_err();

        assert!(matches!(err, OAuthError::Configuration { .. }));
        assert!(opened.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_invalid_authorization_url_is_configuration_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/linkedin/authorize"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"authorization_url": "not a url"})),
            )
            .mount(&server)
            .await;

        let windows = LocalWindows::new(ORIGIN);
        let mut opened = windows.on_open();
        let err = coordinator(&server, &windows)
            .initiate(Provider::LinkedIn, Purpose::Authenticate)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            OAuthError::Configuration {
                provider: Provider::LinkedIn,
                source: ApiError::InvalidUrl(_),
            }
        ));
        assert!(opened.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_zero_poll_interval_still_detects_closed_popup() {
        let server = MockServer::start().await;
        mount_authorize(&server, Provider::GitHub).await;

        let windows = LocalWindows::new(ORIGIN);
        let mut opened = windows.on_open();
        let coordinator = coordinator_with(
            &server,
            &windows,
            CoordinatorSettings {
                poll_interval: Duration::ZERO,
                features: PopupFeatures::default(),
            },
        );
        let task = tokio::spawn({
            let coordinator = coordinator.clone();
            async move { coordinator.initiate(Provider::GitHub, Purpose::Authenticate).await }
        });

        let popup = next_popup(&mut opened).await;
        popup.popup.close();

        let err = task.await.unwrap().unwrap_err();
        assert!(matches!(err, OAuthError::Abandoned { provider: Provider::GitHub }));
    }

    #[tokio::test]
    async fn test_provider_error_rejects_with_provider_text() {
        let server = MockServer::start().await;
        mount_authorize(&server, Provider::LinkedIn).await;

        let windows = LocalWindows::new(ORIGIN);
        let mut opened = windows.on_open();
        let coordinator = coordinator(&server, &windows);
        let task = tokio::spawn({
            let coordinator = coordinator.clone();
            async move { coordinator.initiate(Provider::LinkedIn, Purpose::Authenticate).await }
        });

        let popup = next_popup(&mut opened).await;
        popup.popup.opener().post_message(
            json!({"type": "LINKEDIN_AUTH_ERROR", "error": "User cancelled"}),
            ORIGIN,
        );

        let err = task.await.unwrap().unwrap_err();
        assert!(matches!(err, OAuthError::Provider { .. }));
        assert_eq!(err.to_string(), "User cancelled");
        assert!(popup.popup.is_closed());
    }

    #[tokio::test]
    async fn test_provider_error_without_text_uses_fallback() {
        let server = MockServer::start().await;
        mount_authorize(&server, Provider::GitHub).await;

        let windows = LocalWindows::new(ORIGIN);
        let mut opened = windows.on_open();
        let coordinator = coordinator(&server, &windows);
        let task = tokio::spawn({
            let coordinator = coordinator.clone();
            async move { coordinator.initiate(Provider::GitHub, Purpose::Authenticate).await }
        });

        let popup = next_popup(&mut opened).await;
        popup
            .popup
            .opener()
            .post_message(json!({"type": "GITHUB_AUTH_ERROR"}), ORIGIN);

        let err = task.await.unwrap().unwrap_err();
        assert_eq!(err.to_string(), "GitHub authentication failed");
    }

    #[tokio::test]
    async fn test_closing_popup_without_message_abandons() {
        let server = MockServer::start().await;
        mount_authorize(&server, Provider::GitHub).await;

        let windows = LocalWindows::new(ORIGIN);
        let mut opened = windows.on_open();
        let coordinator = coordinator(&server, &windows);
        let task = tokio::spawn({
            let coordinator = coordinator.clone();
            async move { coordinator.initiate(Provider::GitHub, Purpose::Authenticate).await }
        });

        let popup = next_popup(&mut opened).await;
        popup.popup.close();

        let err = task.await.unwrap().unwrap_err();
        assert!(matches!(err, OAuthError::Abandoned { .. }));
        assert_eq!(err.to_string(), "Authentication window was closed");
    }

    #[tokio::test]
    async fn test_foreign_origin_message_keeps_handshake_pending() {
        let server = MockServer::start().await;
        mount_authorize(&server, Provider::GitHub).await;

        let windows = LocalWindows::new(ORIGIN);
        let mut opened = windows.on_open();
        let coordinator = coordinator(&server, &windows);
        let task = tokio::spawn({
            let coordinator = coordinator.clone();
            async move { coordinator.initiate(Provider::GitHub, Purpose::Authenticate).await }
        });

        let popup = next_popup(&mut opened).await;
        windows.opener_for("https://evil.example", None).post_message(
            json!({"type": "GITHUB_AUTH_SUCCESS", "code": "stolen", "state": "s"}),
            ORIGIN,
        );
        time::sleep(Duration::from_millis(50)).await;
        assert!(!task.is_finished());
        assert!(!popup.popup.is_closed());

        popup.popup.close();
        let err = task.await.unwrap().unwrap_err();
        assert!(matches!(err, OAuthError::Abandoned { .. }));
    }

    #[tokio::test]
    async fn test_settles_once_and_ignores_later_messages() {
        let server = MockServer::start().await;
        mount_authorize(&server, Provider::GitHub).await;
        Mock::given(method("POST"))
            .and(path("/auth/github/callback"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"user": {"id": null}}))
                    .set_delay(Duration::from_millis(50)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let windows = LocalWindows::new(ORIGIN);
        let mut opened = windows.on_open();
        let coordinator = coordinator(&server, &windows);
        let task = tokio::spawn({
            let coordinator = coordinator.clone();
            async move { coordinator.initiate(Provider::GitHub, Purpose::Authenticate).await }
        });

        let popup = next_popup(&mut opened).await;
        let opener = popup.popup.opener();
        opener.post_message(
            json!({"type": "GITHUB_AUTH_SUCCESS", "code": "first", "state": "s"}),
            ORIGIN,
        );
        opener.post_message(
            json!({"type": "GITHUB_AUTH_ERROR", "error": "late"}),
            ORIGIN,
        );
        opener.post_message(
            json!({"type": "GITHUB_AUTH_SUCCESS", "code": "second", "state": "s"}),
            ORIGIN,
        );

        let outcome = task.await.unwrap().unwrap();
        assert!(outcome.is_new_user);
        assert!(!outcome.is_linked_account);
        let late = WindowMessage {
            origin: ORIGIN.into(),
            source: None,
            data: json!({"type": "GITHUB_AUTH_SUCCESS", "code": "third", "state": "s"}),
        };
        assert_eq!(windows.bus().dispatch(late), 0);
    }

    #[tokio::test]
    async fn test_exchange_rejection_is_exchange_error() {
        let server = MockServer::start().await;
        mount_authorize(&server, Provider::GitHub).await;
        Mock::given(method("POST"))
            .and(path("/auth/github/callback"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "detail": "Invalid or expired state"
            })))
            .mount(&server)
            .await;

        let windows = LocalWindows::new(ORIGIN);
        let mut opened = windows.on_open();
        let coordinator = coordinator(&server, &windows);
        let task = tokio::spawn({
            let coordinator = coordinator.clone();
            async move { coordinator.initiate(Provider::GitHub, Purpose::Authenticate).await }
        });

        let popup = next_popup(&mut opened).await;
        popup.popup.opener().post_message(
            json!({"type": "GITHUB_AUTH_SUCCESS", "code": "c", "state": "s"}),
            ORIGIN,
        );

        let err = task.await.unwrap().unwrap_err();
        assert!(matches!(err, OAuthError::Exchange { .. }));
        assert_eq!(err.to_string(), "Invalid or expired state");
        assert!(popup.popup.is_closed());
    }

    #[tokio::test]
    async fn test_concurrent_providers_do_not_interfere() {
        let server = MockServer::start().await;
        mount_authorize(&server, Provider::GitHub).await;
        mount_authorize(&server, Provider::LinkedIn).await;
        Mock::given(method("POST"))
            .and(path("/auth/linkedin/callback"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"user": {"id": 7}})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let windows = LocalWindows::new(ORIGIN);
        let mut opened = windows.on_open();
        let coordinator = coordinator(&server, &windows);
        let github = tokio::spawn({
            let coordinator = coordinator.clone();
            async move { coordinator.initiate(Provider::GitHub, Purpose::Authenticate).await }
        });
        let linkedin = tokio::spawn({
            let coordinator = coordinator.clone();
            async move { coordinator.initiate(Provider::LinkedIn, Purpose::Authenticate).await }
        });

        let first = next_popup(&mut opened).await;
        let second = next_popup(&mut opened).await;
        let (github_popup, linkedin_popup) = if first.name == "github_auth" {
            (first, second)
        } else {
            (second, first)
        };
        assert_eq!(linkedin_popup.name, "linkedin_auth");

        github_popup.popup.close();
        let err = github.await.unwrap().unwrap_err();
        assert!(matches!(err, OAuthError::Abandoned { provider: Provider::GitHub }));
        assert!(!linkedin.is_finished());
        assert!(!linkedin_popup.popup.is_closed());

        linkedin_popup.popup.opener().post_message(
            json!({"type": "LINKEDIN_AUTH_SUCCESS", "code": "c", "state": "s"}),
            ORIGIN,
        );
        let outcome = linkedin.await.unwrap().unwrap();
        assert!(outcome.is_linked_account);
    }

    #[tokio::test]
    async fn test_dropping_the_handshake_closes_the_popup() {
        let server = MockServer::start().await;
        mount_authorize(&server, Provider::GitHub).await;

        let windows = LocalWindows::new(ORIGIN);
        let mut opened = windows.on_open();
        let coordinator = coordinator(&server, &windows);
        let task = tokio::spawn({
            let coordinator = coordinator.clone();
            async move { coordinator.initiate(Provider::GitHub, Purpose::Connect).await }
        });

        let popup = next_popup(&mut opened).await;
        task.abort();
        let _ = task.await;
        assert!(popup.popup.is_closed());
    }
}
