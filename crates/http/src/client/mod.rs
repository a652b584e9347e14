//! medadmin HTTP client

pub mod appointments;
pub mod auth;
pub mod categories;
pub mod dashboard;
pub mod doctors;
pub mod earnings;
pub mod error;
pub mod navigator;
pub mod notifications;
pub mod patients;
pub mod referral;
pub mod refresh;
pub mod request;
pub mod settings;
pub mod store;

use error::ClientError;
use medadmin_core::types::Envelope;
use medadmin_core::{ApiConfig, Clock, SessionConfig, SessionState, SystemClock};
use navigator::{LogNavigator, Navigator};
use refresh::{HttpTokenRefresher, RefreshCoordinator, TokenRefresher};
use request::ApiRequest;
use reqwest::{Client, ClientBuilder};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use store::{MemoryTokenStore, TokenStore};
use tracing::{debug, warn};

struct ClientInner {
    http: Client,
    base_url: String,
    session: SessionConfig,
    store: Arc<dyn TokenStore>,
    clock: Arc<dyn Clock>,
    navigator: Arc<dyn Navigator>,
    refresh: RefreshCoordinator,
}

/// Session-aware API client
///
/// One instance is built per process and shared by cloning; clones use the
/// same connection pool, token store and refresh coordinator.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ClientInner>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url)
            .field("state", &self.inner.refresh.state())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a new client with default configuration
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        Self::builder().base_url(base_url).build()
    }

    /// Create a client from loaded configuration
    pub fn from_config(api: &ApiConfig, session: &SessionConfig) -> Result<Self, ClientError> {
        Self::builder()
            .base_url(api.base_url.clone())
            .timeout(api.timeout())
            .user_agent(api.user_agent.clone())
            .session_config(session.clone())
            .build()
    }

    /// Create a new client builder
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::default()
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    pub fn session_config(&self) -> &SessionConfig {
        &self.inner.session
    }

    pub fn store(&self) -> &Arc<dyn TokenStore> {
        &self.inner.store
    }

    pub fn refresh_coordinator(&self) -> &RefreshCoordinator {
        &self.inner.refresh
    }

    pub(crate) fn clock(&self) -> &dyn Clock {
        self.inner.clock.as_ref()
    }

    /// Lifecycle state of the current session
    pub fn session_state(&self) -> SessionState {
        self.inner.refresh.state()
    }

    /// Send a protected request
    ///
    /// The access token is renewed first when it is due. A 401 answer
    /// triggers one refresh and one replay; the replay's result is returned
    /// as is. When no token can be obtained the session is cleared and the
    /// user is sent to the login page.
    ///
    /// # Errors
    ///
    /// Returns transport, status and session errors; nothing is retried
    /// apart from the single replay after a 401.
    pub async fn send<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ClientError> {
        let access = match self.inner.refresh.authorize().await {
            Ok(access) => access,
            Err(err) => {
                self.end_session(&err);
                return Err(err);
            }
        };

        match self.execute(&request, Some(&access)).await {
            Err(ClientError::AuthenticationFailed(message)) => {
                debug!(path = request.path(), "request rejected with 401, refreshing");
                match self.inner.refresh.recover(&access).await {
                    Ok(renewed) => self.execute(&request, Some(&renewed)).await,
                    Err(err) => {
                        self.end_session(&err);
                        Err(ClientError::AuthenticationFailed(message))
                    }
                }
            }
            other => other,
        }
    }

    /// Send a protected request and unwrap the `data` of its envelope
    ///
    /// # Errors
    ///
    /// See [`send`](Self::send).
    pub async fn send_data<T: DeserializeOwned>(
        &self,
        request: ApiRequest,
    ) -> Result<T, ClientError> {
        Ok(self.send::<Envelope<T>>(request).await?.data)
    }

    /// Send a request without credentials and without refresh handling
    ///
    /// # Errors
    ///
    /// Returns transport and status errors.
    pub async fn send_public<T: DeserializeOwned>(
        &self,
        request: ApiRequest,
    ) -> Result<T, ClientError> {
        self.execute(&request, None).await
    }

    /// Execute one attempt and handle common errors
    async fn execute<T: DeserializeOwned>(
        &self,
        request: &ApiRequest,
        bearer: Option<&str>,
    ) -> Result<T, ClientError> {
        debug!(method = %request.method(), path = request.path(), "dispatching request");
        let response = request
            .build(&self.inner.http, &self.inner.base_url, bearer)?
            .send()
            .await?;
        let status = response.status();

        if status.is_success() {
            let body = response.bytes().await?;
            // Some mutations answer with an empty body.
            let body: &[u8] = if body.is_empty() { b"{}" } else { &body };
            Ok(serde_json::from_slice(body)?)
        } else {
            let message = response.text().await.unwrap_or_else(|_| status.to_string());
            Err(ClientError::from_status(status, message))
        }
    }

    /// Drop the session and send the user to the login page
    fn end_session(&self, reason: &ClientError) {
        warn!(reason = %reason, "session ended, redirecting to login");
        self.inner.store.clear();
        self.inner.navigator.navigate(&self.inner.session.login_path);
    }
}

/// Builder for [`ApiClient`]
#[derive(Default)]
pub struct ApiClientBuilder {
    base_url: Option<String>,
    timeout: Option<Duration>,
    user_agent: Option<String>,
    session: Option<SessionConfig>,
    store: Option<Arc<dyn TokenStore>>,
    clock: Option<Arc<dyn Clock>>,
    navigator: Option<Arc<dyn Navigator>>,
    refresher: Option<Arc<dyn TokenRefresher>>,
}

impl ApiClientBuilder {
    /// Set the base URL
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the request timeout
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the user agent
    #[must_use]
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Session lifetime, refresh window and login path
    #[must_use]
    pub fn session_config(mut self, session: SessionConfig) -> Self {
        self.session = Some(session);
        self
    }

    /// Use an existing token store
    #[must_use]
    pub fn store(mut self, store: Arc<dyn TokenStore>) -> Self {
        self.store = Some(store);
        self
    }

    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Where to send the user when the session ends
    #[must_use]
    pub fn navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    /// Replace the refresh endpoint client
    #[must_use]
    pub fn refresher(mut self, refresher: Arc<dyn TokenRefresher>) -> Self {
        self.refresher = Some(refresher);
        self
    }

    /// Build the client
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Configuration`] for a missing or invalid base URL.
    pub fn build(self) -> Result<ApiClient, ClientError> {
        let base_url = self
            .base_url
            .ok_or_else(|| ClientError::Configuration("base_url is required".into()))?;

        url::Url::parse(&base_url)
            .map_err(|err| ClientError::Configuration(format!("invalid base_url: {err}")))?;

        // Ensure base_url ends without a trailing slash
        let base_url = base_url.trim_end_matches('/').to_string();

        let mut client_builder = ClientBuilder::new();

        if let Some(timeout) = self.timeout {
            client_builder = client_builder.timeout(timeout);
        }

        client_builder = client_builder.user_agent(
            self.user_agent
                .unwrap_or_else(|| concat!("medadmin/", env!("CARGO_PKG_VERSION")).to_string()),
        );

        let http = client_builder.build()?;

        let session = self.session.unwrap_or_default();
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(MemoryTokenStore::new()));
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let navigator = self.navigator.unwrap_or_else(|| Arc::new(LogNavigator));
        let refresher = self
            .refresher
            .unwrap_or_else(|| Arc::new(HttpTokenRefresher::new(http.clone(), base_url.clone())));

        let refresh = RefreshCoordinator::new(
            Arc::clone(&store),
            refresher,
            Arc::clone(&clock),
            session.refresh_window(),
            session.max_age(),
            session.refresh_timeout(),
        );

        Ok(ApiClient {
            inner: Arc::new(ClientInner {
                http,
                base_url,
                session,
                store,
                clock,
                navigator,
                refresh,
            }),
        })
    }
}

/// Reject blank required input before anything is sent
pub(crate) fn require(value: &str, field: &str) -> Result<(), ClientError> {
    if value.trim().is_empty() {
        Err(ClientError::Validation(format!("{field} is required")))
    } else {
        Ok(())
    }
}
