//! Application context shared by every dashboard page
//!
//! Built once at startup and passed down; it owns the single API client
//! and therefore the single token store.

use medadmin_core::DashboardConfig;
use medadmin_http::{ApiClient, ClientError, Navigator};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::info;

use crate::notifications::{
    NotificationError, NotificationHub, NotificationTransport, ReconnectPolicy,
};
use crate::route_guard::RouteGuard;
use crate::socket_io::SocketIoTransport;

/// Dependencies of the dashboard
#[derive(Debug, Clone)]
pub struct AppContext {
    config: Arc<DashboardConfig>,
    client: ApiClient,
    guard: Arc<RouteGuard>,
}

impl AppContext {
    /// # Errors
    ///
    /// Returns [`ClientError::Configuration`] for an unusable API address.
    pub fn from_config(config: DashboardConfig) -> Result<Self, ClientError> {
        let client = ApiClient::from_config(&config.api, &config.session)?;
        Ok(Self::with_client(config, client))
    }

    /// Like [`from_config`](Self::from_config), sending forced logouts to `navigator`
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Configuration`] for an unusable API address.
    pub fn with_navigator(
        config: DashboardConfig,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, ClientError> {
        let client = ApiClient::builder()
            .base_url(&config.api.base_url)
            .timeout(config.api.timeout())
            .user_agent(&config.api.user_agent)
            .session_config(config.session.clone())
            .navigator(navigator)
            .build()?;
        Ok(Self::with_client(config, client))
    }

    pub fn with_client(config: DashboardConfig, client: ApiClient) -> Self {
        let guard = Arc::new(RouteGuard::from_config(&config.session));
        info!(base_url = %client.base_url(), "dashboard context ready");
        Self {
            config: Arc::new(config),
            client,
            guard,
        }
    }

    /// Install the global log subscriber described by `logging`
    ///
    /// # Errors
    ///
    /// Fails when a subscriber is already installed.
    pub fn init_tracing(&self) -> anyhow::Result<()> {
        medadmin_core::tracing::init_tracing(&self.config.logging)
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub const fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn guard(&self) -> &RouteGuard {
        &self.guard
    }

    /// Periodic session check, renewing the token before it expires
    pub fn start_session_watch(&self, period: Duration) -> JoinHandle<()> {
        self.client.refresh_coordinator().spawn_watch(period)
    }

    /// Open the notification channel for the signed-in admin
    ///
    /// Returns `None` without a session.
    pub fn connect_notifications(
        &self,
        transport: Arc<dyn NotificationTransport>,
    ) -> Option<NotificationHub> {
        let token = self.client.store().get()?;
        Some(NotificationHub::start(
            transport,
            token.user_id.clone(),
            ReconnectPolicy::from_config(&self.config.socket),
        ))
    }

    /// Open the notification channel against the configured socket.io server
    ///
    /// Returns `Ok(None)` without a session.
    ///
    /// # Errors
    ///
    /// Returns [`NotificationError::InvalidUrl`] for an unusable `socket.url`.
    pub fn connect_socket_notifications(
        &self,
    ) -> Result<Option<NotificationHub>, NotificationError> {
        let transport = SocketIoTransport::from_config(&self.config.socket)?;
        Ok(self.connect_notifications(Arc::new(transport)))
    }
}
