//! Access token renewal
//!
//! [`RefreshCoordinator`] decides when the session token has to be renewed
//! and makes sure only one refresh call is in flight at a time. Callers that
//! detect an expiring or rejected token while a refresh is running wait for
//! that refresh and share its outcome.

use async_trait::async_trait;
use chrono::Duration;
use futures::future::{BoxFuture, FutureExt, Shared};
use medadmin_core::{Clock, SessionError, SessionState, SessionToken};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

use super::ClientError;
use super::request::ApiRequest;
use super::store::TokenStore;

/// Path of the refresh endpoint
pub const REFRESH_PATH: &str = "/auth/reset-refresh-token";

/// Tokens returned by the refresh endpoint
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshedTokens {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

impl std::fmt::Debug for RefreshedTokens {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshedTokens")
            .field("rotated", &self.refresh_token.is_some())
            .finish_non_exhaustive()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshBody<'a> {
    refresh_token: &'a str,
}

/// Exchanges a refresh token for a new access token
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    async fn refresh(&self, refresh_token: &str) -> Result<RefreshedTokens, ClientError>;
}

/// Refresher backed by the platform's refresh endpoint
#[derive(Clone)]
pub struct HttpTokenRefresher {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTokenRefresher {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl TokenRefresher for HttpTokenRefresher {
    async fn refresh(&self, refresh_token: &str) -> Result<RefreshedTokens, ClientError> {
        let request = ApiRequest::post(REFRESH_PATH)
            .json(&RefreshBody { refresh_token })?
            .build(&self.client, &self.base_url, None)?;

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::from_status(status, body));
        }

        let envelope: medadmin_core::types::Envelope<RefreshedTokens> = response.json().await?;
        Ok(envelope.data)
    }
}

/// Why a refresh produced no usable token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshFailure {
    /// There is no session to refresh
    NoSession,
    /// The session was marked unusable
    Expired(SessionError),
}

impl From<RefreshFailure> for ClientError {
    fn from(failure: RefreshFailure) -> Self {
        match failure {
            RefreshFailure::NoSession => Self::NotAuthenticated,
            RefreshFailure::Expired(marker) => Self::SessionExpired(marker),
        }
    }
}

type RefreshOutcome = Result<Arc<SessionToken>, RefreshFailure>;
type PendingRefresh = Shared<BoxFuture<'static, RefreshOutcome>>;

struct Inner {
    store: Arc<dyn TokenStore>,
    refresher: Arc<dyn TokenRefresher>,
    clock: Arc<dyn Clock>,
    window: Duration,
    max_age: Duration,
    timeout: std::time::Duration,
    pending: Mutex<Option<PendingRefresh>>,
}

impl Inner {
    fn pending(&self) -> MutexGuard<'_, Option<PendingRefresh>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Single-flight token renewal over a [`TokenStore`]
#[derive(Clone)]
pub struct RefreshCoordinator {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for RefreshCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshCoordinator")
            .field("window", &self.inner.window)
            .field("max_age", &self.inner.max_age)
            .field("timeout", &self.inner.timeout)
            .finish_non_exhaustive()
    }
}

impl RefreshCoordinator {
    pub fn new(
        store: Arc<dyn TokenStore>,
        refresher: Arc<dyn TokenRefresher>,
        clock: Arc<dyn Clock>,
        window: Duration,
        max_age: Duration,
        timeout: std::time::Duration,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                refresher,
                clock,
                window,
                max_age,
                timeout,
                pending: Mutex::new(None),
            }),
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> SessionState {
        if self.inner.pending().is_some() {
            return SessionState::Refreshing;
        }
        self.inner
            .store
            .get()
            .map_or(SessionState::Invalid, |token| {
                token.state(self.inner.clock.now(), self.inner.window)
            })
    }

    /// Whether a refresh call is in flight
    pub fn is_refreshing(&self) -> bool {
        self.inner.pending().is_some()
    }

    /// Access token for an outgoing request, renewing it first when due
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotAuthenticated`] without a session and
    /// [`ClientError::SessionExpired`] when the session is marked unusable
    /// or the renewal fails.
    pub async fn authorize(&self) -> Result<String, ClientError> {
        let token = self.inner.store.get().ok_or(ClientError::NotAuthenticated)?;
        if let Some(marker) = token.error {
            return Err(ClientError::SessionExpired(marker));
        }

        let now = self.inner.clock.now();
        match token.usable_access_token() {
            Some(access) if !token.is_due(now, self.inner.window) => {
                return Ok(access.to_string());
            }
            _ => {}
        }

        debug!(expires_at = %token.expires_at, "access token inside refresh window");
        let renewed = self.join_or_start(self.outside_window()).await?;
        access_of(&renewed)
    }

    /// Replacement for an access token the server rejected with 401
    ///
    /// When another caller already renewed the token, the newer token is
    /// returned without a second refresh.
    ///
    /// # Errors
    ///
    /// Returns an error when no replacement token can be obtained.
    pub async fn recover(&self, rejected_access: &str) -> Result<String, ClientError> {
        let rejected = rejected_access.to_string();
        let renewed = self
            .join_or_start(move |current| {
                current
                    .usable_access_token()
                    .is_some_and(|access| access != rejected)
            })
            .await?;
        access_of(&renewed)
    }

    /// Scheduled session check; renews the token when it is due
    ///
    /// Failures are recorded on the session and observed by the next
    /// protected request.
    pub async fn check(&self) -> SessionState {
        if self.state() == SessionState::Expiring {
            let result = self.join_or_start(self.outside_window()).await;
            if let Err(failure) = result {
                debug!(?failure, "scheduled refresh did not renew the session");
            }
        }
        self.state()
    }

    /// Run [`check`](Self::check) every `period` until the handle is aborted
    pub fn spawn_watch(&self, period: std::time::Duration) -> tokio::task::JoinHandle<()> {
        let coordinator = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                coordinator.check().await;
            }
        })
    }

    /// Predicate: the stored token is usable and not yet due
    fn outside_window(&self) -> impl Fn(&SessionToken) -> bool + '_ {
        move |current| {
            current.usable_access_token().is_some()
                && !current.is_due(self.inner.clock.now(), self.inner.window)
        }
    }

    /// Join the in-flight refresh or start one
    ///
    /// `settled` is evaluated against the stored token under the lock; when
    /// it holds, the stored token is returned without a refresh. This keeps
    /// late arrivals from refreshing a token that was just renewed.
    async fn join_or_start<F>(&self, settled: F) -> RefreshOutcome
    where
        F: Fn(&SessionToken) -> bool,
    {
        let pending = {
            let mut slot = self.inner.pending();
            if let Some(pending) = slot.as_ref() {
                debug!("joining in-flight token refresh");
                pending.clone()
            } else {
                let current = self.inner.store.get().ok_or(RefreshFailure::NoSession)?;
                if settled(current.as_ref()) {
                    return Ok(current);
                }
                if let Some(marker) = current.error {
                    return Err(RefreshFailure::Expired(marker));
                }

                let inner = Arc::clone(&self.inner);
                let refresh = async move {
                    let outcome = run_refresh(&inner).await;
                    inner.pending().take();
                    outcome
                }
                .boxed()
                .shared();
                *slot = Some(refresh.clone());
                refresh
            }
        };

        pending.await
    }
}

async fn run_refresh(inner: &Inner) -> RefreshOutcome {
    let current = inner.store.get().ok_or(RefreshFailure::NoSession)?;

    let Some(refresh_token) = current.refresh_token.as_deref() else {
        warn!(user_id = %current.user_id, "refresh due but no refresh token");
        return invalidate(inner, &current, SessionError::RefreshTokenMissing);
    };

    info!(user_id = %current.user_id, "refreshing access token");
    let result = tokio::time::timeout(inner.timeout, inner.refresher.refresh(refresh_token)).await;

    let tokens = match result {
        Ok(Ok(tokens)) => tokens,
        Ok(Err(err)) => {
            warn!(error = %err, "token refresh rejected");
            return invalidate(inner, &current, SessionError::RefreshAccessTokenError);
        }
        Err(_) => {
            warn!(timeout = ?inner.timeout, "token refresh timed out");
            return invalidate(inner, &current, SessionError::RefreshAccessTokenError);
        }
    };

    let renewed = current.refreshed(
        tokens.access_token,
        tokens.refresh_token,
        inner.clock.now(),
        inner.max_age,
    );
    if !inner.store.compare_and_set(&current, renewed.clone()) {
        return superseded(inner);
    }
    let renewed = Arc::new(renewed);
    info!(expires_at = %renewed.expires_at, "access token refreshed");
    Ok(renewed)
}

/// Mark `current` unusable, unless a login or logout already replaced it
fn invalidate(
    inner: &Inner,
    current: &Arc<SessionToken>,
    marker: SessionError,
) -> RefreshOutcome {
    if inner.store.compare_and_set(current, current.invalidated(marker)) {
        Err(RefreshFailure::Expired(marker))
    } else {
        superseded(inner)
    }
}

/// Outcome for a refresh whose session was replaced while it ran
fn superseded(inner: &Inner) -> RefreshOutcome {
    let latest = inner.store.get().ok_or(RefreshFailure::NoSession)?;
    debug!(user_id = %latest.user_id, "session changed during refresh");
    match latest.error {
        Some(marker) => Err(RefreshFailure::Expired(marker)),
        None => Ok(latest),
    }
}

fn access_of(token: &SessionToken) -> Result<String, ClientError> {
    token
        .usable_access_token()
        .map(ToString::to_string)
        .ok_or(ClientError::NotAuthenticated)
}
