//! Real-time notification channel
//!
//! A [`NotificationHub`] keeps one socket connection per signed-in admin
//! alive. On every (re)connect it joins the admin's notification room and
//! the global alert room, then turns incoming frames into typed
//! [`ChannelEvent`]s that any number of [`Subscription`]s can consume.
//! The socket itself sits behind [`NotificationTransport`].

use async_trait::async_trait;
use futures::StreamExt;
use futures::stream::BoxStream;
use medadmin_core::SocketConfig;
use medadmin_core::types::Notification;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, info, warn};

/// Event announcing a new notification for the joined user
pub const NOTIFICATION_NEW: &str = "notification_new";
const JOIN_NOTIFICATIONS: &str = "joinNotifications";
const JOIN_ALERTS: &str = "joinAlerts";

const EVENT_BUFFER: usize = 64;

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("Invalid socket address: {0}")]
    InvalidUrl(String),

    #[error("Channel closed")]
    Closed,
}

/// One named event on the socket, in either direction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocketFrame {
    pub event: String,
    #[serde(default)]
    pub data: Value,
}

impl SocketFrame {
    pub fn new(event: impl Into<String>, data: Value) -> Self {
        Self {
            event: event.into(),
            data,
        }
    }

    pub fn join_notifications(user_id: &str) -> Self {
        Self::new(JOIN_NOTIFICATIONS, Value::String(user_id.to_string()))
    }

    pub fn join_alerts() -> Self {
        Self::new(JOIN_ALERTS, Value::Null)
    }
}

/// An open socket: frames to send and frames received
pub struct SocketConnection {
    pub outgoing: mpsc::Sender<SocketFrame>,
    pub incoming: BoxStream<'static, SocketFrame>,
}

impl std::fmt::Debug for SocketConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SocketConnection").finish_non_exhaustive()
    }
}

/// Opens socket connections for a user
#[async_trait]
pub trait NotificationTransport: Send + Sync {
    async fn connect(&self, user_id: &str) -> Result<SocketConnection, NotificationError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Connected,
    /// Lost; a reconnect is pending
    Disconnected,
    /// Gave up or shut down
    Closed,
}

/// Typed event delivered to subscribers
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    Connected,
    Notification(Box<Notification>),
    Disconnected,
    Closed,
}

impl ChannelEvent {
    /// Whether cached notification lists are stale after this event
    pub const fn invalidates_notifications(&self) -> bool {
        matches!(self, Self::Notification(_) | Self::Connected)
    }
}

/// Reconnection schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub delay: Duration,
    pub max_delay: Duration,
    pub attempts: u32,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::from_config(&SocketConfig::default())
    }
}

impl ReconnectPolicy {
    pub const fn from_config(config: &SocketConfig) -> Self {
        Self {
            delay: config.reconnect_delay(),
            max_delay: config.reconnect_delay_max(),
            attempts: config.reconnect_attempts,
        }
    }

    /// Delay before reconnection attempt `attempt` (1-based), doubling up to the cap
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.delay.saturating_mul(factor).min(self.max_delay)
    }
}

/// Receives hub events until dropped
#[derive(Debug)]
pub struct Subscription {
    rx: broadcast::Receiver<ChannelEvent>,
}

impl Subscription {
    /// Next event, or `None` once the hub is gone
    pub async fn recv(&mut self) -> Option<ChannelEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "notification subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

/// Supervised notification socket for one user
#[derive(Debug)]
pub struct NotificationHub {
    events: broadcast::Sender<ChannelEvent>,
    state_rx: watch::Receiver<ConnectionState>,
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl NotificationHub {
    /// Connect for `user_id` and keep the connection alive in the background
    pub fn start(
        transport: Arc<dyn NotificationTransport>,
        user_id: impl Into<String>,
        policy: ReconnectPolicy,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        let (state_tx, state_rx) = watch::channel(ConnectionState::Connecting);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let user_id = user_id.into();
        let span = tracing::info_span!("notifications", user_id = %user_id);
        let supervisor = Supervisor {
            transport,
            user_id,
            policy,
            events: events.clone(),
            state_tx,
            shutdown_rx,
        };
        let task = tokio::spawn(supervisor.run().instrument(span));

        Self {
            events,
            state_rx,
            shutdown_tx,
            task,
        }
    }

    pub fn subscribe(&self) -> Subscription {
        Subscription {
            rx: self.events.subscribe(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.events.receiver_count()
    }

    pub fn state(&self) -> ConnectionState {
        *self.state_rx.borrow()
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Watch connection state changes
    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.state_rx.clone()
    }

    /// Stop the connection; subscribers receive [`ChannelEvent::Closed`]
    pub fn shutdown(&self) {
        self.shutdown_tx.send_replace(true);
    }
}

impl Drop for NotificationHub {
    fn drop(&mut self) {
        self.task.abort();
    }
}

struct Supervisor {
    transport: Arc<dyn NotificationTransport>,
    user_id: String,
    policy: ReconnectPolicy,
    events: broadcast::Sender<ChannelEvent>,
    state_tx: watch::Sender<ConnectionState>,
    shutdown_rx: watch::Receiver<bool>,
}

enum SessionEnd {
    Lost,
    Shutdown,
}

impl Supervisor {
    async fn run(mut self) {
        let mut attempt = 0u32;

        loop {
            if attempt > 0 {
                if attempt > self.policy.attempts {
                    warn!(attempts = self.policy.attempts, "giving up on notification socket");
                    break;
                }
                let delay = self.policy.backoff(attempt);
                debug!(attempt, ?delay, "reconnecting notification socket");
                if self.wait_or_shutdown(delay).await {
                    break;
                }
            }

            self.state_tx.send_replace(ConnectionState::Connecting);
            let connected = tokio::select! {
                biased;
                _ = self.shutdown_rx.wait_for(|stop| *stop) => break,
                result = self.transport.connect(&self.user_id) => result,
            };

            match connected {
                Ok(connection) => {
                    attempt = 0;
                    if matches!(self.serve(connection).await, SessionEnd::Shutdown) {
                        break;
                    }
                }
                Err(e) => warn!(error = %e, "notification socket connection failed"),
            }
            attempt += 1;
        }

        self.state_tx.send_replace(ConnectionState::Closed);
        self.emit(ChannelEvent::Closed);
        info!("notification channel closed");
    }

    async fn serve(&mut self, mut connection: SocketConnection) -> SessionEnd {
        let joined = async {
            connection
                .outgoing
                .send(SocketFrame::join_notifications(&self.user_id))
                .await?;
            connection.outgoing.send(SocketFrame::join_alerts()).await
        }
        .await;
        if joined.is_err() {
            warn!("notification socket closed before joining rooms");
            return SessionEnd::Lost;
        }

        info!("notification socket connected");
        self.state_tx.send_replace(ConnectionState::Connected);
        self.emit(ChannelEvent::Connected);

        let end = loop {
            let frame = tokio::select! {
                biased;
                _ = self.shutdown_rx.wait_for(|stop| *stop) => break SessionEnd::Shutdown,
                frame = connection.incoming.next() => frame,
            };
            match frame {
                Some(frame) => self.dispatch(frame),
                None => break SessionEnd::Lost,
            }
        };

        if matches!(end, SessionEnd::Lost) {
            info!("notification socket disconnected");
            self.state_tx.send_replace(ConnectionState::Disconnected);
            self.emit(ChannelEvent::Disconnected);
        }
        end
    }

    fn dispatch(&self, frame: SocketFrame) {
        if frame.event != NOTIFICATION_NEW {
            debug!(event = %frame.event, "ignoring socket event");
            return;
        }
        match serde_json::from_value::<Notification>(frame.data) {
            Ok(notification) => self.emit(ChannelEvent::Notification(Box::new(notification))),
            Err(e) => warn!(error = %e, "malformed notification payload"),
        }
    }

    /// Sleep for `delay`; true when shutdown was requested meanwhile
    async fn wait_or_shutdown(&mut self, delay: Duration) -> bool {
        tokio::select! {
            biased;
            _ = self.shutdown_rx.wait_for(|stop| *stop) => true,
            () = tokio::time::sleep(delay) => false,
        }
    }

    fn emit(&self, event: ChannelEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::channel::mpsc as fmpsc;
    use mockall::mock;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    mock! {
        Transport {}

        #[async_trait]
        impl NotificationTransport for Transport {
            async fn connect(&self, user_id: &str) -> Result<SocketConnection, NotificationError>;
        }
    }

    /// Server side of one scripted connection
    struct ServerEnd {
        sent: mpsc::Receiver<SocketFrame>,
        push: fmpsc::UnboundedSender<SocketFrame>,
    }

    fn connection() -> (SocketConnection, ServerEnd) {
        let (out_tx, out_rx) = mpsc::channel(8);
        let (in_tx, in_rx) = fmpsc::unbounded();
        (
            SocketConnection {
                outgoing: out_tx,
                incoming: in_rx.boxed(),
            },
            ServerEnd {
                sent: out_rx,
                push: in_tx,
            },
        )
    }

    /// Hands out queued connection results in order
    struct ScriptedTransport {
        script: Mutex<VecDeque<Result<SocketConnection, NotificationError>>>,
    }

    impl ScriptedTransport {
        fn new(script: Vec<Result<SocketConnection, NotificationError>>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into()),
            })
        }
    }

    #[async_trait]
    impl NotificationTransport for ScriptedTransport {
        async fn connect(&self, _user_id: &str) -> Result<SocketConnection, NotificationError> {
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(NotificationError::Connect("refused".into())))
        }
    }

    fn notification_frame(id: &str) -> SocketFrame {
        SocketFrame::new(
            NOTIFICATION_NEW,
            json!({"_id": id, "title": "New appointment booked", "isRead": false, "type": "appointment"}),
        )
    }

    #[test]
    fn test_backoff_doubles_up_to_cap() {
        let policy = ReconnectPolicy::default();
        let delays: Vec<_> = (1..=5).map(|n| policy.backoff(n).as_millis()).collect();
        assert_eq!(delays, vec![1_000, 2_000, 4_000, 5_000, 5_000]);
    }

    #[tokio::test]
    async fn test_joins_rooms_and_delivers_notifications() {
        let (conn, mut server) = connection();
        let hub = NotificationHub::start(
            ScriptedTransport::new(vec![Ok(conn)]),
            "admin-1",
            ReconnectPolicy::default(),
        );
        let mut events = hub.subscribe();

        assert_eq!(
            server.sent.recv().await,
            Some(SocketFrame::join_notifications("admin-1"))
        );
        assert_eq!(server.sent.recv().await, Some(SocketFrame::join_alerts()));
        assert_eq!(events.recv().await, Some(ChannelEvent::Connected));
        assert!(hub.is_connected());

        server
            .push
            .unbounded_send(SocketFrame::new("typing", json!({})))
            .unwrap();
        server.push.unbounded_send(notification_frame("n1")).unwrap();

        match events.recv().await {
            Some(ChannelEvent::Notification(notification)) => {
                assert_eq!(notification.id, "n1");
                assert!(!notification.is_read);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_reconnects_after_disconnect() {
        let (first, first_server) = connection();
        let (second, mut second_server) = connection();
        let hub = NotificationHub::start(
            ScriptedTransport::new(vec![
                Ok(first),
                Err(NotificationError::Connect("down".into())),
                Ok(second),
            ]),
            "admin-1",
            ReconnectPolicy::default(),
        );
        let mut events = hub.subscribe();

        assert_eq!(events.recv().await, Some(ChannelEvent::Connected));
        drop(first_server);
        assert_eq!(events.recv().await, Some(ChannelEvent::Disconnected));
        assert_eq!(events.recv().await, Some(ChannelEvent::Connected));

        assert_eq!(
            second_server.sent.recv().await,
            Some(SocketFrame::join_notifications("admin-1"))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_configured_attempts() {
        let mut transport = MockTransport::new();
        transport
            .expect_connect()
            .times(6)
            .returning(|_| Err(NotificationError::Connect("refused".into())));

        let hub = NotificationHub::start(
            Arc::new(transport),
            "admin-1",
            ReconnectPolicy::default(),
        );
        let mut events = hub.subscribe();

        assert_eq!(events.recv().await, Some(ChannelEvent::Closed));
        assert_eq!(hub.state(), ConnectionState::Closed);
    }

    #[tokio::test]
    async fn test_shutdown_closes_channel() {
        let (conn, _server) = connection();
        let hub = NotificationHub::start(
            ScriptedTransport::new(vec![Ok(conn)]),
            "admin-1",
            ReconnectPolicy::default(),
        );
        let mut events = hub.subscribe();
        assert_eq!(events.recv().await, Some(ChannelEvent::Connected));

        hub.shutdown();
        assert_eq!(events.recv().await, Some(ChannelEvent::Closed));

        let mut state = hub.watch_state();
        state
            .wait_for(|s| *s == ConnectionState::Closed)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_dropping_subscription_unsubscribes() {
        let (conn, _server) = connection();
        let hub = NotificationHub::start(
            ScriptedTransport::new(vec![Ok(conn)]),
            "admin-1",
            ReconnectPolicy::default(),
        );

        let first = hub.subscribe();
        let second = hub.subscribe();
        assert_eq!(hub.subscriber_count(), 2);

        drop(first);
        assert_eq!(hub.subscriber_count(), 1);
        drop(second);
        assert_eq!(hub.subscriber_count(), 0);
    }
}
