//! socket.io transport for the notification channel

use async_trait::async_trait;
use futures::channel::mpsc as fmpsc;
use futures::{FutureExt, StreamExt};
use medadmin_core::SocketConfig;
use rust_socketio::asynchronous::{Client, ClientBuilder};
use rust_socketio::{Event, Payload};
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use url::Url;

use crate::notifications::{
    NotificationError, NotificationTransport, SocketConnection, SocketFrame,
};

const OUTGOING_BUFFER: usize = 16;

/// Opens socket.io connections to the platform's notification server
///
/// Reconnection is left to [`NotificationHub`](crate::NotificationHub), so
/// the client library's own retry loop is disabled.
#[derive(Debug, Clone)]
pub struct SocketIoTransport {
    url: Url,
}

impl SocketIoTransport {
    pub const fn new(url: Url) -> Self {
        Self { url }
    }

    /// # Errors
    ///
    /// Returns [`NotificationError::InvalidUrl`] when `socket.url` does not parse.
    pub fn from_config(config: &SocketConfig) -> Result<Self, NotificationError> {
        let url = Url::parse(&config.url)
            .map_err(|e| NotificationError::InvalidUrl(format!("{}: {e}", config.url)))?;
        Ok(Self::new(url))
    }

    /// Handshake address identifying `user_id` to the server
    pub fn endpoint(&self, user_id: &str) -> Url {
        let mut url = self.url.clone();
        url.query_pairs_mut().append_pair("userId", user_id);
        url
    }
}

#[async_trait]
impl NotificationTransport for SocketIoTransport {
    async fn connect(&self, user_id: &str) -> Result<SocketConnection, NotificationError> {
        let endpoint = self.endpoint(user_id);
        let (incoming_tx, incoming_rx) = fmpsc::unbounded();
        let on_event = incoming_tx.clone();
        let on_close = incoming_tx;

        let client = ClientBuilder::new(endpoint.as_str())
            .reconnect(false)
            .on_any(move |event: Event, payload: Payload, _: Client| {
                let frame = SocketFrame::new(String::from(event), payload_data(payload));
                if on_event.unbounded_send(frame).is_err() {
                    debug!("socket event after connection was released");
                }
                async {}.boxed()
            })
            .on(Event::Close, move |_: Payload, _: Client| {
                on_close.close_channel();
                async {}.boxed()
            })
            .connect()
            .await
            .map_err(|e| NotificationError::Connect(e.to_string()))?;

        let (outgoing, outgoing_rx) = mpsc::channel(OUTGOING_BUFFER);
        tokio::spawn(forward(client, outgoing_rx));

        Ok(SocketConnection {
            outgoing,
            incoming: incoming_rx.boxed(),
        })
    }
}

/// Emit queued frames until the connection is released, then disconnect
async fn forward(client: Client, mut outgoing: mpsc::Receiver<SocketFrame>) {
    while let Some(frame) = outgoing.recv().await {
        debug!(event = %frame.event, "emitting socket event");
        if let Err(e) = client.emit(frame.event.as_str(), frame.data).await {
            warn!(event = %frame.event, error = %e, "socket emit failed");
        }
    }
    if let Err(e) = client.disconnect().await {
        debug!(error = %e, "socket disconnect failed");
    }
}

/// First argument of an event; the server sends one JSON value per event
fn payload_data(payload: Payload) -> Value {
    match payload {
        Payload::Text(values) => values.into_iter().next().unwrap_or(Value::Null),
        Payload::Binary(bytes) => serde_json::from_slice(&bytes).unwrap_or(Value::Null),
        _ => Value::Null,
    }
}
