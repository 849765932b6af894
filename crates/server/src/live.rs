// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Live notification streaming.
//!
//! Notifications written by bulk account actions are pushed to connected
//! WebSocket clients. Connecting requires a session, and each client only
//! receives the notifications addressed to its own account. Every
//! notification is also stored in the recipient's inbox, which stays the
//! source of truth. Clients never send commands over the socket.

use admissions_api::DeliveredNotification;
use admissions_domain::NotificationKind;
use axum::{
    extract::{
        State as AxumState, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::Response,
};
use futures::{SinkExt, stream::StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use time::format_description::well_known::Rfc3339;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use crate::session::SessionUser;

/// Maximum number of events to buffer in the broadcast channel.
/// Slow clients lose the oldest events.
const EVENT_BUFFER_SIZE: usize = 100;

/// Live event types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LiveEvent {
    /// A notification was delivered to a user's inbox.
    Notification {
        /// The stored notification identifier.
        notification_id: i64,
        /// The recipient.
        user_id: String,
        /// The notification title.
        title: String,
        /// The notification body.
        message: String,
        /// The notification severity.
        kind: NotificationKind,
    },
    /// Connection confirmation (sent on initial connect).
    Connected {
        /// Server timestamp (RFC 3339).
        timestamp: String,
    },
}

impl LiveEvent {
    /// Whether this event may be sent to the given user's socket.
    #[must_use]
    pub fn is_visible_to(&self, user_id: &str) -> bool {
        match self {
            Self::Notification {
                user_id: recipient,
                ..
            } => recipient == user_id,
            Self::Connected { .. } => true,
        }
    }
}

impl From<DeliveredNotification> for LiveEvent {
    fn from(notification: DeliveredNotification) -> Self {
        Self::Notification {
            notification_id: notification.notification_id,
            user_id: notification.user_id,
            title: notification.title,
            message: notification.message,
            kind: notification.kind,
        }
    }
}

/// Broadcaster for live events.
#[derive(Clone)]
pub struct LiveEventBroadcaster {
    tx: broadcast::Sender<LiveEvent>,
}

impl LiveEventBroadcaster {
    /// Creates a new event broadcaster.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(EVENT_BUFFER_SIZE);
        Self { tx }
    }

    /// Broadcasts an event to all connected clients.
    ///
    /// If no clients are connected, the event is dropped.
    pub fn broadcast(&self, event: &LiveEvent) {
        match self.tx.send(event.clone()) {
            Ok(count) => {
                debug!(?event, receivers = count, "Broadcast live event");
            }
            Err(_) => {
                debug!(?event, "No receivers for live event");
            }
        }
    }

    /// Broadcasts every notification written by one request.
    pub fn broadcast_notifications(&self, notifications: Vec<DeliveredNotification>) {
        for notification in notifications {
            self.broadcast(&LiveEvent::from(notification));
        }
    }

    /// Subscribes to the event stream.
    ///
    /// Events sent before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<LiveEvent> {
        self.tx.subscribe()
    }
}

impl Default for LiveEventBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

/// Handles WebSocket upgrade requests for live event streaming.
///
/// The session is validated before the upgrade, so anonymous clients get a
/// 401 instead of a socket.
pub async fn live_events_handler(
    SessionUser(actor, _, _): SessionUser,
    AxumState(broadcaster): AxumState<Arc<LiveEventBroadcaster>>,
    ws: WebSocketUpgrade,
) -> Response {
    let user_id: String = actor.user_id.as_str().to_string();
    ws.on_upgrade(move |socket| handle_socket(socket, broadcaster, user_id))
}

/// Sends a connection confirmation, then streams the user's live events
/// until the client disconnects.
async fn handle_socket(
    socket: WebSocket,
    broadcaster: Arc<LiveEventBroadcaster>,
    user_id: String,
) {
    info!(user_id = %user_id, "Client connected to live event stream");

    let (mut sender, mut receiver) = socket.split();
    let mut rx: broadcast::Receiver<LiveEvent> = broadcaster.subscribe();

    let connected_event = LiveEvent::Connected {
        timestamp: time::OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .unwrap_or_else(|_| String::from("unknown")),
    };

    if let Ok(json) = serde_json::to_string(&connected_event)
        && sender.send(Message::Text(json.into())).await.is_err()
    {
        warn!("Failed to send connection confirmation");
        return;
    }

    let mut send_task = tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) if !event.is_visible_to(&user_id) => {}
                Ok(event) => match serde_json::to_string(&event) {
                    Ok(json) => {
                        if sender.send(Message::Text(json.into())).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        error!(?e, "Failed to serialize live event");
                    }
                },
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Live event client lagged behind");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Text(_) | Message::Binary(_)) => {
                    warn!("Received unexpected message from client, ignoring");
                }
                Ok(Message::Close(_)) => {
                    debug!("Client sent close frame");
                    break;
                }
                Ok(Message::Ping(_) | Message::Pong(_)) => {}
                Err(e) => {
                    error!(?e, "WebSocket receive error");
                    break;
                }
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => {
            debug!("Send task completed");
            recv_task.abort();
        }
        _ = &mut recv_task => {
            debug!("Receive task completed");
            send_task.abort();
        }
    }

    info!("Client disconnected from live event stream");
}
