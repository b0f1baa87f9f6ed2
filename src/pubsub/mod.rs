//! PubSub Ingress (spec §4.7): external key/value pub/sub consumer that
//! injects outbound messages. Channel pattern `fokabot:*`; each channel
//! name selects a pre-registered handler, frame bodies are JSON-validated
//! per-handler.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::AppError;
use crate::transport::{Frame, TransportHandle};

const SUBSCRIBE_PATTERN: &str = "fokabot:*";
const RECONNECT_BACKOFF: Duration = Duration::from_secs(5);

pub type ChannelHandler = Arc<dyn Fn(Value, &TransportHandle) -> Result<(), AppError> + Send + Sync>;

#[derive(Default)]
pub struct Ingress {
    handlers: HashMap<String, ChannelHandler>,
}

impl Ingress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, channel: impl Into<String>, handler: ChannelHandler) {
        self.handlers.insert(channel.into(), handler);
    }

    /// Handles one published frame. Returns `Err` only for handler-internal
    /// failures; unknown channels and schema rejections are logged and
    /// dropped, matching spec §4.7, never surfaced as an error to the caller.
    pub fn handle_message(&self, channel: &str, payload: &str, transport: &TransportHandle) {
        let Some(handler) = self.handlers.get(channel) else {
            warn!(%channel, "pubsub: unknown channel");
            return;
        };
        let value: Value = match serde_json::from_str(payload) {
            Ok(v) => v,
            Err(e) => {
                warn!(%channel, error = %e, "pubsub: malformed JSON payload, dropping");
                return;
            }
        };
        if let Err(e) = handler(value, transport) {
            warn!(%channel, error = %e, "pubsub: handler rejected payload, dropping");
        }
    }

    /// Drains `rx` (channel, raw payload) pairs until the source closes or
    /// `shutdown` fires.
    pub async fn run(
        self,
        mut rx: mpsc::Receiver<(String, String)>,
        transport: TransportHandle,
        shutdown: tokio_util::sync::CancellationToken,
    ) {
        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                msg = rx.recv() => {
                    match msg {
                        Some((channel, payload)) => self.handle_message(&channel, &payload, &transport),
                        None => break,
                    }
                }
            }
        }
    }
}

/// `fokabot:message{recipient, message}` — enqueues a chat message.
pub fn message_handler() -> ChannelHandler {
    Arc::new(|value: Value, transport: &TransportHandle| {
        let recipient = value
            .get("recipient")
            .and_then(|v| v.as_str())
            .ok_or_else(|| AppError::GenericBot("fokabot:message missing `recipient`".into()))?;
        let message = value
            .get("message")
            .and_then(|v| v.as_str())
            .ok_or_else(|| AppError::GenericBot("fokabot:message missing `message`".into()))?;
        transport
            .send(Frame::chat_message(recipient, message))
            .map_err(|e| AppError::Transport(e.to_string()))
    })
}

/// Connects to Redis and forwards every message matching `fokabot:*` into
/// `tx` as `(channel, payload)` for [`Ingress::run`] to drain. Reconnects
/// with a fixed backoff on connection loss, mirroring the transport's
/// reconnect loop.
pub async fn run_redis_subscriber(redis_url: String, tx: mpsc::Sender<(String, String)>, shutdown: CancellationToken) {
    loop {
        if shutdown.is_cancelled() {
            break;
        }

        match connect_and_subscribe(&redis_url, &tx, &shutdown).await {
            Ok(()) => {}
            Err(e) => warn!(error = %e, "pubsub: redis connection failed"),
        }

        if shutdown.is_cancelled() {
            break;
        }
        tokio::select! {
            _ = tokio::time::sleep(RECONNECT_BACKOFF) => {},
            _ = shutdown.cancelled() => break,
        }
    }
}

async fn connect_and_subscribe(
    redis_url: &str,
    tx: &mpsc::Sender<(String, String)>,
    shutdown: &CancellationToken,
) -> Result<(), AppError> {
    let client = redis::Client::open(redis_url).map_err(|e| AppError::Config(e.to_string()))?;
    let mut pubsub = client.get_async_pubsub().await.map_err(|e| AppError::Transport(e.to_string()))?;
    pubsub.psubscribe(SUBSCRIBE_PATTERN).await.map_err(|e| AppError::Transport(e.to_string()))?;
    info!(pattern = SUBSCRIBE_PATTERN, "pubsub: subscribed");

    let mut stream = pubsub.on_message();
    loop {
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => return Ok(()),
            maybe_msg = stream.next() => {
                match maybe_msg {
                    Some(msg) => {
                        let channel = msg.get_channel_name().to_string();
                        match msg.get_payload::<String>() {
                            Ok(payload) => {
                                if tx.send((channel, payload)).await.is_err() {
                                    return Ok(());
                                }
                            }
                            Err(e) => warn!(%channel, error = %e, "pubsub: failed to decode payload"),
                        }
                    }
                    None => {
                        debug!("pubsub: redis message stream closed");
                        return Ok(());
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_util::sync::CancellationToken;

    fn fresh_transport() -> TransportHandle {
        crate::transport::spawn("wss://unused.invalid/".into(), CancellationToken::new()).0
    }

    #[test]
    fn known_channel_enqueues_outbound_message() {
        let mut ingress = Ingress::new();
        ingress.register("fokabot:message", message_handler());
        let transport = fresh_transport();
        ingress.handle_message(
            "fokabot:message",
            r#"{"recipient":"#osu","message":"hello"}"#,
            &transport,
        );
        // No panic, no error path taken — enqueue succeeded (queue has capacity).
    }

    #[test]
    fn unknown_channel_is_logged_and_dropped() {
        let ingress = Ingress::new();
        let transport = fresh_transport();
        ingress.handle_message("fokabot:unknown", "{}", &transport);
    }

    #[test]
    fn schema_rejected_frame_is_dropped_not_panicking() {
        let mut ingress = Ingress::new();
        ingress.register("fokabot:message", message_handler());
        let transport = fresh_transport();
        ingress.handle_message("fokabot:message", r#"{"recipient":"#osu"}"#, &transport);
    }

    #[test]
    fn malformed_json_is_dropped_not_panicking() {
        let mut ingress = Ingress::new();
        ingress.register("fokabot:message", message_handler());
        let transport = fresh_transport();
        ingress.handle_message("fokabot:message", "{not json", &transport);
    }
}
