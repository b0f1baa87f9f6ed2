//! Transport — framed, ordered, duplex websocket stream to the chat server
//! (spec §4.1). Two cooperating workers (writer/reader) with reconnect.

pub mod codec;

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub use codec::Frame;

/// Bound on the writer's pending-frame queue (spec §5 / §9 open question b):
/// the source is unbounded; we bound it and treat overflow as a disconnect
/// signal instead of growing memory without limit.
const WRITER_QUEUE_CAPACITY: usize = 1024;

/// Fixed reconnect backoff (spec §4.2, §9 open question a).
/// TODO: replace with capped exponential backoff once the chat server
/// exposes a retry-after hint.
const RECONNECT_BACKOFF: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub enum TransportEvent {
    Connected,
    Disconnected,
    Frame(Frame),
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("writer queue overflow")]
    WriterOverflow,
    #[error("transport is shutting down")]
    Closed,
}

/// Handle used by the rest of the crate to enqueue outbound frames. Cheaply
/// cloneable; never blocks on the network.
#[derive(Clone)]
pub struct TransportHandle {
    outbound_tx: mpsc::Sender<Frame>,
}

impl TransportHandle {
    /// Enqueues an outbound frame. Never blocks on the network; fails only
    /// if the writer queue is full (`WriterOverflow`) or the writer has
    /// already been cancelled (`Closed`).
    pub fn send(&self, frame: Frame) -> Result<(), TransportError> {
        self.outbound_tx.try_send(frame).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => TransportError::WriterOverflow,
            mpsc::error::TrySendError::Closed(_) => TransportError::Closed,
        })
    }
}

/// Spawns the reconnect loop and returns a handle plus the inbound event
/// stream. Runs until `shutdown` is cancelled.
pub fn spawn(url: String, shutdown: CancellationToken) -> (TransportHandle, mpsc::Receiver<TransportEvent>) {
    let (outbound_tx, outbound_rx) = mpsc::channel(WRITER_QUEUE_CAPACITY);
    let (inbound_tx, inbound_rx) = mpsc::channel(WRITER_QUEUE_CAPACITY);

    tokio::spawn(reconnect_loop(url, outbound_rx, inbound_tx, shutdown));

    (TransportHandle { outbound_tx }, inbound_rx)
}

async fn reconnect_loop(
    url: String,
    mut outbound_rx: mpsc::Receiver<Frame>,
    inbound_tx: mpsc::Sender<TransportEvent>,
    shutdown: CancellationToken,
) {
    loop {
        if shutdown.is_cancelled() {
            break;
        }

        match connect_async(&url).await {
            Ok((ws_stream, _response)) => {
                info!(%url, "transport connected");
                let _ = inbound_tx.send(TransportEvent::Connected).await;

                let (mut sink, mut stream) = ws_stream.split();
                let conn_shutdown = shutdown.child_token();

                let writer = async {
                    loop {
                        tokio::select! {
                            biased;
                            _ = conn_shutdown.cancelled() => break,
                            maybe_frame = outbound_rx.recv() => {
                                match maybe_frame {
                                    Some(frame) => {
                                        let msg: Message = (&frame).into();
                                        if sink.send(msg).await.is_err() {
                                            break;
                                        }
                                    }
                                    None => break,
                                }
                            }
                        }
                    }
                };

                let reader = async {
                    loop {
                        tokio::select! {
                            biased;
                            _ = conn_shutdown.cancelled() => break,
                            maybe_msg = stream.next() => {
                                match maybe_msg {
                                    Some(Ok(msg)) if msg.is_text() || msg.is_binary() => {
                                        match Frame::try_from(&msg) {
                                            Ok(frame) => {
                                                if inbound_tx.send(TransportEvent::Frame(frame)).await.is_err() {
                                                    break;
                                                }
                                            }
                                            Err(e) => warn!(error = %e, "failed to decode inbound frame"),
                                        }
                                    }
                                    Some(Ok(_)) => {} // ping/pong/close control frames, ignored here
                                    Some(Err(e)) => {
                                        warn!(error = %e, "transport read error");
                                        break;
                                    }
                                    None => break,
                                }
                            }
                        }
                    }
                };

                tokio::select! {
                    _ = writer => {},
                    _ = reader => {},
                    _ = shutdown.cancelled() => {},
                }
                conn_shutdown.cancel();
                debug!("transport connection closed");
                let _ = inbound_tx.send(TransportEvent::Disconnected).await;
            }
            Err(e) => {
                warn!(error = %e, "transport connect failed");
            }
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overflow_is_reported_not_blocking() {
        let (tx, _rx) = mpsc::channel(1);
        let handle = TransportHandle { outbound_tx: tx };
        handle.send(Frame::pong()).unwrap();
        let err = handle.send(Frame::pong()).unwrap_err();
        assert!(matches!(err, TransportError::WriterOverflow));
    }

    #[test]
    fn send_after_close_reports_closed() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let handle = TransportHandle { outbound_tx: tx };
        let err = handle.send(Frame::pong()).unwrap_err();
        assert!(matches!(err, TransportError::Closed));
    }
}
