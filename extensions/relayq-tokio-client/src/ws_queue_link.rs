use crate::broker_envelope::{PublishEnvelope, ReplyEnvelope};
use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use relayq::transport::{DeliveryHandler, QueueTransport, TransportError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc::{self, unbounded_channel};
use tokio_tungstenite::{connect_async, tungstenite, tungstenite::protocol::Message as WsMessage};

/// WebSocket link to a queue-broker gateway.
///
/// The gateway relays publish wrappers onto the named work queue and frames
/// queue deliveries back as JSON reply envelopes. One spawned task pumps
/// outgoing messages from an unbounded channel into the socket; a second
/// parses incoming messages and hands each to the subscribed session before
/// reading the next, so deliveries stay serial.
pub struct WsQueueLink {
    tx: mpsc::UnboundedSender<WsMessage>,
    handler: Arc<Mutex<Option<DeliveryHandler>>>,
    work_queue: String,
    closed: AtomicBool,
}

impl WsQueueLink {
    /// Connects to `websocket_address` and starts the send and receive
    /// loops. `work_queue` names the shared queue publishes are routed to.
    pub async fn connect(
        websocket_address: &str,
        work_queue: impl Into<String>,
    ) -> Result<Self, TransportError> {
        let (ws_stream, _) = connect_async(websocket_address).await.map_err(ws_error)?;
        let (mut sender, mut receiver) = ws_stream.split();

        let (tx, mut rx) = unbounded_channel::<WsMessage>();
        let handler: Arc<Mutex<Option<DeliveryHandler>>> = Arc::new(Mutex::new(None));

        // Send loop
        tokio::spawn(async move {
            while let Some(msg) = rx.recv().await {
                if sender.send(msg).await.is_err() {
                    break;
                }
            }
        });

        // Receive loop
        let dispatch_handler = Arc::clone(&handler);
        tokio::spawn(async move {
            while let Some(msg) = receiver.next().await {
                let envelope = match &msg {
                    Ok(WsMessage::Binary(bytes)) => serde_json::from_slice::<ReplyEnvelope>(bytes),
                    Ok(WsMessage::Text(text)) => serde_json::from_str::<ReplyEnvelope>(text),
                    Ok(WsMessage::Close(_)) => break,
                    Ok(_) => continue,
                    Err(e) => {
                        tracing::warn!("WebSocket receive failed: {}", e);
                        break;
                    }
                };

                match envelope {
                    Ok(envelope) => {
                        let mut handler =
                            dispatch_handler.lock().expect("delivery handler poisoned");
                        match handler.as_mut() {
                            Some(on_delivery) => on_delivery(envelope.into_fragment()),
                            None => {
                                tracing::warn!("Reply arrived before any subscription; discarded")
                            }
                        }
                    }
                    Err(e) => tracing::warn!("Undecodable broker message skipped: {}", e),
                }
            }
        });

        Ok(Self {
            tx,
            handler,
            work_queue: work_queue.into(),
            closed: AtomicBool::new(false),
        })
    }
}

impl QueueTransport for WsQueueLink {
    fn publish(
        &self,
        correlation_id: &str,
        reply_to: &str,
        payload: &[u8],
    ) -> Result<(), TransportError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(TransportError::Closed);
        }

        // The gateway carries request bodies as JSON text.
        let body = std::str::from_utf8(payload)
            .map_err(|_| TransportError::Protocol("request payload is not valid UTF-8".into()))?;

        let wrapper = serde_json::to_vec(&PublishEnvelope {
            queue: &self.work_queue,
            correlation_id,
            reply_to,
            body,
        })
        .map_err(|e| TransportError::Protocol(e.to_string()))?;

        self.tx
            .send(WsMessage::Binary(Bytes::from(wrapper)))
            .map_err(|_| TransportError::Closed)
    }

    fn subscribe(&self, _reply_to: &str, on_delivery: DeliveryHandler) -> Result<(), TransportError> {
        // The gateway learns the reply binding from each publish wrapper's
        // reply_to field, so subscribing is purely local.
        *self.handler.lock().expect("delivery handler poisoned") = Some(on_delivery);
        Ok(())
    }

    fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            let _ = self.tx.send(WsMessage::Close(None));
        }
    }
}

fn ws_error(e: tungstenite::Error) -> TransportError {
    match e {
        tungstenite::Error::Io(io) => TransportError::Io(io),
        other => TransportError::Protocol(other.to_string()),
    }
}
