//! tokio-tungstenite transport.
//!
//! `open` connects, then splits the socket into a writer task fed by an
//! unbounded channel and a reader task forwarding frames as
//! `TransportEvent`s. The reader always finishes with `Closed`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};

use crate::ports::outbound::{
    TransportChannel, TransportConnector, TransportError, TransportEvent, TransportSink,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct WsConnector;

impl WsConnector {
    pub fn new() -> Self {
        Self
    }
}

struct WsSink {
    tx: mpsc::UnboundedSender<Message>,
    closed: AtomicBool,
}

impl TransportSink for WsSink {
    fn send_text(&self, text: String) -> Result<(), TransportError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(TransportError::Send("socket closed".into()));
        }
        self.tx
            .send(Message::Text(text))
            .map_err(|_| TransportError::Send("writer task has stopped".into()))
    }

    fn close(&self) -> Result<(), TransportError> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.tx
            .send(Message::Close(None))
            .map_err(|_| TransportError::Close("writer task has stopped".into()))
    }
}

#[async_trait]
impl TransportConnector for WsConnector {
    async fn open(&self, url: &str) -> Result<TransportChannel, TransportError> {
        let (stream, _response) = connect_async(url)
            .await
            .map_err(|e| TransportError::open(url, e))?;
        tracing::debug!(url, "WebSocket open");

        let (mut write, mut read) = stream.split();
        let (out_tx, mut out_rx) = mpsc::unbounded_channel::<Message>();
        let (event_tx, event_rx) = mpsc::unbounded_channel::<TransportEvent>();

        tokio::spawn(async move {
            while let Some(message) = out_rx.recv().await {
                let closing = matches!(message, Message::Close(_));
                if let Err(e) = write.send(message).await {
                    tracing::warn!(error = %e, "WebSocket write failed");
                    break;
                }
                if closing {
                    break;
                }
            }
        });

        let reader_url = url.to_string();
        tokio::spawn(async move {
            while let Some(frame) = read.next().await {
                let event = match frame {
                    Ok(Message::Text(text)) => TransportEvent::Text(text),
                    Ok(Message::Binary(bytes)) => match String::from_utf8(bytes) {
                        Ok(text) => TransportEvent::Text(text),
                        Err(_) => {
                            tracing::debug!(url = %reader_url, "Dropping non-UTF-8 binary frame");
                            continue;
                        }
                    },
                    Ok(Message::Close(_)) => break,
                    Ok(_) => continue,
                    Err(e) => {
                        let _ = event_tx.send(TransportEvent::Error(e.to_string()));
                        break;
                    }
                };
                if event_tx.send(event).is_err() {
                    // Nobody is listening any more.
                    return;
                }
            }
            tracing::debug!(url = %reader_url, "WebSocket reader finished");
            let _ = event_tx.send(TransportEvent::Closed);
        });

        Ok(TransportChannel {
            sink: Arc::new(WsSink {
                tx: out_tx,
                closed: AtomicBool::new(false),
            }),
            events: event_rx,
        })
    }
}
