//! Transport Port - one persistent, message-oriented socket
//!
//! `TransportConnector::open` resolves once the socket is open. Outbound frames
//! go through the returned sink; everything the socket reports afterwards
//! (text frames, close, errors) arrives in order on `events`.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("Failed to open {url}: {message}")]
    Open { url: String, message: String },

    #[error("Send failed: {0}")]
    Send(String),

    #[error("Close failed: {0}")]
    Close(String),
}

impl TransportError {
    pub fn open(url: &str, message: impl ToString) -> Self {
        Self::Open {
            url: url.to_string(),
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    Text(String),
    Error(String),
    /// Terminal: nothing follows a close.
    Closed,
}

pub trait TransportSink: Send + Sync {
    fn send_text(&self, text: String) -> Result<(), TransportError>;

    fn close(&self) -> Result<(), TransportError>;
}

pub struct TransportChannel {
    pub sink: Arc<dyn TransportSink>,
    pub events: mpsc::UnboundedReceiver<TransportEvent>,
}

#[async_trait]
pub trait TransportConnector: Send + Sync {
    async fn open(&self, url: &str) -> Result<TransportChannel, TransportError>;
}
