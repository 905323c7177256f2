//! Scripted in-memory transport.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::application::streaming::lock;
use crate::ports::outbound::{
    TransportChannel, TransportConnector, TransportError, TransportEvent, TransportSink,
};

/// One socket opened through a `FakeConnector`.
#[derive(Clone)]
pub struct FakeSocket {
    pub url: String,
    sent: Arc<Mutex<Vec<String>>>,
    closed: Arc<AtomicBool>,
    fail_sends: Arc<AtomicBool>,
    fail_close: Arc<AtomicBool>,
    events: mpsc::UnboundedSender<TransportEvent>,
}

impl FakeSocket {
    /// Frames the client sent, in order.
    pub fn sent(&self) -> Vec<String> {
        lock(&self.sent).clone()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Deliver a text frame as if the server sent it.
    pub fn push_text(&self, text: &str) {
        let _ = self.events.send(TransportEvent::Text(text.to_string()));
    }

    pub fn push_error(&self, message: &str) {
        let _ = self.events.send(TransportEvent::Error(message.to_string()));
    }

    /// Simulate the server closing the socket.
    pub fn push_close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        let _ = self.events.send(TransportEvent::Closed);
    }

    pub fn fail_sends(&self) {
        self.fail_sends.store(true, Ordering::SeqCst);
    }

    pub fn fail_close(&self) {
        self.fail_close.store(true, Ordering::SeqCst);
    }
}

struct FakeSink {
    socket: FakeSocket,
}

impl TransportSink for FakeSink {
    fn send_text(&self, text: String) -> Result<(), TransportError> {
        if self.socket.is_closed() {
            return Err(TransportError::Send("socket closed".into()));
        }
        if self.socket.fail_sends.load(Ordering::SeqCst) {
            return Err(TransportError::Send("scripted send failure".into()));
        }
        lock(&self.socket.sent).push(text);
        Ok(())
    }

    fn close(&self) -> Result<(), TransportError> {
        if self.socket.fail_close.load(Ordering::SeqCst) {
            return Err(TransportError::Close("scripted close failure".into()));
        }
        self.socket.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Connector that opens `FakeSocket`s and remembers all of them.
#[derive(Default)]
pub struct FakeConnector {
    opened: Mutex<Vec<FakeSocket>>,
    fail_next_open: AtomicBool,
}

impl FakeConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_next_open(&self) {
        self.fail_next_open.store(true, Ordering::SeqCst);
    }

    pub fn opened(&self) -> Vec<FakeSocket> {
        lock(&self.opened).clone()
    }

    pub fn open_count(&self) -> usize {
        lock(&self.opened).len()
    }

    pub fn last(&self) -> Option<FakeSocket> {
        lock(&self.opened).last().cloned()
    }

    /// Sockets the client has not closed (and the server has not closed).
    pub fn live_count(&self) -> usize {
        lock(&self.opened).iter().filter(|s| !s.is_closed()).count()
    }
}

#[async_trait]
impl TransportConnector for FakeConnector {
    async fn open(&self, url: &str) -> Result<TransportChannel, TransportError> {
        if self.fail_next_open.swap(false, Ordering::SeqCst) {
            return Err(TransportError::open(url, "scripted open failure"));
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let socket = FakeSocket {
            url: url.to_string(),
            sent: Arc::new(Mutex::new(Vec::new())),
            closed: Arc::new(AtomicBool::new(false)),
            fail_sends: Arc::new(AtomicBool::new(false)),
            fail_close: Arc::new(AtomicBool::new(false)),
            events: tx,
        };
        lock(&self.opened).push(socket.clone());

        Ok(TransportChannel {
            sink: Arc::new(FakeSink { socket }),
            events: rx,
        })
    }
}
