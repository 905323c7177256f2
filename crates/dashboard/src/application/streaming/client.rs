//! Streaming client bound to one channel path.
//!
//! Owns at most one live transport. Every connect starts a new generation;
//! the inbound pump of a replaced generation is aborted and, should a frame
//! still slip through, drops it instead of delivering it. That is what keeps
//! "connect twice" from ever producing two deliveries per frame.
//!
//! Transport failures never escape the public methods. They are reported to
//! telemetry and surface only as a status change.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use worldline_protocol::{authenticate_frame, normalize, InboundEvent, OutboundPayload};

use super::observers::{lock, ObserverRegistry, Subscription};
use super::status::ConnectionStatus;
use crate::ports::outbound::{
    Telemetry, TokenSource, TransportConnector, TransportEvent, TransportSink,
};

/// Where streaming channels live and how echoes are recognized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamingSettings {
    /// Base streaming URL, e.g. `ws://localhost:8080/ws`.
    pub base_url: String,
    /// Substring marking a frame the backend echoed back to us.
    pub echo_marker: String,
}

impl StreamingSettings {
    pub fn channel_url(&self, channel_path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            channel_path.trim_start_matches('/')
        )
    }
}

/// A status transition, numbered so late deliveries can be recognized.
#[derive(Debug, Clone, Copy)]
struct StatusChange {
    status: ConnectionStatus,
    version: u64,
}

impl StatusChange {
    fn pack(self) -> u64 {
        (self.version << 8) | u64::from(self.status.to_u8())
    }

    fn unpack(packed: u64) -> Self {
        Self {
            status: ConnectionStatus::from_u8((packed & 0xff) as u8),
            version: packed >> 8,
        }
    }
}

/// Wrap a status observer so it never sees an older change after a newer one.
fn latest_only(
    observer: impl Fn(&ConnectionStatus) + Send + Sync + 'static,
) -> impl Fn(&StatusChange) + Send + Sync + 'static {
    let next = AtomicU64::new(0);
    move |change: &StatusChange| {
        if next.fetch_max(change.version + 1, Ordering::SeqCst) <= change.version {
            observer(&change.status);
        }
    }
}

struct Link {
    generation: u64,
    sink: Arc<dyn TransportSink>,
    pump: Option<JoinHandle<()>>,
}

struct Shared {
    channel_path: String,
    echo_marker: String,
    /// Packed `StatusChange`.
    status: AtomicU64,
    generation: AtomicU64,
    link: Mutex<Option<Link>>,
    messages: Arc<ObserverRegistry<InboundEvent>>,
    statuses: Arc<ObserverRegistry<StatusChange>>,
    telemetry: Arc<dyn Telemetry>,
}

impl Shared {
    fn status(&self) -> ConnectionStatus {
        self.status_change().status
    }

    fn status_change(&self) -> StatusChange {
        StatusChange::unpack(self.status.load(Ordering::SeqCst))
    }

    fn set_status(&self, status: ConnectionStatus) {
        let updated = self
            .status
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |packed| {
                let current = StatusChange::unpack(packed);
                (current.status != status).then(|| {
                    StatusChange {
                        status,
                        version: current.version + 1,
                    }
                    .pack()
                })
            });
        if let Ok(previous) = updated {
            let previous = StatusChange::unpack(previous);
            tracing::debug!(
                channel = %self.channel_path,
                from = %previous.status,
                to = %status,
                "Streaming status changed"
            );
            self.statuses.emit(&StatusChange {
                status,
                version: previous.version + 1,
            });
        }
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    fn report(&self, context: &str, error: &dyn std::fmt::Display) {
        let message = error.to_string();
        tracing::error!(channel = %self.channel_path, context, error = %message, "Streaming failure");
        self.telemetry.report_error(context, &message);
    }

    /// Drop the link for `generation` if it is still the installed one.
    fn release(&self, generation: u64) -> bool {
        let mut link = lock(&self.link);
        if link.as_ref().is_some_and(|l| l.generation == generation) {
            *link = None;
            true
        } else {
            false
        }
    }
}

/// Streaming client for one channel path.
///
/// Not shared across pages: each page creates its own and tears it down when
/// it unmounts.
pub struct StreamingClient {
    url: String,
    connector: Arc<dyn TransportConnector>,
    shared: Arc<Shared>,
}

impl StreamingClient {
    pub fn new(
        settings: &StreamingSettings,
        channel_path: impl Into<String>,
        connector: Arc<dyn TransportConnector>,
        telemetry: Arc<dyn Telemetry>,
    ) -> Self {
        let channel_path = channel_path.into();
        Self {
            url: settings.channel_url(&channel_path),
            connector,
            shared: Arc::new(Shared {
                channel_path,
                echo_marker: settings.echo_marker.clone(),
                status: AtomicU64::new(
                    StatusChange {
                        status: ConnectionStatus::Disconnected,
                        version: 0,
                    }
                    .pack(),
                ),
                generation: AtomicU64::new(0),
                link: Mutex::new(None),
                messages: ObserverRegistry::new(),
                statuses: ObserverRegistry::new(),
                telemetry,
            }),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn channel_path(&self) -> &str {
        &self.shared.channel_path
    }

    pub fn status(&self) -> ConnectionStatus {
        self.shared.status()
    }

    pub fn is_connected(&self) -> bool {
        self.status().is_connected()
    }

    /// Open the transport and authenticate.
    ///
    /// Any existing connection is torn down first. Returns `true` once the
    /// socket is open and the authenticate frame has been dispatched.
    pub async fn connect(&self, tokens: &dyn TokenSource) -> bool {
        self.teardown();
        let generation = self.shared.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let token = match tokens.bearer_token().await {
            Ok(token) => token,
            Err(e) => {
                self.shared.report("streaming.connect.token", &e);
                self.fail_if_current(generation);
                return false;
            }
        };

        let channel = match self.connector.open(&self.url).await {
            Ok(channel) => channel,
            Err(e) => {
                self.shared.report("streaming.connect.open", &e);
                self.fail_if_current(generation);
                return false;
            }
        };

        if !self.shared.is_current(generation) {
            // A newer connect or a disconnect happened while we were opening.
            let _ = channel.sink.close();
            tracing::debug!(channel = %self.shared.channel_path, generation, "Discarding superseded connection");
            return false;
        }

        let sent = authenticate_frame(&token)
            .map_err(|e| e.to_string())
            .and_then(|frame| channel.sink.send_text(frame).map_err(|e| e.to_string()));
        if let Err(e) = sent {
            self.shared.report("streaming.connect.authenticate", &e);
            let _ = channel.sink.close();
            self.fail_if_current(generation);
            return false;
        }

        {
            let mut link = lock(&self.shared.link);
            *link = Some(Link {
                generation,
                sink: Arc::clone(&channel.sink),
                pump: None,
            });
        }
        self.shared.set_status(ConnectionStatus::Connected);

        let pump = tokio::spawn(pump(Arc::clone(&self.shared), generation, channel.events));
        {
            let mut link = lock(&self.shared.link);
            match link.as_mut() {
                Some(current) if current.generation == generation => current.pump = Some(pump),
                // Torn down (or closed by the server) before the pump was installed.
                _ => pump.abort(),
            }
        }

        tracing::info!(channel = %self.shared.channel_path, url = %self.url, generation, "Streaming connected");
        true
    }

    /// Send a frame. Only succeeds while connected; nothing is queued.
    pub fn send(&self, data: impl Into<OutboundPayload>) -> bool {
        if !self.is_connected() {
            return false;
        }
        let sink = match lock(&self.shared.link).as_ref() {
            Some(link) => Arc::clone(&link.sink),
            None => return false,
        };

        let frame = match data.into().encode() {
            Ok(frame) => frame,
            Err(e) => {
                self.shared.report("streaming.send.encode", &e);
                return false;
            }
        };

        match sink.send_text(frame) {
            Ok(()) => true,
            Err(e) => {
                self.shared.report("streaming.send", &e);
                false
            }
        }
    }

    /// Close the transport. Returns `false` when there was nothing to close or
    /// the close itself failed.
    pub fn disconnect(&self) -> bool {
        self.shared.generation.fetch_add(1, Ordering::SeqCst);
        let link = lock(&self.shared.link).take();
        let Some(link) = link else {
            return false;
        };

        if let Some(pump) = link.pump {
            pump.abort();
        }
        let closed = link.sink.close();
        self.shared.set_status(ConnectionStatus::Disconnected);

        match closed {
            Ok(()) => {
                tracing::info!(channel = %self.shared.channel_path, "Streaming disconnected");
                true
            }
            Err(e) => {
                self.shared.report("streaming.disconnect", &e);
                false
            }
        }
    }

    /// Register a message observer; called once per inbound event, in
    /// receipt order.
    pub fn subscribe(&self, observer: impl Fn(&InboundEvent) + Send + Sync + 'static) -> Subscription {
        self.shared.messages.register(observer)
    }

    /// Register a status observer. It is called immediately with the current
    /// status and then on every transition.
    pub fn subscribe_to_status(
        &self,
        observer: impl Fn(&ConnectionStatus) + Send + Sync + 'static,
    ) -> Subscription {
        let observer = Arc::new(latest_only(observer));
        let replay = Arc::clone(&observer);
        let subscription = self
            .shared
            .statuses
            .register(move |change: &StatusChange| observer(change));
        // A transition racing this replay wins; the stale replay is dropped.
        replay(&self.shared.status_change());
        subscription
    }

    /// Drop every registered observer.
    pub fn clear_observers(&self) {
        self.shared.messages.clear();
        self.shared.statuses.clear();
    }

    pub fn observer_count(&self) -> usize {
        self.shared.messages.len() + self.shared.statuses.len()
    }

    fn teardown(&self) {
        if lock(&self.shared.link).is_some() {
            tracing::debug!(channel = %self.shared.channel_path, "Replacing existing connection");
            self.disconnect();
        }
    }

    fn fail_if_current(&self, generation: u64) {
        if self.shared.is_current(generation) {
            self.shared.set_status(ConnectionStatus::Error);
        }
    }
}

async fn pump(
    shared: Arc<Shared>,
    generation: u64,
    mut events: mpsc::UnboundedReceiver<TransportEvent>,
) {
    while let Some(event) = events.recv().await {
        if !shared.is_current(generation) {
            return;
        }
        match event {
            TransportEvent::Text(raw) => {
                let event = normalize(&raw, &shared.echo_marker, Utc::now());
                shared.messages.emit(&event);
            }
            TransportEvent::Error(message) => {
                shared.report("streaming.transport", &message);
                shared.set_status(ConnectionStatus::Error);
            }
            TransportEvent::Closed => break,
        }
    }

    if shared.release(generation) {
        tracing::info!(channel = %shared.channel_path, "Streaming connection closed by peer");
        shared.set_status(ConnectionStatus::Disconnected);
    }
}
