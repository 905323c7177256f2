//! Live chat over the `chat` channel.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use worldline_protocol::{EventKind, InboundEvent, Origin};

use super::context::{MountOutcome, PageContext};
use crate::application::access::RouteGuard;
use crate::application::streaming::{lock, ConnectionStatus, LiveBinding, StreamingClient};
use crate::application::sync::format_actor;
use crate::ports::outbound::{Notification, Notifier, TokenSource};

pub const CHAT_ROUTE: &str = "/chat";
pub const CHAT_CHANNEL: &str = "chat";
pub const DEFAULT_TRANSCRIPT_CAPACITY: usize = 200;

#[derive(Debug, Clone, PartialEq)]
pub struct ChatLine {
    pub text: String,
    pub actor: Option<String>,
    pub origin: Origin,
    pub received_at: DateTime<Utc>,
}

impl ChatLine {
    fn from_event(event: &InboundEvent) -> Self {
        Self {
            text: event.text.clone(),
            actor: event.actor.clone(),
            origin: event.origin,
            received_at: event.received_at,
        }
    }

    pub fn is_own(&self) -> bool {
        self.origin == Origin::SelfEcho
    }
}

pub struct ChatPanel {
    tokens: Arc<dyn TokenSource>,
    notifier: Arc<dyn Notifier>,
    guard: RouteGuard,
    client: Arc<StreamingClient>,
    transcript: Arc<Mutex<VecDeque<ChatLine>>>,
    unread: Arc<AtomicUsize>,
    capacity: usize,
    binding: Mutex<Option<LiveBinding>>,
}

impl ChatPanel {
    pub fn new(ctx: &PageContext) -> Self {
        Self::with_capacity(ctx, DEFAULT_TRANSCRIPT_CAPACITY)
    }

    pub fn with_capacity(ctx: &PageContext, capacity: usize) -> Self {
        Self {
            tokens: Arc::clone(&ctx.tokens),
            notifier: Arc::clone(&ctx.notifier),
            guard: ctx.route_guard(&[]),
            client: ctx.streaming_client(CHAT_CHANNEL),
            transcript: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            unread: Arc::new(AtomicUsize::new(0)),
            capacity: capacity.max(1),
            binding: Mutex::new(None),
        }
    }

    pub async fn mount(&self) -> MountOutcome {
        self.unmount();

        let decision = self.guard.check(self.tokens.identity().as_ref(), CHAT_ROUTE);
        if !decision.allowed {
            return MountOutcome::Denied(decision);
        }

        let transcript = Arc::clone(&self.transcript);
        let unread = Arc::clone(&self.unread);
        let notifier = Arc::clone(&self.notifier);
        let capacity = self.capacity;

        let mut binding = LiveBinding::new(Arc::clone(&self.client));
        binding.hold(self.client.subscribe(move |event| {
            // Domain changes belong to the entity pages.
            if event.kind.is_domain() {
                return;
            }
            let line = ChatLine::from_event(event);
            if !line.is_own() {
                unread.fetch_add(1, Ordering::SeqCst);
                let from = match event.kind {
                    EventKind::ChatText => format_actor(line.actor.as_deref()),
                    _ => "server".to_string(),
                };
                notifier.notify(Notification::info(format!("{from}: {}", line.text)));
            }
            let mut transcript = lock(&transcript);
            transcript.push_back(line);
            while transcript.len() > capacity {
                transcript.pop_front();
            }
        }));
        *lock(&self.binding) = Some(binding);

        let connected = self.client.connect(self.tokens.as_ref()).await;
        MountOutcome::Mounted { connected }
    }

    pub fn unmount(&self) {
        let binding = lock(&self.binding).take();
        if let Some(mut binding) = binding {
            binding.release();
        }
    }

    /// Send one chat line. Blank input and a disconnected channel both give
    /// `false`.
    pub fn send_text(&self, text: &str) -> bool {
        let text = text.trim();
        if text.is_empty() {
            return false;
        }
        self.client.send(serde_json::json!({ "content": text }))
    }

    pub fn transcript(&self) -> Vec<ChatLine> {
        lock(&self.transcript).iter().cloned().collect()
    }

    pub fn unread(&self) -> usize {
        self.unread.load(Ordering::SeqCst)
    }

    pub fn mark_read(&self) {
        self.unread.store(0, Ordering::SeqCst);
    }

    pub fn status(&self) -> ConnectionStatus {
        self.client.status()
    }

    pub fn client(&self) -> &Arc<StreamingClient> {
        &self.client
    }
}

impl Drop for ChatPanel {
    fn drop(&mut self) {
        self.unmount();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pages::context::test_support::test_context;
    use crate::ports::outbound::request_gateway::MockRequestGateway;
    use crate::ports::outbound::testing::{eventually, StaticTokens};
    use serde_json::Value;
    use worldline_domain::Identity;

    fn panel(capacity: usize) -> (ChatPanel, crate::pages::context::test_support::TestPage) {
        let t = test_context(
            StaticTokens::signed_in(Identity::new("u-1", "Okabe")),
            Arc::new(MockRequestGateway::new()),
        );
        (ChatPanel::with_capacity(&t.ctx, capacity), t)
    }

    #[tokio::test]
    async fn test_send_goes_out_as_message_frame() {
        let (panel, t) = panel(10);
        assert!(!panel.send_text("before mount"));

        panel.mount().await;
        assert!(panel.send_text("  El Psy Kongroo "));
        assert!(!panel.send_text("   "));

        let sent = t.connector.last().unwrap().sent();
        let frame: Value = serde_json::from_str(&sent[1]).unwrap();
        assert_eq!(frame, serde_json::json!({"type": "message", "content": "El Psy Kongroo"}));
    }

    #[tokio::test]
    async fn test_peer_lines_notify_and_echoes_do_not() {
        let (panel, t) = panel(10);
        panel.mount().await;
        let socket = t.connector.last().unwrap();

        socket.push_text(r#"{"type":"message","content":"Tuturu","actor":"mayuri.shiina@lab.jp"}"#);
        socket.push_text(r#"{"type":"message","content":"[echo] El Psy Kongroo"}"#);
        socket.push_text(r#"{"type":"create","id":"1","name":"ignored"}"#);

        assert!(eventually(|| panel.transcript().len() == 2).await);
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        let transcript = panel.transcript();
        assert_eq!(transcript.len(), 2);
        assert!(!transcript[0].is_own());
        assert!(transcript[1].is_own());
        assert_eq!(panel.unread(), 1);
        assert_eq!(t.notifier.messages(), vec!["Mayuri Shiina: Tuturu".to_string()]);

        panel.mark_read();
        assert_eq!(panel.unread(), 0);
    }

    #[tokio::test]
    async fn test_transcript_is_bounded() {
        let (panel, t) = panel(2);
        panel.mount().await;
        let socket = t.connector.last().unwrap();
        for text in ["one", "two", "three"] {
            socket.push_text(text);
        }

        assert!(eventually(|| panel.transcript().first().map(|l| l.text.as_str()) == Some("two")).await);
        let texts: Vec<String> = panel.transcript().into_iter().map(|l| l.text).collect();
        assert_eq!(texts, vec!["two", "three"]);
    }
}
