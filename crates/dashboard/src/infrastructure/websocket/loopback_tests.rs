//! End-to-end tests against a real WebSocket server on a loopback port.

use std::sync::{Arc, Mutex};

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio_tungstenite::{accept_async, tungstenite::Message};
use worldline_domain::{Customer, Identity};

use super::WsConnector;
use crate::application::streaming::{lock, ConnectionStatus, StreamingClient, StreamingSettings};
use crate::application::sync::{CollectionSync, EditBuffer, TrackedCollection};
use crate::ports::outbound::testing::{eventually, RecordingNotifier, RecordingTelemetry, StaticTokens};

const CREATE_X1: &str = r#"{"type":"create","id":"X-1","name":"Foo","actor":"a.b@example.org"}"#;

/// Serve one connection: report the first frame, push `frames`, then wait
/// for the client to close.
async fn serve_once(frames: Vec<&'static str>) -> (String, oneshot::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (first_tx, first_rx) = oneshot::channel();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();

        if let Some(Ok(Message::Text(first))) = ws.next().await {
            let _ = first_tx.send(first);
        }
        for frame in frames {
            ws.send(Message::Text(frame.to_string())).await.unwrap();
        }
        while let Some(Ok(message)) = ws.next().await {
            if message.is_close() {
                break;
            }
        }
    });

    (format!("ws://{addr}"), first_rx)
}

struct LivePage {
    client: StreamingClient,
    collection: Arc<Mutex<TrackedCollection<Customer>>>,
    notifier: Arc<RecordingNotifier>,
}

async fn mount(base_url: String, current: Identity) -> LivePage {
    let settings = StreamingSettings {
        base_url,
        echo_marker: "[echo]".into(),
    };
    let client = StreamingClient::new(
        &settings,
        "customers",
        Arc::new(WsConnector::new()),
        Arc::new(RecordingTelemetry::new()),
    );
    let notifier = Arc::new(RecordingNotifier::new());
    let sync = CollectionSync::<Customer>::new(notifier.clone());
    let collection = Arc::new(Mutex::new(TrackedCollection::new()));
    let buffer = Arc::new(Mutex::new(EditBuffer::new()));

    let observed = Arc::clone(&collection);
    let tokens = StaticTokens::signed_in(current.clone());
    let _subscription = client.subscribe(move |event| {
        sync.apply_event(
            event,
            &mut lock(&observed),
            &mut lock(&buffer),
            Some(&current),
        );
    });
    assert!(client.connect(&tokens).await);

    LivePage {
        client,
        collection,
        notifier,
    }
}

#[tokio::test]
async fn test_peer_create_reaches_collection_with_notification() {
    let (base_url, first_frame) = serve_once(vec![CREATE_X1]).await;
    let page = mount(base_url, Identity::new("c-d", "C D").with_username("c.d@example.org")).await;

    let auth: Value = serde_json::from_str(&first_frame.await.unwrap()).unwrap();
    assert_eq!(auth["type"], "authenticate");
    assert_eq!(auth["token"], "test-token");

    assert!(eventually(|| lock(&page.collection).len() == 1).await);
    let names: Vec<String> = lock(&page.collection).iter().map(|c| c.name.clone()).collect();
    assert_eq!(names, vec!["Foo".to_string()]);
    assert!(eventually(|| !page.notifier.all().is_empty()).await);
    assert_eq!(
        page.notifier.messages(),
        vec!["New customer \"Foo\" created by A B".to_string()]
    );

    assert!(page.client.disconnect());
    assert_eq!(page.client.status(), ConnectionStatus::Disconnected);
}

#[tokio::test]
async fn test_own_create_reaches_collection_silently() {
    let (base_url, _first_frame) = serve_once(vec![CREATE_X1]).await;
    let page = mount(base_url, Identity::new("a-b", "A B").with_username("a.b@example.org")).await;

    assert!(eventually(|| lock(&page.collection).len() == 1).await);
    assert!(page.notifier.all().is_empty());
    page.client.disconnect();
}

#[tokio::test]
async fn test_server_close_moves_status_to_disconnected() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();
        let _ = ws.next().await;
        let _ = ws.close(None).await;
    });

    let page = mount(format!("ws://{addr}"), Identity::new("u-1", "Okabe")).await;
    assert!(eventually(|| page.client.status() == ConnectionStatus::Disconnected).await);
    assert!(!page.client.send("too late"));
}

#[tokio::test]
async fn test_unreachable_server_sets_error() {
    // Bind then drop to get a port nobody listens on.
    let addr = TcpListener::bind("127.0.0.1:0").await.unwrap().local_addr().unwrap();
    let settings = StreamingSettings {
        base_url: format!("ws://{addr}"),
        echo_marker: "[echo]".into(),
    };
    let telemetry = Arc::new(RecordingTelemetry::new());
    let client = StreamingClient::new(&settings, "chat", Arc::new(WsConnector::new()), telemetry.clone());

    assert!(!client.connect(&StaticTokens::signed_in(Identity::new("u-1", "Okabe"))).await);
    assert_eq!(client.status(), ConnectionStatus::Error);
    assert_eq!(telemetry.errors()[0].0, "streaming.connect.open");
}
