//! Divergence chart fed by REST polling and streamed readings.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use tokio::task::JoinHandle;
use uuid::Uuid;
use worldline_domain::{RecordId, SyncRecord, WorldlineReading};
use worldline_protocol::{ChangeKind, EventKind, InboundEvent};

use super::context::{MountOutcome, PageContext};
use crate::application::access::RouteGuard;
use crate::application::services::CollectionApi;
use crate::application::streaming::{lock, ConnectionStatus, LiveBinding, StreamingClient};
use crate::ports::outbound::{Telemetry, TokenSource};

pub const MONITOR_ROUTE: &str = "/monitor";
pub const MONITOR_CHANNEL: &str = "worldline";
pub const READINGS_PATH: &str = "/worldline/readings";
/// Floor for the poll interval; `tokio::time::interval` rejects zero.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorSettings {
    pub poll_interval: Duration,
    /// Maximum number of chart points kept.
    pub window: usize,
}

/// Time-ordered chart points, unique by reading id, oldest dropped first.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadingSeries {
    window: usize,
    points: Vec<WorldlineReading>,
}

impl ReadingSeries {
    pub fn new(window: usize) -> Self {
        Self {
            window: window.max(1),
            points: Vec::new(),
        }
    }

    /// Insert or replace `reading`, keeping time order.
    pub fn merge(&mut self, reading: WorldlineReading) {
        self.remove(reading.record_id());
        let at = self
            .points
            .partition_point(|p| p.recorded_at <= reading.recorded_at);
        self.points.insert(at, reading);
        if self.points.len() > self.window {
            let excess = self.points.len() - self.window;
            self.points.drain(..excess);
        }
    }

    pub fn merge_all(&mut self, readings: impl IntoIterator<Item = WorldlineReading>) {
        for reading in readings {
            self.merge(reading);
        }
    }

    pub fn remove(&mut self, id: &RecordId) -> bool {
        let before = self.points.len();
        self.points.retain(|p| p.record_id() != id);
        before != self.points.len()
    }

    pub fn latest(&self) -> Option<&WorldlineReading> {
        self.points.last()
    }

    pub fn points(&self) -> &[WorldlineReading] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

pub struct WorldlineMonitor {
    tokens: Arc<dyn TokenSource>,
    telemetry: Arc<dyn Telemetry>,
    settings: MonitorSettings,
    api: CollectionApi<WorldlineReading>,
    guard: RouteGuard,
    client: Arc<StreamingClient>,
    series: Arc<Mutex<ReadingSeries>>,
    binding: Mutex<Option<LiveBinding>>,
    poller: Mutex<Option<JoinHandle<()>>>,
}

impl WorldlineMonitor {
    pub fn new(ctx: &PageContext, settings: MonitorSettings) -> Self {
        Self {
            tokens: Arc::clone(&ctx.tokens),
            telemetry: Arc::clone(&ctx.telemetry),
            settings,
            api: CollectionApi::new(Arc::clone(&ctx.gateway), READINGS_PATH),
            guard: ctx.route_guard(&[]),
            client: ctx.streaming_client(MONITOR_CHANNEL),
            series: Arc::new(Mutex::new(ReadingSeries::new(settings.window))),
            binding: Mutex::new(None),
            poller: Mutex::new(None),
        }
    }

    /// Gate, subscribe, connect, and start polling. The first poll runs
    /// immediately.
    pub async fn mount(&self) -> MountOutcome {
        self.unmount();

        let decision = self.guard.check(self.tokens.identity().as_ref(), MONITOR_ROUTE);
        if !decision.allowed {
            return MountOutcome::Denied(decision);
        }

        let series = Arc::clone(&self.series);
        let mut binding = LiveBinding::new(Arc::clone(&self.client));
        binding.hold(self.client.subscribe(move |event| {
            apply_stream_event(&series, event);
        }));
        *lock(&self.binding) = Some(binding);

        let poller = tokio::spawn(poll(
            self.api.clone(),
            Arc::clone(&self.series),
            Arc::clone(&self.telemetry),
            self.settings.poll_interval,
        ));
        *lock(&self.poller) = Some(poller);

        let connected = self.client.connect(self.tokens.as_ref()).await;
        MountOutcome::Mounted { connected }
    }

    pub fn unmount(&self) {
        if let Some(poller) = lock(&self.poller).take() {
            poller.abort();
        }
        let binding = lock(&self.binding).take();
        if let Some(mut binding) = binding {
            binding.release();
        }
    }

    pub fn series(&self) -> Vec<WorldlineReading> {
        lock(&self.series).points().to_vec()
    }

    pub fn latest_divergence(&self) -> Option<f64> {
        lock(&self.series).latest().map(|r| r.divergence)
    }

    pub fn status(&self) -> ConnectionStatus {
        self.client.status()
    }

    pub fn client(&self) -> &Arc<StreamingClient> {
        &self.client
    }
}

impl Drop for WorldlineMonitor {
    fn drop(&mut self) {
        self.unmount();
    }
}

async fn poll(
    api: CollectionApi<WorldlineReading>,
    series: Arc<Mutex<ReadingSeries>>,
    telemetry: Arc<dyn Telemetry>,
    every: Duration,
) {
    let mut ticker = tokio::time::interval(every.max(MIN_POLL_INTERVAL));
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        match api.list().await {
            Ok(readings) => {
                tracing::debug!(count = readings.len(), "Polled worldline readings");
                lock(&series).merge_all(readings);
            }
            Err(e) => {
                tracing::warn!(error = %e, "Worldline poll failed");
                telemetry.report_error("monitor.poll", &e.to_string());
            }
        }
    }
}

fn apply_stream_event(series: &Mutex<ReadingSeries>, event: &InboundEvent) {
    if let Some(change) = event.domain_change() {
        match change.kind {
            ChangeKind::Delete => {
                lock(series).remove(&change.id);
            }
            ChangeKind::Create | ChangeKind::Update => {
                if let Some(reading) = change
                    .record
                    .as_object()
                    .and_then(|record| reading_from(record, event.received_at))
                {
                    lock(series).merge(reading);
                }
            }
        }
        return;
    }

    if event.kind == EventKind::ChatText {
        let reading = event
            .payload
            .as_object()
            .filter(|object| object.contains_key("divergence"))
            .and_then(|object| reading_from(object, event.received_at));
        if let Some(reading) = reading {
            lock(series).merge(reading);
        }
    }
}

/// Build a reading, filling a missing id and timestamp.
fn reading_from(object: &Map<String, Value>, received_at: DateTime<Utc>) -> Option<WorldlineReading> {
    let mut object = object.clone();
    object.remove("type");
    object
        .entry("id")
        .or_insert_with(|| Value::String(Uuid::new_v4().to_string()));
    object
        .entry("recorded_at")
        .or_insert_with(|| Value::String(received_at.to_rfc3339()));
    match serde_json::from_value(Value::Object(object)) {
        Ok(reading) => Some(reading),
        Err(e) => {
            tracing::debug!(error = %e, "Ignoring frame that is not a reading");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pages::context::test_support::test_context;
    use crate::ports::outbound::request_gateway::MockRequestGateway;
    use crate::ports::outbound::testing::{eventually, StaticTokens};
    use crate::ports::outbound::GatewayError;
    use chrono::TimeZone;
    use serde_json::json;
    use worldline_domain::Identity;
    use worldline_protocol::{normalize, DEFAULT_ECHO_MARKER};

    fn reading(id: &str, divergence: f64, second: u32) -> WorldlineReading {
        WorldlineReading {
            id: RecordId::parse(id).unwrap(),
            divergence,
            recorded_at: Utc.with_ymd_and_hms(2010, 8, 21, 12, 0, second).unwrap(),
            label: None,
        }
    }

    fn ids(series: &ReadingSeries) -> Vec<&str> {
        series.points().iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn test_series_is_time_ordered_and_deduplicated() {
        let mut series = ReadingSeries::new(10);
        series.merge(reading("b", 1.048596, 2));
        series.merge(reading("a", 0.571024, 1));
        series.merge(reading("c", 0.337187, 3));
        series.merge(reading("a", 0.571046, 1));

        assert_eq!(ids(&series), vec!["a", "b", "c"]);
        assert_eq!(series.points()[0].divergence, 0.571046);
        assert_eq!(series.latest().map(|r| r.divergence), Some(0.337187));
    }

    #[test]
    fn test_series_drops_oldest_beyond_window() {
        let mut series = ReadingSeries::new(2);
        series.merge_all([reading("a", 0.1, 1), reading("b", 0.2, 2), reading("c", 0.3, 3)]);
        assert_eq!(ids(&series), vec!["b", "c"]);
    }

    #[test]
    fn test_stream_events_update_series() {
        let series = Mutex::new(ReadingSeries::new(10));
        let at = Utc.with_ymd_and_hms(2010, 8, 21, 12, 0, 0).unwrap();
        let apply = |raw: &str| apply_stream_event(&series, &normalize(raw, DEFAULT_ECHO_MARKER, at));

        apply(r#"{"type":"create","id":"r1","divergence":1.048596,"recorded_at":"2010-08-21T12:00:05Z"}"#);
        apply(r#"{"type":"message","divergence":0.571024}"#);
        apply(r#"{"type":"message","content":"just chatting"}"#);
        assert_eq!(lock(&series).len(), 2);
        // The message frame had no timestamp, so it is placed at receipt time.
        assert_eq!(lock(&series).latest().map(|r| r.id.as_str().to_string()), Some("r1".into()));

        apply(r#"{"type":"delete","id":"r1"}"#);
        assert_eq!(lock(&series).len(), 1);
        assert_eq!(lock(&series).latest().map(|r| r.divergence), Some(0.571024));
    }

    #[tokio::test]
    async fn test_mount_polls_and_merges_stream() {
        let mut gateway = MockRequestGateway::new();
        gateway
            .expect_request()
            .withf(|_, path, _| path == READINGS_PATH)
            .returning(|_, _, _| {
                Ok(json!([{"id": "p1", "divergence": 0.409431, "recorded_at": "2010-08-21T12:00:00Z"}]))
            });
        let t = test_context(
            StaticTokens::signed_in(Identity::new("u-1", "Okabe")),
            Arc::new(gateway),
        );
        let monitor = WorldlineMonitor::new(
            &t.ctx,
            MonitorSettings {
                poll_interval: Duration::from_secs(3600),
                window: 10,
            },
        );

        assert!(monitor.mount().await.is_mounted());
        assert!(eventually(|| monitor.series().len() == 1).await);

        t.connector
            .last()
            .unwrap()
            .push_text(r#"{"type":"create","id":"s1","divergence":1.130205,"recorded_at":"2010-08-21T12:00:09Z"}"#);
        assert!(eventually(|| monitor.latest_divergence() == Some(1.130205)).await);

        monitor.unmount();
        assert_eq!(t.connector.live_count(), 0);
    }

    #[tokio::test]
    async fn test_poll_failure_is_reported_not_fatal() {
        let mut gateway = MockRequestGateway::new();
        gateway
            .expect_request()
            .returning(|_, _, _| Err(GatewayError::Network("connection refused".into())));
        let t = test_context(
            StaticTokens::signed_in(Identity::new("u-1", "Okabe")),
            Arc::new(gateway),
        );
        let monitor = WorldlineMonitor::new(
            &t.ctx,
            MonitorSettings {
                poll_interval: Duration::from_secs(3600),
                window: 10,
            },
        );

        assert!(monitor.mount().await.is_mounted());
        assert!(eventually(|| !t.telemetry.errors().is_empty()).await);
        assert_eq!(t.telemetry.errors()[0].0, "monitor.poll");
        assert!(monitor.series().is_empty());
    }

    #[tokio::test]
    async fn test_zero_poll_interval_still_polls() {
        let mut gateway = MockRequestGateway::new();
        gateway.expect_request().returning(|_, _, _| {
            Ok(json!([{"id": "p1", "divergence": 0.523299, "recorded_at": "2010-08-21T12:00:00Z"}]))
        });
        let t = test_context(
            StaticTokens::signed_in(Identity::new("u-1", "Okabe")),
            Arc::new(gateway),
        );
        let monitor = WorldlineMonitor::new(
            &t.ctx,
            MonitorSettings {
                poll_interval: Duration::ZERO,
                window: 10,
            },
        );

        assert!(monitor.mount().await.is_mounted());
        assert!(eventually(|| monitor.series().len() == 1).await);
        assert!(lock(&monitor.poller)
            .as_ref()
            .is_some_and(|poller| !poller.is_finished()));
    }
}
