//! Generic live CRUD page.
//!
//! One controller drives every entity screen: gate on mount, hydrate over
//! REST while the streaming connection comes up, fold streamed changes into
//! the collection, and reload after every CRUD call of its own.

use std::sync::{Arc, Mutex};

use serde::Serialize;
use worldline_domain::{AccessDecision, RecordId, SyncRecord};
use worldline_protocol::InboundEvent;

use super::context::{MountOutcome, PageContext};
use super::error::PageError;
use crate::application::access::{IdentityTracker, RouteGuard};
use crate::application::services::CollectionApi;
use crate::application::streaming::{lock, ConnectionStatus, LiveBinding, StreamingClient};
use crate::application::sync::{entity_title, CollectionSync, EditBuffer, TrackedCollection};
use crate::ports::outbound::{Notification, Notifier, TokenSource};

/// Static description of an entity page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageDefinition {
    /// Route the page is mounted at; remembered for the post-login redirect.
    pub route: &'static str,
    /// REST collection path.
    pub api_path: &'static str,
    /// Streaming channel path.
    pub channel: &'static str,
    pub required_roles: &'static [&'static str],
}

struct PageState<T> {
    collection: TrackedCollection<T>,
    edit: EditBuffer<T>,
    error: Option<PageError>,
    replay: ReplayLog,
}

/// Stream events seen while at least one reload is in flight.
///
/// A snapshot can be older than events applied while it was being fetched,
/// so each reload re-applies the events logged since it started.
#[derive(Default)]
struct ReplayLog {
    in_flight: usize,
    next_seq: u64,
    events: Vec<(u64, InboundEvent)>,
}

impl ReplayLog {
    /// Start a reload; returns the sequence number its replay starts at.
    fn begin(&mut self) -> u64 {
        self.in_flight += 1;
        self.next_seq
    }

    fn record(&mut self, event: &InboundEvent) {
        if self.in_flight == 0 {
            return;
        }
        self.events.push((self.next_seq, event.clone()));
        self.next_seq += 1;
    }

    /// Finish a reload started at `from`, returning the events to replay.
    fn finish(&mut self, from: u64) -> Vec<InboundEvent> {
        let pending = self
            .events
            .iter()
            .filter(|(seq, _)| *seq >= from)
            .map(|(_, event)| event.clone())
            .collect();
        self.in_flight = self.in_flight.saturating_sub(1);
        if self.in_flight == 0 {
            self.events.clear();
        }
        pending
    }
}

pub struct CollectionPage<T: SyncRecord> {
    definition: PageDefinition,
    tokens: Arc<dyn TokenSource>,
    notifier: Arc<dyn Notifier>,
    api: CollectionApi<T>,
    sync: Arc<CollectionSync<T>>,
    guard: RouteGuard,
    client: Arc<StreamingClient>,
    state: Arc<Mutex<PageState<T>>>,
    binding: Mutex<Option<LiveBinding>>,
    tracker: Mutex<IdentityTracker>,
}

impl<T: SyncRecord> CollectionPage<T> {
    pub fn new(definition: PageDefinition, ctx: &PageContext) -> Self {
        Self {
            definition,
            tokens: Arc::clone(&ctx.tokens),
            notifier: Arc::clone(&ctx.notifier),
            api: CollectionApi::new(Arc::clone(&ctx.gateway), definition.api_path),
            sync: Arc::new(CollectionSync::new(Arc::clone(&ctx.notifier))),
            guard: ctx.route_guard(definition.required_roles),
            client: ctx.streaming_client(definition.channel),
            state: Arc::new(Mutex::new(PageState {
                collection: TrackedCollection::new(),
                edit: EditBuffer::new(),
                error: None,
                replay: ReplayLog::default(),
            })),
            binding: Mutex::new(None),
            tracker: Mutex::new(IdentityTracker::default()),
        }
    }

    pub fn definition(&self) -> &PageDefinition {
        &self.definition
    }

    /// Gate, then hydrate and connect concurrently.
    pub async fn mount(&self) -> MountOutcome {
        self.release_binding();

        let identity = self.tokens.identity();
        lock(&self.tracker).observe(identity.as_ref());

        let decision = self.guard.check(identity.as_ref(), self.definition.route);
        if !decision.allowed {
            return MountOutcome::Denied(decision);
        }

        let sync = Arc::clone(&self.sync);
        let state = Arc::clone(&self.state);
        let tokens = Arc::clone(&self.tokens);
        let mut binding = LiveBinding::new(Arc::clone(&self.client));
        binding.hold(self.client.subscribe(move |event| {
            // Resolved per event so an account switch is seen immediately.
            let current = tokens.identity();
            let mut state = lock(&state);
            let PageState {
                collection,
                edit,
                replay,
                ..
            } = &mut *state;
            sync.apply_event(event, collection, edit, current.as_ref());
            // Ignored events are kept too: a delete that missed locally may
            // still apply to the snapshot.
            if event.kind.is_domain() {
                replay.record(event);
            }
        }));
        *lock(&self.binding) = Some(binding);

        tracing::debug!(route = self.definition.route, channel = self.definition.channel, "Mounting page");
        let (_, connected) = tokio::join!(self.reload(), self.client.connect(self.tokens.as_ref()));
        MountOutcome::Mounted { connected }
    }

    /// Unsubscribe, disconnect and drop any open edit.
    pub fn unmount(&self) {
        self.release_binding();
        lock(&self.state).edit.close();
    }

    pub fn is_mounted(&self) -> bool {
        lock(&self.binding).is_some()
    }

    /// Re-run the gate and reload when the identity's id or roles changed.
    ///
    /// Returns `None` when nothing relevant changed.
    pub async fn on_identity_changed(&self) -> Option<MountOutcome> {
        let identity = self.tokens.identity();
        if !lock(&self.tracker).observe(identity.as_ref()) {
            return None;
        }
        tracing::info!(route = self.definition.route, "Identity changed, remounting");
        self.unmount();
        lock(&self.state).collection = TrackedCollection::new();
        Some(self.mount().await)
    }

    /// Replace the collection with the server's snapshot, then re-apply the
    /// stream events that arrived while it was being fetched.
    pub async fn reload(&self) -> Result<(), PageError> {
        let from = lock(&self.state).replay.begin();
        let result = self.api.list().await;

        let mut state = lock(&self.state);
        let pending = state.replay.finish(from);
        match result {
            Ok(records) => {
                state.collection.replace_all(records);
                for event in &pending {
                    self.sync.replay_event(event, &mut state.collection);
                }
                state.error = None;
                Ok(())
            }
            Err(source) => {
                drop(state);
                Err(self.fail(PageError::Load {
                    entity: T::ENTITY,
                    source,
                }))
            }
        }
    }

    pub async fn create<B: Serialize + Sync>(&self, draft: &B) -> Result<(), PageError> {
        if let Err(source) = self.api.create(draft).await {
            return Err(self.fail(PageError::Create {
                entity: T::ENTITY,
                source,
            }));
        }
        self.notifier
            .notify(Notification::success(format!("{} created", entity_title::<T>())));
        self.reload().await
    }

    pub async fn update(&self, record: &T) -> Result<(), PageError> {
        if let Err(source) = self.api.update(record).await {
            return Err(self.fail(PageError::Update {
                entity: T::ENTITY,
                source,
            }));
        }
        {
            let mut state = lock(&self.state);
            if state.edit.is_editing(record.record_id()) {
                state.edit.close();
            }
        }
        self.notifier
            .notify(Notification::success(format!("{} updated", entity_title::<T>())));
        self.reload().await
    }

    pub async fn delete(&self, id: &RecordId) -> Result<(), PageError> {
        if let Err(source) = self.api.delete(id).await {
            return Err(self.fail(PageError::Delete {
                entity: T::ENTITY,
                source,
            }));
        }
        {
            let mut state = lock(&self.state);
            if state.edit.is_editing(id) {
                state.edit.close();
            }
        }
        self.notifier
            .notify(Notification::success(format!("{} deleted", entity_title::<T>())));
        self.reload().await
    }

    /// Open the edit form on a copy of the record.
    pub fn begin_edit(&self, id: &RecordId) -> Option<T> {
        let mut state = lock(&self.state);
        let record = state.collection.get(id)?.clone();
        state.edit.open(record.clone());
        Some(record)
    }

    /// Apply local changes to the open edit copy.
    pub fn edit_with(&self, change: impl FnOnce(&mut T)) -> bool {
        match lock(&self.state).edit.current_mut() {
            Some(record) => {
                change(record);
                true
            }
            None => false,
        }
    }

    pub fn cancel_edit(&self) {
        lock(&self.state).edit.close();
    }

    pub fn editing(&self) -> Option<T> {
        lock(&self.state).edit.current().cloned()
    }

    /// Submit the edit copy.
    pub async fn save_edit(&self) -> Result<(), PageError> {
        let record = self.editing().ok_or(PageError::NothingToSave { entity: T::ENTITY })?;
        self.update(&record).await
    }

    pub fn records(&self) -> Vec<T> {
        lock(&self.state).collection.iter().cloned().collect()
    }

    pub fn error(&self) -> Option<PageError> {
        lock(&self.state).error.clone()
    }

    pub fn status(&self) -> ConnectionStatus {
        self.client.status()
    }

    pub fn client(&self) -> &Arc<StreamingClient> {
        &self.client
    }

    /// Gate decision for the current identity without side effects.
    pub fn access(&self) -> AccessDecision {
        worldline_domain::decide(self.tokens.identity().as_ref(), self.definition.required_roles)
    }

    fn fail(&self, error: PageError) -> PageError {
        tracing::warn!(route = self.definition.route, error = %error, "Page operation failed");
        self.notifier.notify(Notification::error(error.user_message()));
        lock(&self.state).error = Some(error.clone());
        error
    }

    fn release_binding(&self) {
        let binding = lock(&self.binding).take();
        if let Some(mut binding) = binding {
            binding.release();
        }
    }
}

impl<T: SyncRecord> Drop for CollectionPage<T> {
    fn drop(&mut self) {
        self.release_binding();
    }
}
