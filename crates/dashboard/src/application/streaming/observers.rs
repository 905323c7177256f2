//! Observer registries with per-observer unsubscription.
//!
//! Push-based: observers are invoked synchronously, in registration order,
//! for every emitted value. Emission works on a snapshot of the registry so an
//! observer may unsubscribe itself (or others) from inside its callback.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

type Observer<E> = Arc<dyn Fn(&E) + Send + Sync + 'static>;

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub struct ObserverRegistry<E> {
    next_id: AtomicU64,
    observers: Mutex<Vec<(u64, Observer<E>)>>,
}

impl<E: 'static> ObserverRegistry<E> {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            next_id: AtomicU64::new(1),
            observers: Mutex::new(Vec::new()),
        })
    }

    pub fn register(
        self: &Arc<Self>,
        observer: impl Fn(&E) + Send + Sync + 'static,
    ) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        lock(&self.observers).push((id, Arc::new(observer)));
        let registry: Arc<dyn Unregister> = self.clone();
        Subscription {
            id,
            registry: Arc::downgrade(&registry),
        }
    }

    /// Invoke every observer with `value`.
    pub fn emit(&self, value: &E) {
        let snapshot: Vec<Observer<E>> = lock(&self.observers)
            .iter()
            .map(|(_, observer)| Arc::clone(observer))
            .collect();
        for observer in snapshot {
            observer(value);
        }
    }

    pub fn len(&self) -> usize {
        lock(&self.observers).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        lock(&self.observers).clear();
    }
}

trait Unregister: Send + Sync {
    fn unregister(&self, id: u64);
}

impl<E: 'static> Unregister for ObserverRegistry<E> {
    fn unregister(&self, id: u64) {
        lock(&self.observers).retain(|(observer_id, _)| *observer_id != id);
    }
}

/// Handle returned by every `subscribe`; removes exactly one observer.
///
/// Dropping the handle does NOT unsubscribe. Call `unsubscribe()` explicitly
/// (page teardown does this for every handle it holds).
#[must_use = "keep the subscription to be able to unsubscribe"]
pub struct Subscription {
    id: u64,
    registry: Weak<dyn Unregister>,
}

impl Subscription {
    /// Idempotent; a no-op once the registry is gone.
    pub fn unsubscribe(&self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.unregister(self.id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;

    #[test]
    fn test_emit_reaches_observers_in_order() {
        let registry = ObserverRegistry::<u32>::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let seen_a = Arc::clone(&seen);
        let _a = registry.register(move |v| lock(&seen_a).push(("a", *v)));
        let seen_b = Arc::clone(&seen);
        let _b = registry.register(move |v| lock(&seen_b).push(("b", *v)));

        registry.emit(&1);
        registry.emit(&2);

        assert_eq!(*lock(&seen), vec![("a", 1), ("b", 1), ("a", 2), ("b", 2)]);
    }

    #[test]
    fn test_unsubscribe_removes_only_that_observer() {
        let registry = ObserverRegistry::<u32>::new();
        let first = Arc::new(AtomicU32::new(0));
        let second = Arc::new(AtomicU32::new(0));

        let first_clone = Arc::clone(&first);
        let sub = registry.register(move |_| {
            first_clone.fetch_add(1, Ordering::SeqCst);
        });
        let second_clone = Arc::clone(&second);
        let _keep = registry.register(move |_| {
            second_clone.fetch_add(1, Ordering::SeqCst);
        });

        registry.emit(&0);
        sub.unsubscribe();
        sub.unsubscribe();
        registry.emit(&0);

        assert_eq!(first.load(Ordering::SeqCst), 1);
        assert_eq!(second.load(Ordering::SeqCst), 2);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_observer_may_unsubscribe_during_emit() {
        let registry = ObserverRegistry::<u32>::new();
        let slot: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));
        let count = Arc::new(AtomicU32::new(0));

        let slot_clone = Arc::clone(&slot);
        let count_clone = Arc::clone(&count);
        let sub = registry.register(move |_| {
            count_clone.fetch_add(1, Ordering::SeqCst);
            if let Some(sub) = lock(&slot_clone).as_ref() {
                sub.unsubscribe();
            }
        });
        *lock(&slot) = Some(sub);

        registry.emit(&0);
        registry.emit(&0);

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_unsubscribe_after_registry_dropped_is_harmless() {
        let registry = ObserverRegistry::<u32>::new();
        let sub = registry.register(|_| {});
        drop(registry);
        sub.unsubscribe();
    }
}
