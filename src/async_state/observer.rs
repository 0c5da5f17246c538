//! Explicit observer registration.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

type Observer<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Registry<T> {
    next_id: u64,
    observers: BTreeMap<u64, Observer<T>>,
}

/// A set of observers notified synchronously with every new value.
///
/// Observers are called in registration order, outside of the registry lock,
/// so an observer may subscribe or unsubscribe re-entrantly.
pub(crate) struct ObserverSet<T> {
    registry: Arc<Mutex<Registry<T>>>,
}

impl<T: 'static> ObserverSet<T> {
    pub(crate) fn new() -> Self {
        Self {
            registry: Arc::new(Mutex::new(Registry {
                next_id: 0,
                observers: BTreeMap::new(),
            })),
        }
    }

    pub(crate) fn subscribe<F>(&self, observer: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = {
            let mut registry = self.registry.lock();
            let id = registry.next_id;
            registry.next_id += 1;
            registry.observers.insert(id, Arc::new(observer));
            id
        };
        let registry: Weak<Mutex<Registry<T>>> = Arc::downgrade(&self.registry);
        Subscription {
            unsubscribe: Some(Box::new(move || {
                if let Some(registry) = registry.upgrade() {
                    registry.lock().observers.remove(&id);
                }
            })),
        }
    }

    pub(crate) fn notify(&self, value: &T) {
        let observers: Vec<Observer<T>> = self.registry.lock().observers.values().cloned().collect();
        for observer in observers {
            observer(value);
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.registry.lock().observers.len()
    }
}

/// Handle of a registered observer.
///
/// Dropping the subscription unregisters the observer. Use
/// [`Subscription::detach`] to keep it registered for the lifetime of the
/// observed object instead.
#[must_use = "dropping a Subscription unregisters its observer immediately"]
pub struct Subscription {
    unsubscribe: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    /// Unregisters the observer now.
    pub fn unsubscribe(mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
    }

    /// Keeps the observer registered until the observed object is dropped.
    pub fn detach(mut self) {
        self.unsubscribe = None;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Subscription")
            .field("active", &self.unsubscribe.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn observers_receive_values_in_registration_order() {
        let set = ObserverSet::<i32>::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        let first = {
            let log = Arc::clone(&log);
            set.subscribe(move |value| log.lock().push(("first", *value)))
        };
        let second = {
            let log = Arc::clone(&log);
            set.subscribe(move |value| log.lock().push(("second", *value)))
        };

        set.notify(&1);

        assert_eq!(*log.lock(), vec![("first", 1), ("second", 1)]);
        drop((first, second));
    }

    #[rstest]
    fn dropping_the_subscription_unregisters() {
        let set = ObserverSet::<i32>::new();
        let subscription = set.subscribe(|_| {});
        assert_eq!(set.len(), 1);

        drop(subscription);

        assert_eq!(set.len(), 0);
    }

    #[rstest]
    fn detached_subscription_stays_registered() {
        let set = ObserverSet::<i32>::new();
        set.subscribe(|_| {}).detach();

        assert_eq!(set.len(), 1);
    }

    #[rstest]
    fn unsubscribe_after_set_is_gone_is_harmless() {
        let set = ObserverSet::<i32>::new();
        let subscription = set.subscribe(|_| {});

        drop(set);
        subscription.unsubscribe();
    }
}
