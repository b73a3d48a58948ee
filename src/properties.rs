use std::sync::Arc;

use tokio::sync::watch;

/// Observable value backed by a `watch` channel.
///
/// Reads and subscriptions are public; writes are crate-internal so that
/// poll-computed properties cannot be overwritten from outside. Observers are
/// only notified when the value actually changes.
pub struct Property<T> {
    tx: Arc<watch::Sender<T>>,
}

impl<T> Clone for Property<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<T: Clone + PartialEq> Property<T> {
    pub(crate) fn new(initial: T) -> Self {
        let (tx, _) = watch::channel(initial);
        Self { tx: Arc::new(tx) }
    }

    /// Current value.
    pub fn get(&self) -> T {
        self.tx.borrow().clone()
    }

    /// Watch for changes. The receiver sees the current value immediately.
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.tx.subscribe()
    }

    /// Record a new value, notifying observers only if it differs.
    pub(crate) fn set(&self, value: T) -> bool {
        self.tx.send_if_modified(|current| {
            if *current != value {
                *current = value;
                true
            } else {
                false
            }
        })
    }
}

impl<T: Clone + PartialEq + std::fmt::Debug> std::fmt::Debug for Property<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Property").field(&*self.tx.borrow()).finish()
    }
}
