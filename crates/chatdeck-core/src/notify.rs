#![forbid(unsafe_code)]

//! Observer lists for cross-component notifications.
//!
//! A [`Notifier`] is the typed replacement for dispatching custom events on
//! an element: components own one per notification kind and call
//! [`Notifier::emit`] after a state change. Listeners are plain closures
//! identified by a [`SubscriptionId`] so they can be detached on teardown.
//!
//! Everything here is single-threaded; listeners run synchronously in
//! subscription order.

use std::fmt;

/// Identifier returned by [`Notifier::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

type Listener<E> = Box<dyn FnMut(&E)>;

/// An ordered list of listeners for notifications of type `E`.
pub struct Notifier<E> {
    listeners: Vec<(SubscriptionId, Listener<E>)>,
    next_id: u64,
}

impl<E> Default for Notifier<E> {
    fn default() -> Self {
        Self {
            listeners: Vec::new(),
            next_id: 0,
        }
    }
}

impl<E> Notifier<E> {
    /// Create an empty notifier.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a listener. It receives every subsequent notification.
    pub fn subscribe(&mut self, listener: impl FnMut(&E) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Detach a listener. Returns `false` if the id was not attached.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    /// Detach every listener.
    pub fn clear(&mut self) {
        self.listeners.clear();
    }

    /// Deliver `event` to every listener in subscription order.
    pub fn emit(&mut self, event: &E) {
        for (_, listener) in &mut self.listeners {
            listener(event);
        }
    }

    /// Number of attached listeners.
    #[must_use]
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    /// Whether no listener is attached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl<E> fmt::Debug for Notifier<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
