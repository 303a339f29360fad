//! Listener registry for `"change"` events.
//!
//! A store carries any number of listeners added with
//! [`add`](ListenerRegistry::add) plus one property-style `onchange` slot. The slot is
//! stored in the same list as the other listeners, so all of them are called in
//! registration order. Replacing the slot removes the previous handler first.

use crate::cookies::{CookieChangeEvent, EventType};
use std::fmt::Debug;
use std::sync::Arc;
use uuid::Uuid;

/// A change listener. Every listener receives a reference to the same event instance.
pub type Listener = Arc<dyn Fn(&CookieChangeEvent) + Send + Sync>;

/// Identifies a registered listener so it can be removed again.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(Uuid);

impl ListenerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ListenerId {
    fn default() -> Self {
        Self::new()
    }
}

struct Registration {
    id: ListenerId,
    event_type: EventType,
    listener: Listener,
}

#[derive(Default)]
pub struct ListenerRegistry {
    entries: Vec<Registration>,
    /// Id of the registration installed through the `onchange` slot
    onchange: Option<ListenerId>,
}

impl Debug for ListenerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("listeners", &self.entries.len())
            .field("onchange", &self.onchange)
            .finish()
    }
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `listener`. Adding the same listener (same `Arc`) twice for the same
    /// event type returns the existing id and does not register it again.
    pub fn add(&mut self, event_type: EventType, listener: Listener) -> ListenerId {
        if let Some(existing) = self.entries.iter().find(|r| {
            r.event_type == event_type
                && Some(r.id) != self.onchange
                && Arc::ptr_eq(&r.listener, &listener)
        }) {
            return existing.id;
        }

        self.push(event_type, listener)
    }

    /// Removes a listener. Returns false when the id was not registered.
    pub fn remove(&mut self, event_type: EventType, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries
            .retain(|r| !(r.id == id && r.event_type == event_type));

        if self.onchange == Some(id) {
            self.onchange = None;
        }

        self.entries.len() != before
    }

    /// Installs or clears the `onchange` slot.
    pub fn set_onchange(&mut self, handler: Option<Listener>) {
        if let Some(previous) = self.onchange.take() {
            self.entries.retain(|r| r.id != previous);
        }

        if let Some(handler) = handler {
            let id = self.push(EventType::Change, handler);
            self.onchange = Some(id);
        }
    }

    pub fn onchange(&self) -> Option<Listener> {
        let id = self.onchange?;
        self.entries
            .iter()
            .find(|r| r.id == id)
            .map(|r| r.listener.clone())
    }

    /// Listeners for `event_type` in registration order.
    pub fn snapshot(&self, event_type: EventType) -> Vec<Listener> {
        self.entries
            .iter()
            .filter(|r| r.event_type == event_type)
            .map(|r| r.listener.clone())
            .collect()
    }

    fn push(&mut self, event_type: EventType, listener: Listener) -> ListenerId {
        let id = ListenerId::new();
        self.entries.push(Registration {
            id,
            event_type,
            listener,
        });
        id
    }
}

#[cfg(test)]
impl ListenerRegistry {
    fn len(&self) -> usize {
        self.entries.len()
    }

    fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
