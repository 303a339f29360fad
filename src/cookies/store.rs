//! The observable cookie store.
//!
//! A [`CookieStore`] owns the canonical [`CookieMapping`] and keeps it in sync with a
//! flat cookie string:
//!
//! - In **standalone** mode the string is only read once at construction.
//! - In **bridged** mode the store holds a [`CookieHost`]. Every local mutation is
//!   exported to the host right away, and [`import`](CookieStore::import) pulls in
//!   writes that other parties made to the host.
//!
//! Local writes and imports both end up in the same dispatch path, which calls every
//! registered listener with the same [`CookieChangeEvent`] and then publishes it on a
//! broadcast bus for async subscribers.
//!
//! # Concurrency
//! The mapping is mutated and exported under one lock, so an import never sees a
//! mapping that differs from what the host holds for a local write. Such writes are
//! therefore not reported a second time by the next import.
//!
//! Events are queued while the mapping is still locked and delivered from that queue
//! in FIFO order, by one caller at a time. Listeners therefore see events in mutation
//! order even when several threads write concurrently. Listeners run without any lock
//! held and may call back into the store; an event caused from inside a listener is
//! delivered after the current one.
//!
//! ```rust
//! use std::sync::Arc;
//! use gosub_cookie_store::cookies::{CookieStore, DocumentCookie};
//!
//! # futures::executor::block_on(async {
//! let document = DocumentCookie::new("foo=bar");
//! let store = CookieStore::bridged(Arc::new(document.clone()));
//!
//! store.set("hello", "world").await.unwrap();
//! assert_eq!(document.read(), "foo=bar; hello=world");
//! # });
//! ```

use crate::config::CookieStoreConfig;
use crate::cookies::diff::diff;
use crate::cookies::flat::{parse, serialize};
use crate::cookies::listeners::{Listener, ListenerId, ListenerRegistry};
use crate::cookies::{ChangeSet, CookieChangeEvent, CookieHost, CookieItem, CookieMapping, EventType};
use crate::errors::CookieError;
use std::collections::VecDeque;
use std::fmt::Debug;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

/// A handle for receiving cookie change notifications.
pub type Subscription = broadcast::Receiver<CookieChangeEvent>;

#[derive(Debug)]
struct CookieBus {
    tx: broadcast::Sender<CookieChangeEvent>,
}

impl CookieBus {
    fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    fn subscribe(&self) -> Subscription {
        self.tx.subscribe()
    }

    fn publish(&self, ev: CookieChangeEvent) {
        // send() only fails when there are no receivers, which is fine.
        let _ = self.tx.send(ev);
    }
}

/// Where a store gets its initial cookies from.
pub enum CookieSource {
    /// A literal flat string. The store is standalone and never synchronizes.
    Literal(String),
    /// A host whose string is mirrored in both directions.
    Host(Arc<dyn CookieHost>),
}

impl From<&str> for CookieSource {
    fn from(flat: &str) -> Self {
        CookieSource::Literal(flat.to_string())
    }
}

impl From<Arc<dyn CookieHost>> for CookieSource {
    fn from(host: Arc<dyn CookieHost>) -> Self {
        CookieSource::Host(host)
    }
}

pub struct CookieStore {
    /// Canonical state
    cookies: Mutex<CookieMapping>,
    /// Host the state is mirrored to, `None` for standalone stores
    host: Option<Arc<dyn CookieHost>>,
    listeners: Mutex<ListenerRegistry>,
    /// Events waiting for delivery, in mutation order
    pending: Mutex<VecDeque<CookieChangeEvent>>,
    /// Set while some caller is delivering `pending`
    dispatching: AtomicBool,
    bus: CookieBus,
}

impl Debug for CookieStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CookieStore")
            .field("cookies", &*lock(&self.cookies))
            .field("bridged", &self.host.is_some())
            .finish_non_exhaustive()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl CookieStore {
    pub fn new(source: impl Into<CookieSource>) -> Self {
        Self::with_config(source, CookieStoreConfig::default())
    }

    /// Creates a store from a literal flat string without any host.
    pub fn standalone(flat: &str) -> Self {
        Self::new(CookieSource::Literal(flat.to_string()))
    }

    /// Creates a store mirroring `host`. The host's current string seeds the mapping;
    /// no events are dispatched for it.
    pub fn bridged(host: Arc<dyn CookieHost>) -> Self {
        Self::new(CookieSource::Host(host))
    }

    pub fn with_config(source: impl Into<CookieSource>, config: CookieStoreConfig) -> Self {
        let (cookies, host) = match source.into() {
            CookieSource::Literal(flat) => (parse(&flat), None),
            CookieSource::Host(host) => (parse(&host.cookie()), Some(host)),
        };

        log::debug!(
            "CookieStore: created with {} cookie(s) ({})",
            cookies.len(),
            if host.is_some() { "bridged" } else { "standalone" }
        );

        Self {
            cookies: Mutex::new(cookies),
            host,
            listeners: Mutex::new(ListenerRegistry::new()),
            pending: Mutex::new(VecDeque::new()),
            dispatching: AtomicBool::new(false),
            bus: CookieBus::new(config.channel_capacity),
        }
    }

    /// True when the store mirrors a host.
    pub fn is_bridged(&self) -> bool {
        self.host.is_some()
    }

    /// True when external writes to the host can only be detected by polling
    /// [`import`](Self::import).
    pub fn is_polyfill(&self) -> bool {
        self.host.as_ref().is_some_and(|h| !h.notifies_changes())
    }

    /// Returns the cookie called `name`, if any.
    pub async fn get(&self, name: &str) -> Option<CookieItem> {
        lock(&self.cookies)
            .get(name)
            .map(|value| CookieItem::new(name, value))
    }

    /// Returns every cookie in mapping order, or only the one called `name`.
    pub async fn get_all(&self, name: Option<&str>) -> Vec<CookieItem> {
        if let Some(name) = name {
            return self.get(name).await.into_iter().collect();
        }

        let cookies = lock(&self.cookies);
        cookies.items().to_vec()
    }

    /// Inserts or overwrites a cookie and dispatches one change event for it.
    pub async fn set(&self, name: &str, value: &str) -> Result<(), CookieError> {
        self.mutate(ChangeSet::changed(name, value), |cookies| {
            cookies.insert(name, value);
        })?;

        self.drain();
        Ok(())
    }

    /// Removes a cookie and dispatches one change event for it.
    ///
    /// The event is dispatched even when no cookie called `name` existed.
    pub async fn delete(&self, name: &str) -> Result<(), CookieError> {
        self.mutate(ChangeSet::deleted(name), |cookies| {
            if cookies.remove(name).is_none() {
                log::trace!("CookieStore: delete of absent cookie {:?}", name);
            }
        })?;

        self.drain();
        Ok(())
    }

    /// Re-reads the host string and reports what changed since the last import or local
    /// write.
    ///
    /// All differences of one import are dispatched as a single combined event. Nothing
    /// is dispatched when nothing changed. Standalone stores have nothing to import.
    pub fn import(&self) -> ChangeSet {
        self.import_unless_cancelled(&CancellationToken::new())
    }

    /// Like [`import`](Self::import), but leaves the mapping untouched once `cancel`
    /// is cancelled. The token is checked under the mapping lock.
    pub(crate) fn import_unless_cancelled(&self, cancel: &CancellationToken) -> ChangeSet {
        let Some(host) = &self.host else {
            return ChangeSet::default();
        };

        let changes = {
            let mut cookies = lock(&self.cookies);
            if cancel.is_cancelled() {
                return ChangeSet::default();
            }

            let next = parse(&host.cookie());
            let changes = diff(&cookies, &next);
            *cookies = next;

            if !changes.is_empty() {
                log::debug!(
                    "CookieStore: import found {} changed and {} deleted cookie(s)",
                    changes.changed.len(),
                    changes.deleted.len()
                );
                self.enqueue(changes.clone());
            }
            changes
        };

        self.drain();
        changes
    }

    /// Waits for any mutation or import currently holding the mapping lock to finish.
    pub(crate) fn settle(&self) {
        drop(lock(&self.cookies));
    }

    /// The current flat representation: the host string when bridged, the serialized
    /// mapping otherwise.
    pub fn flat(&self) -> String {
        match &self.host {
            Some(host) => host.cookie(),
            None => serialize(&lock(&self.cookies)),
        }
    }

    pub fn len(&self) -> usize {
        lock(&self.cookies).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.cookies).is_empty()
    }

    pub fn add_event_listener(&self, event_type: EventType, listener: Listener) -> ListenerId {
        lock(&self.listeners).add(event_type, listener)
    }

    pub fn remove_event_listener(&self, event_type: EventType, id: ListenerId) -> bool {
        lock(&self.listeners).remove(event_type, id)
    }

    /// Installs the single `onchange` handler, replacing the previous one. `None`
    /// removes it.
    pub fn set_onchange(&self, handler: Option<Listener>) {
        lock(&self.listeners).set_onchange(handler);
    }

    pub fn onchange(&self) -> Option<Listener> {
        lock(&self.listeners).onchange()
    }

    /// Subscribes to change events on the broadcast bus.
    pub fn subscribe(&self) -> Subscription {
        self.bus.subscribe()
    }

    /// Applies `f` to the mapping, exports the result and queues `changes`. When the
    /// host rejects the write the mapping is restored and nothing is queued.
    fn mutate(&self, changes: ChangeSet, f: impl FnOnce(&mut CookieMapping)) -> Result<(), CookieError> {
        let mut cookies = lock(&self.cookies);
        let previous = cookies.clone();

        f(&mut cookies);

        if let Some(host) = &self.host {
            if let Err(e) = host.set_cookie(&serialize(&cookies)) {
                log::warn!("CookieStore: export to host failed: {}", e);
                *cookies = previous;
                return Err(CookieError::Export(e));
            }
        }

        // Queued while the mapping is still locked, so queue order is mutation order
        self.enqueue(changes);
        Ok(())
    }

    fn enqueue(&self, changes: ChangeSet) {
        lock(&self.pending).push_back(CookieChangeEvent::new(changes));
    }

    /// Delivers queued events in FIFO order. Only one caller delivers at a time; a
    /// mutation made while another caller is delivering (including from inside a
    /// listener) is queued and delivered by that caller.
    fn drain(&self) {
        loop {
            if self
                .dispatching
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .is_err()
            {
                return;
            }

            {
                let _delivering = Delivering(&self.dispatching);
                loop {
                    let Some(event) = lock(&self.pending).pop_front() else {
                        break;
                    };
                    self.dispatch(event);
                }
            }

            // An event queued after the last pop but before the flag was cleared has no
            // one delivering it yet
            if lock(&self.pending).is_empty() {
                return;
            }
        }
    }

    fn dispatch(&self, event: CookieChangeEvent) {
        // Snapshot so listeners run without the registry lock held
        let listeners = lock(&self.listeners).snapshot(event.event_type());
        for listener in listeners {
            listener(&event);
        }

        self.bus.publish(event);
    }
}

/// Clears the delivering flag when dropped, also when a listener panics.
struct Delivering<'a>(&'a AtomicBool);

impl Drop for Delivering<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
