//! Relays the change events of one store to a single callback.
//!
//! A polyfilled store (bridged to a host that does not report external writes) gets a
//! poll task that re-imports the host string every
//! [`poll_interval`](crate::config::ObserverConfig::poll_interval). External writes
//! therefore reach the callback with a delay of at most one interval. Other stores
//! already dispatch an event for every change; for those the observer only forwards
//! events after which the flat string differs from the one it saw last.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use gosub_cookie_store::cookies::{CookieStore, DocumentCookie};
//! use gosub_cookie_store::observer::CookieObserver;
//!
//! # async fn run() -> Result<(), gosub_cookie_store::errors::CookieError> {
//! let document = DocumentCookie::default();
//! let store = Arc::new(CookieStore::bridged(Arc::new(document.clone())));
//!
//! let mut observer = CookieObserver::new(|changes| println!("cookies changed: {:?}", changes));
//! observer.observe(&store)?;
//!
//! document.write("foo=bar"); // reported on the next poll tick
//! # Ok(())
//! # }
//! ```

use crate::config::ObserverConfig;
use crate::cookies::{ChangeSet, CookieChangeEvent, CookieStore, EventType, Listener, ListenerId};
use crate::errors::CookieError;
use std::fmt::Debug;
use std::sync::{Arc, Mutex, PoisonError, Weak};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Callback invoked with the change-set of every forwarded event.
pub type ObserverCallback = Arc<dyn Fn(&ChangeSet) + Send + Sync>;

/// The store currently observed and everything needed to stop observing it.
struct Observation {
    store: Weak<CookieStore>,
    listener: ListenerId,
    cancel: CancellationToken,
    poll_task: Option<JoinHandle<()>>,
}

pub struct CookieObserver {
    callback: ObserverCallback,
    config: ObserverConfig,
    observation: Option<Observation>,
}

impl Debug for CookieObserver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CookieObserver")
            .field("config", &self.config)
            .field("observing", &self.is_observing())
            .finish_non_exhaustive()
    }
}

impl CookieObserver {
    pub fn new(callback: impl Fn(&ChangeSet) + Send + Sync + 'static) -> Self {
        Self::with_config(callback, ObserverConfig::default())
    }

    pub fn with_config(callback: impl Fn(&ChangeSet) + Send + Sync + 'static, config: ObserverConfig) -> Self {
        Self {
            callback: Arc::new(callback),
            config,
            observation: None,
        }
    }

    pub fn is_observing(&self) -> bool {
        self.observation.is_some()
    }

    /// Starts observing `store`, replacing any previous observation.
    ///
    /// Polyfilled stores need a tokio runtime for the poll task; without one
    /// [`CookieError::NoRuntime`] is returned and nothing is observed.
    pub fn observe(&mut self, store: &Arc<CookieStore>) -> Result<(), CookieError> {
        self.unobserve();

        let polling = store.is_polyfill();
        let runtime = if polling {
            Some(Handle::try_current().map_err(|_| CookieError::NoRuntime)?)
        } else {
            None
        };

        let cancel = CancellationToken::new();
        let listener = if polling {
            self.forwarding_listener(cancel.clone())
        } else {
            self.deduplicating_listener(store, cancel.clone())
        };
        let listener = store.add_event_listener(EventType::Change, listener);

        let poll_task = runtime.map(|runtime| {
            let period = self.config.poll_interval;
            let start = Instant::now() + period;
            let weak = Arc::downgrade(store);
            let token = cancel.clone();

            runtime.spawn(async move {
                let mut ticker = tokio::time::interval_at(start, period);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

                loop {
                    tokio::select! {
                        biased;
                        _ = token.cancelled() => break,
                        _ = ticker.tick() => {
                            let Some(store) = weak.upgrade() else {
                                log::debug!("CookieObserver: store dropped, stopping poll task");
                                break;
                            };
                            store.import_unless_cancelled(&token);
                        }
                    }
                }
            })
        });

        log::debug!(
            "CookieObserver: observing store ({})",
            if polling { "polling" } else { "native notifications" }
        );

        self.observation = Some(Observation {
            store: Arc::downgrade(store),
            listener,
            cancel,
            poll_task,
        });

        Ok(())
    }

    /// Stops observing. Calling it while not observing does nothing.
    ///
    /// After this returns no poll tick changes the store and nothing reaches the
    /// callback. A tick already importing on another worker thread is waited for; ticks
    /// that have not taken the store's mapping lock yet see the cancelled token and
    /// leave the mapping alone.
    pub fn unobserve(&mut self) {
        let Some(observation) = self.observation.take() else {
            return;
        };

        observation.cancel.cancel();
        if let Some(task) = observation.poll_task {
            task.abort();
        }
        if let Some(store) = observation.store.upgrade() {
            store.settle();
            store.remove_event_listener(EventType::Change, observation.listener);
        }

        log::debug!("CookieObserver: stopped observing");
    }

    /// Forwards every event of a polled store.
    fn forwarding_listener(&self, cancel: CancellationToken) -> Listener {
        let callback = self.callback.clone();
        Arc::new(move |ev: &CookieChangeEvent| {
            if !cancel.is_cancelled() {
                callback(ev.detail());
            }
        })
    }

    /// Forwards an event only when the store's flat string moved away from the last
    /// value seen, which filters out redundant notifications.
    fn deduplicating_listener(&self, store: &Arc<CookieStore>, cancel: CancellationToken) -> Listener {
        let callback = self.callback.clone();
        let weak = Arc::downgrade(store);
        let last_seen = Mutex::new(store.flat());

        Arc::new(move |ev: &CookieChangeEvent| {
            if cancel.is_cancelled() {
                return;
            }
            let Some(store) = weak.upgrade() else {
                return;
            };

            let current = store.flat();
            {
                let mut last = last_seen.lock().unwrap_or_else(PoisonError::into_inner);
                if *last == current {
                    log::trace!("CookieObserver: skipping redundant change event");
                    return;
                }
                *last = current;
            }

            callback(ev.detail());
        })
    }
}

impl Drop for CookieObserver {
    fn drop(&mut self) {
        self.unobserve();
    }
}
