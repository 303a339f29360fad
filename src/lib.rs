//! An observable cookie store.
//!
//! [`CookieStore`](cookies::CookieStore) keeps a `name → value` mapping in sync with a
//! flat `"name=value; name=value"` string owned by a host, and dispatches a `"change"`
//! event for every local write and for every difference found when the host string
//! is imported again. [`CookieObserver`](observer::CookieObserver) polls hosts that
//! cannot report external writes themselves and relays all events to one callback.

pub mod config;
pub mod cookies;
pub mod errors;
pub mod observer;

pub use config::{CookieStoreConfig, ObserverConfig};
pub use cookies::{ChangeSet, CookieChangeEvent, CookieItem, CookieStore, DocumentCookie};
pub use errors::CookieError;
pub use observer::CookieObserver;
