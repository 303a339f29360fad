//! Cookies: [`CookieStore`], its flat string representation and change events.

mod cookies;
mod diff;
mod event;
mod flat;
mod host;
mod listeners;
mod store;

pub use cookies::{CookieItem, CookieMapping, DeletedCookie};

pub use diff::diff;
pub use event::{ChangeSet, CookieChangeEvent, EventType};
pub use flat::{parse, serialize, SEPARATOR};

pub use host::{CookieHost, DocumentCookie};
pub use listeners::{Listener, ListenerId};

pub use store::{CookieSource, CookieStore, Subscription};
