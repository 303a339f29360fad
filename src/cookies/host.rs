//! Hosts own the flat cookie string a bridged store mirrors.
//!
//! A host is a capability, not something the store owns: other parties (another
//! store, a script, a test) may rewrite the string at any time. Such writes only
//! become visible as events once the store imports again.

use anyhow::Result;
use std::sync::{Arc, PoisonError, RwLock};

/// An object exposing one mutable flat cookie string.
pub trait CookieHost: Send + Sync {
    /// Returns the current flat string.
    fn cookie(&self) -> String;

    /// Replaces the flat string.
    fn set_cookie(&self, value: &str) -> Result<()>;

    /// True when the host reports external writes to the store itself (by calling
    /// [`CookieStore::import`](crate::cookies::CookieStore::import)), so nobody needs
    /// to poll it.
    fn notifies_changes(&self) -> bool {
        false
    }
}

/// In-memory host modeled after a document's `cookie` property. Clones share the same
/// string.
#[derive(Clone, Debug, Default)]
pub struct DocumentCookie {
    cookie: Arc<RwLock<String>>,
}

impl DocumentCookie {
    pub fn new(initial: impl Into<String>) -> Self {
        Self {
            cookie: Arc::new(RwLock::new(initial.into())),
        }
    }

    /// Overwrites the string directly, bypassing any store.
    pub fn write(&self, value: impl Into<String>) {
        *self.cookie.write().unwrap_or_else(PoisonError::into_inner) = value.into();
    }

    pub fn read(&self) -> String {
        self.cookie
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl CookieHost for DocumentCookie {
    fn cookie(&self) -> String {
        self.read()
    }

    fn set_cookie(&self, value: &str) -> Result<()> {
        self.write(value);
        Ok(())
    }
}
