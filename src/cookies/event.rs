use crate::cookies::{CookieItem, DeletedCookie};
use crate::errors::CookieError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Event types a cookie store dispatches. Only `"change"` exists.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum EventType {
    Change,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Change => "change",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = CookieError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "change" => Ok(EventType::Change),
            other => Err(CookieError::UnknownEventType(other.to_string())),
        }
    }
}

/// Payload of a change notification: what was added or modified and what was removed.
///
/// A name never shows up in both lists.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChangeSet {
    pub changed: Vec<CookieItem>,
    pub deleted: Vec<DeletedCookie>,
}

impl ChangeSet {
    /// A change-set with a single added or modified cookie.
    pub fn changed(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            changed: vec![CookieItem::new(name, value)],
            deleted: Vec::new(),
        }
    }

    /// A change-set with a single removed cookie.
    pub fn deleted(name: impl Into<String>) -> Self {
        Self {
            changed: Vec::new(),
            deleted: vec![DeletedCookie::new(name)],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.changed.is_empty() && self.deleted.is_empty()
    }
}

/// A `"change"` event as dispatched to listeners and subscribers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CookieChangeEvent {
    event_type: EventType,
    detail: ChangeSet,
}

impl CookieChangeEvent {
    pub fn new(detail: ChangeSet) -> Self {
        Self {
            event_type: EventType::Change,
            detail,
        }
    }

    pub fn event_type(&self) -> EventType {
        self.event_type
    }

    pub fn detail(&self) -> &ChangeSet {
        &self.detail
    }

    pub fn into_detail(self) -> ChangeSet {
        self.detail
    }
}
