use std::time::Duration;

/// Capacity of the broadcast bus that carries change events to subscribers.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// How often a polyfilled store is re-imported from its host.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Store configuration
#[derive(Debug, Clone)]
pub struct CookieStoreConfig {
    /// Number of change events a lagging subscriber may fall behind before it misses events
    pub channel_capacity: usize,
}

impl Default for CookieStoreConfig {
    fn default() -> Self {
        Self {
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

/// Observer configuration. The poll interval is also the worst-case latency before an
/// external change to the host string is reported.
#[derive(Debug, Clone)]
pub struct ObserverConfig {
    /// Time between two imports of a polyfilled store
    pub poll_interval: Duration,
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}
