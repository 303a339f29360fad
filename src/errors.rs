#[derive(Debug, thiserror::Error)]
pub enum CookieError {
    #[error("Failed to export cookies to host: {0}")]
    Export(#[source] anyhow::Error),

    #[error("No tokio runtime available to drive the poll task")]
    NoRuntime,

    #[error("Unknown event type: {0}")]
    UnknownEventType(String),
}
