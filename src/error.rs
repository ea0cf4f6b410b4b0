use thiserror::Error;

/// Crate-wide error taxonomy.
///
/// `Validation` aborts an operation before any write. `Persistence` wraps the
/// embedded store. `Notification` exists for callers that need to surface a
/// notifier failure — the scheduler itself never lets one escape (see
/// `notify::ReminderOutcome`). `Recommendation` covers the hosted-model call
/// end to end: transport, status, and parse failures alike.
#[derive(Debug, Error)]
pub enum Error {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("store operation failed: {0}")]
    Persistence(#[from] rusqlite::Error),

    #[error("notification failed: {0}")]
    Notification(String),

    #[error("recommendation failed: {0}")]
    Recommendation(String),

    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn recommendation(msg: impl Into<String>) -> Self {
        Self::Recommendation(msg.into())
    }
}
