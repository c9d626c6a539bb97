use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("render session invalid: {0}")]
    SessionInvalid(String),

    #[error("render failure: {0}")]
    Render(String),

    #[error("timed out after {timeout_secs}s waiting for {what}")]
    WaitTimeout { what: String, timeout_secs: u64 },

    #[error("extraction failure for {context}: {reason}")]
    Extract { context: String, reason: String },

    #[error("site '{0}' cannot be crawled in this listing mode")]
    ListingUnsupported(String),

    #[error("store error: {0}")]
    Store(#[from] bbharv_store::StoreError),
}

impl EngineError {
    /// `true` for the failure class that makes the whole render session
    /// unusable, as opposed to a single page or item going wrong.
    #[must_use]
    pub fn is_session_invalid(&self) -> bool {
        matches!(self, EngineError::SessionInvalid(_))
    }
}
