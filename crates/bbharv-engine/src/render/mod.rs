//! Renderer capability consumed by the engine.
//!
//! The engine never talks to a browser directly: it depends on a session that
//! can load a URL, run a script in the page, and hand back a snapshot of the
//! rendered document. Element lookup and field extraction happen engine-side
//! over parsed snapshots (see [`crate::dom`]), which keeps every layer above
//! this trait testable against fixture documents.

pub mod chromium;

use std::time::Duration;

use async_trait::async_trait;
use scraper::Html;

use crate::error::EngineError;

/// Factory for render sessions. The orchestrator creates one session at
/// startup and a replacement when the live session becomes invalid.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// # Errors
    ///
    /// Returns an error when a browser session cannot be created at all;
    /// this is fatal to a run.
    async fn new_session(&self) -> Result<Box<dyn RenderSession>, EngineError>;
}

/// One live rendered-page session. Exactly one page is current at a time;
/// the session is owned by a single caller and never shared.
#[async_trait]
pub trait RenderSession: Send {
    async fn navigate(&mut self, url: &str) -> Result<(), EngineError>;

    /// Run a script in the page (used to trigger in-page transitions such as
    /// a JS-driven pagination click) and return its value.
    async fn run_script(&mut self, script: &str) -> Result<serde_json::Value, EngineError>;

    /// Snapshot of the current document's HTML.
    async fn document(&self) -> Result<String, EngineError>;

    /// Release underlying resources. Dropping without closing is permitted
    /// but may leave a browser process to be reaped by the OS.
    async fn close(&mut self) -> Result<(), EngineError> {
        Ok(())
    }
}

/// Polls the session's document until `pred` yields a value, bounded by
/// `timeout`. Every wait in the engine goes through here; there are no
/// unbounded waits.
///
/// # Errors
///
/// Returns [`EngineError::WaitTimeout`] when the deadline passes, or any
/// error from reading the document.
pub async fn wait_for<T, F>(
    session: &dyn RenderSession,
    what: &str,
    timeout: Duration,
    mut pred: F,
) -> Result<T, EngineError>
where
    F: FnMut(&Html) -> Option<T>,
{
    let deadline = tokio::time::Instant::now() + timeout;
    let poll = poll_interval(timeout);

    loop {
        let html = session.document().await?;
        let found = {
            let doc = Html::parse_document(&html);
            pred(&doc)
        };
        if let Some(value) = found {
            return Ok(value);
        }
        if tokio::time::Instant::now() >= deadline {
            return Err(EngineError::WaitTimeout {
                what: what.to_string(),
                timeout_secs: timeout.as_secs(),
            });
        }
        tokio::time::sleep(poll).await;
    }
}

/// Convenience wait for the presence of one element.
///
/// # Errors
///
/// See [`wait_for`].
pub async fn wait_for_selector(
    session: &dyn RenderSession,
    selector: &str,
    timeout: Duration,
) -> Result<(), EngineError> {
    let parsed = crate::dom::selector(selector);
    wait_for(session, selector, timeout, |doc| {
        doc.select(&parsed).next().map(|_| ())
    })
    .await
}

fn poll_interval(timeout: Duration) -> Duration {
    (timeout / 10).clamp(Duration::from_millis(10), Duration::from_millis(250))
}
