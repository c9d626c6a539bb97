//! Chromium-backed implementation of the render capability.
//!
//! Drives an external Chromium process over CDP via `chromiumoxide`. This is
//! deliberately a thin adapter: page understanding happens engine-side over
//! document snapshots, so nothing above this module knows about CDP.

use std::path::PathBuf;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;

use crate::error::EngineError;
use crate::render::{RenderSession, Renderer};

/// Launches one Chromium process per session.
pub struct ChromiumRenderer {
    headless: bool,
    executable: Option<PathBuf>,
}

impl ChromiumRenderer {
    #[must_use]
    pub fn new(headless: bool, executable: Option<PathBuf>) -> Self {
        Self {
            headless,
            executable,
        }
    }
}

#[async_trait]
impl Renderer for ChromiumRenderer {
    async fn new_session(&self) -> Result<Box<dyn RenderSession>, EngineError> {
        let mut builder = BrowserConfig::builder();
        if !self.headless {
            builder = builder.with_head();
        }
        if let Some(path) = &self.executable {
            builder = builder.chrome_executable(path);
        }
        let config = builder.build().map_err(EngineError::Render)?;

        let (browser, mut handler) = Browser::launch(config).await.map_err(classify)?;
        // The handler stream must be drained for the browser connection to
        // make progress; it ends when the browser goes away.
        let handler_task = tokio::spawn(async move {
            while handler.next().await.is_some() {}
        });

        let page = browser.new_page("about:blank").await.map_err(classify)?;

        Ok(Box::new(ChromiumSession {
            browser,
            page,
            handler_task,
        }))
    }
}

struct ChromiumSession {
    browser: Browser,
    page: Page,
    handler_task: JoinHandle<()>,
}

#[async_trait]
impl RenderSession for ChromiumSession {
    async fn navigate(&mut self, url: &str) -> Result<(), EngineError> {
        self.page.goto(url).await.map_err(classify)?;
        self.page.wait_for_navigation().await.map_err(classify)?;
        Ok(())
    }

    async fn run_script(&mut self, script: &str) -> Result<serde_json::Value, EngineError> {
        let evaluation = self.page.evaluate(script).await.map_err(classify)?;
        Ok(evaluation
            .value()
            .cloned()
            .unwrap_or(serde_json::Value::Null))
    }

    async fn document(&self) -> Result<String, EngineError> {
        self.page.content().await.map_err(classify)
    }

    async fn close(&mut self) -> Result<(), EngineError> {
        let result = self.browser.close().await.map_err(classify);
        self.handler_task.abort();
        result.map(|_| ())
    }
}

/// Sorts a CDP failure into "this session is gone" versus "this one call
/// failed". The transport-level messages are the reliable signal that the
/// browser connection itself is dead, matching the `invalid session id`
/// family of failures seen from live crawls.
fn classify<E: std::fmt::Display>(err: E) -> EngineError {
    let message = err.to_string();
    let lower = message.to_lowercase();
    if lower.contains("session")
        || lower.contains("channel")
        || lower.contains("connection")
        || lower.contains("websocket")
        || lower.contains("browser closed")
    {
        EngineError::SessionInvalid(message)
    } else {
        EngineError::Render(message)
    }
}
