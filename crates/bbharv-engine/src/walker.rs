//! Pagination traversal over a live rendered page.
//!
//! The walker repeatedly extracts the items visible on the current page,
//! locates the next-page affordance, triggers the transition, and confirms
//! the advance by watching the current-page marker. The mechanics of where
//! the marker lives and what script advances the page are supplied by a
//! [`PagedFlow`], so the same traversal drives every site's comment (or
//! list) pagination.

use std::collections::HashSet;
use std::time::Duration;

use scraper::Html;

use crate::error::EngineError;
use crate::render::{wait_for, RenderSession};

/// Items extracted from one page. Extraction failures on individual items are
/// skipped and counted, never fatal to the page.
#[derive(Debug)]
pub struct Extracted<T> {
    pub items: Vec<T>,
    pub skipped: usize,
}

impl<T> Default for Extracted<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            skipped: 0,
        }
    }
}

/// The in-page action that advances to a specific next page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NextAction {
    /// Marker text expected on the new page once the transition lands.
    pub label: String,
    /// Script run in the page to trigger the transition.
    pub script: String,
}

/// Result of probing the current page for a next-page affordance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextProbe {
    /// No affordance: the sequence is exhausted.
    End,
    /// An affordance exists but is marked disabled.
    Disabled,
    Next(NextAction),
}

/// Site-supplied mechanics for one paginated sequence.
pub trait PagedFlow<T> {
    fn extract(&self, doc: &Html) -> Extracted<T>;

    /// Text of the current-page marker, used to confirm transitions.
    fn marker(&self, doc: &Html) -> Option<String>;

    fn next(&self, doc: &Html) -> NextProbe;
}

/// Why a traversal stopped. All of these are clean stops, not errors, but
/// they are kept distinct for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopCause {
    /// No next-page affordance on the last visited page.
    Exhausted,
    /// The affordance was present but disabled.
    DisabledNext,
    /// The transition was triggered but the expected marker never appeared
    /// within the wait timeout.
    ConfirmTimeout,
    /// The observed marker was one already visited — a no-op transition.
    Stalled,
    /// The transition script itself failed.
    TransitionFailed,
    /// The configured page ceiling was reached (guards cycling pagination).
    PageLimit,
}

#[derive(Debug, Clone, Copy)]
pub struct WalkStats {
    pub pages: usize,
    pub items: usize,
    pub skipped_items: usize,
    pub stop: StopCause,
}

/// Stateful traversal over one pagination sequence. Yields one batch per
/// visited page, lazily and in page order; finite; not restartable —
/// traversal runs against the live session, so starting over means
/// re-navigating from page one.
pub struct PaginationWalker<'a, T> {
    session: &'a mut dyn RenderSession,
    flow: &'a dyn PagedFlow<T>,
    page_delay: Duration,
    wait_timeout: Duration,
    max_pages: usize,
    seen: HashSet<String>,
    stop: Option<StopCause>,
    pages: usize,
    items: usize,
    skipped_items: usize,
}

impl<'a, T> PaginationWalker<'a, T> {
    pub fn new(
        session: &'a mut dyn RenderSession,
        flow: &'a dyn PagedFlow<T>,
        page_delay: Duration,
        wait_timeout: Duration,
        max_pages: usize,
    ) -> Self {
        Self {
            session,
            flow,
            page_delay,
            wait_timeout,
            max_pages,
            seen: HashSet::new(),
            stop: None,
            pages: 0,
            items: 0,
            skipped_items: 0,
        }
    }

    /// Extracts the current page's batch and advances to the next page so a
    /// subsequent call observes it. Returns `None` once the traversal has
    /// terminated.
    ///
    /// An empty batch does not terminate the walk; only the next-page checks
    /// do. A zero-item first page is a valid (empty) sequence.
    ///
    /// # Errors
    ///
    /// Only render-layer failures that make continuing impossible (losing
    /// the session, failing to snapshot the document) surface as errors;
    /// every pagination-level anomaly is a clean stop recorded in
    /// [`WalkStats::stop`].
    pub async fn next_batch(&mut self) -> Result<Option<Vec<T>>, EngineError> {
        if self.stop.is_some() {
            return Ok(None);
        }

        let html = self.session.document().await?;
        let (extracted, marker_before, probe) = {
            let doc = Html::parse_document(&html);
            (
                self.flow.extract(&doc),
                self.flow.marker(&doc),
                self.flow.next(&doc),
            )
        };

        self.pages += 1;
        self.items += extracted.items.len();
        self.skipped_items += extracted.skipped;
        if extracted.skipped > 0 {
            tracing::debug!(
                page = self.pages,
                skipped = extracted.skipped,
                "items skipped during extraction"
            );
        }
        if let Some(marker) = &marker_before {
            self.seen.insert(marker.clone());
        }

        if self.pages >= self.max_pages {
            tracing::warn!(max_pages = self.max_pages, "pagination page limit reached");
            self.stop = Some(StopCause::PageLimit);
        } else {
            match probe {
                NextProbe::End => self.stop = Some(StopCause::Exhausted),
                NextProbe::Disabled => self.stop = Some(StopCause::DisabledNext),
                NextProbe::Next(action) => {
                    if self.seen.contains(&action.label) {
                        self.stop = Some(StopCause::Stalled);
                    } else {
                        self.advance(action, marker_before.as_deref()).await?;
                    }
                }
            }
        }

        Ok(Some(extracted.items))
    }

    /// Drains the traversal, concatenating batches in page order.
    ///
    /// # Errors
    ///
    /// See [`Self::next_batch`].
    pub async fn collect_all(mut self) -> Result<(Vec<T>, WalkStats), EngineError> {
        let mut all = Vec::new();
        while let Some(batch) = self.next_batch().await? {
            all.extend(batch);
        }
        Ok((all, self.stats()))
    }

    /// Traversal counters; the stop cause is meaningful once `next_batch`
    /// has returned `None`.
    #[must_use]
    pub fn stats(&self) -> WalkStats {
        WalkStats {
            pages: self.pages,
            items: self.items,
            skipped_items: self.skipped_items,
            stop: self.stop.unwrap_or(StopCause::Exhausted),
        }
    }

    async fn advance(
        &mut self,
        action: NextAction,
        marker_before: Option<&str>,
    ) -> Result<(), EngineError> {
        match self.session.run_script(&action.script).await {
            Ok(_) => {}
            Err(e) if e.is_session_invalid() => return Err(e),
            Err(e) => {
                tracing::warn!(error = %e, "transition script failed; stopping traversal");
                self.stop = Some(StopCause::TransitionFailed);
                return Ok(());
            }
        }

        let flow = self.flow;
        let expected = action.label;
        let confirmed = wait_for(
            &*self.session,
            "page marker to advance",
            self.wait_timeout,
            |doc| flow.marker(doc).filter(|m| *m == expected),
        )
        .await;

        match confirmed {
            Ok(observed) => {
                if marker_before == Some(observed.as_str()) {
                    // The click was a silent no-op: the "new" marker is the
                    // page we were already on.
                    self.stop = Some(StopCause::Stalled);
                    return Ok(());
                }
                tokio::time::sleep(self.page_delay).await;
                Ok(())
            }
            Err(EngineError::WaitTimeout { .. }) => {
                self.stop = Some(StopCause::ConfirmTimeout);
                Ok(())
            }
            Err(e) if e.is_session_invalid() => Err(e),
            Err(e) => {
                tracing::warn!(error = %e, "transition confirmation failed; stopping traversal");
                self.stop = Some(StopCause::TransitionFailed);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
#[path = "walker_test.rs"]
mod tests;
