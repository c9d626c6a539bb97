//! Crawl orchestration: a numeric range, traversed descending, turned into
//! at most one persisted record per discovered post.
//!
//! Per-item failures never propagate to the run loop: every exception is
//! settled into a [`CrawlOutcome`] at the item boundary, and the one failure
//! class that poisons the shared render session triggers a session rebuild
//! before the next item. Only top-level setup (a renderer that cannot start,
//! a store directory that cannot be created) aborts a run.

use std::time::Duration;

use bbharv_core::{HarvestRecord, PostDetail, PostId, PostSummary};
use bbharv_store::JsonStore;
use scraper::Html;

use crate::admission::AdmissionPolicy;
use crate::error::EngineError;
use crate::meta::MetaFetch;
use crate::render::{wait_for, wait_for_selector, Renderer, RenderSession};
use crate::sites::{ListingMode, Site};
use crate::walker::PaginationWalker;

#[derive(Debug, Clone)]
pub struct HarvestOptions {
    pub policy: AdmissionPolicy,
    /// Re-crawl and overwrite records that already exist.
    pub force: bool,
    pub page_delay: Duration,
    pub item_delay: Duration,
    pub wait_timeout: Duration,
    pub max_comment_pages: usize,
}

/// Terminal state of one item's crawl state machine.
#[derive(Debug)]
pub enum CrawlOutcome {
    Saved(Box<PostDetail>),
    SkippedBelowThreshold,
    SkippedAlreadyExists,
    SkippedGoneOrBlind,
    Failed(String),
}

impl CrawlOutcome {
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            CrawlOutcome::Saved(_) => "saved",
            CrawlOutcome::SkippedBelowThreshold => "below-threshold",
            CrawlOutcome::SkippedAlreadyExists => "already-exists",
            CrawlOutcome::SkippedGoneOrBlind => "gone-or-blind",
            CrawlOutcome::Failed(_) => "failed",
        }
    }
}

/// Running tally for one harvest run, in processing order.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub outcomes: Vec<(PostId, CrawlOutcome)>,
    pub saved: usize,
    pub below_threshold: usize,
    pub already_exists: usize,
    pub gone_or_blind: usize,
    pub failed: usize,
}

impl RunSummary {
    fn record(&mut self, id: PostId, outcome: CrawlOutcome) {
        match outcome {
            CrawlOutcome::Saved(_) => self.saved += 1,
            CrawlOutcome::SkippedBelowThreshold => self.below_threshold += 1,
            CrawlOutcome::SkippedAlreadyExists => self.already_exists += 1,
            CrawlOutcome::SkippedGoneOrBlind => self.gone_or_blind += 1,
            CrawlOutcome::Failed(_) => self.failed += 1,
        }
        self.outcomes.push((id, outcome));
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }
}

/// Top-level control loop. Exclusively owns the render session for the
/// duration of a run; the session-recovery transition is the only thing
/// that replaces it, and only at an item boundary.
pub struct Harvester<'a> {
    renderer: &'a dyn Renderer,
    session: Box<dyn RenderSession>,
    meta: &'a dyn MetaFetch,
    store: &'a JsonStore,
    site: &'a dyn Site,
    opts: HarvestOptions,
}

impl<'a> Harvester<'a> {
    /// # Errors
    ///
    /// Fails when the initial render session cannot be created, or when a
    /// list-page site does not actually provide list URLs.
    pub async fn new(
        renderer: &'a dyn Renderer,
        meta: &'a dyn MetaFetch,
        store: &'a JsonStore,
        site: &'a dyn Site,
        opts: HarvestOptions,
    ) -> Result<Harvester<'a>, EngineError> {
        if site.listing() == ListingMode::ListPage && site.list_url(1).is_none() {
            return Err(EngineError::ListingUnsupported(site.slug().to_string()));
        }
        let session = renderer.new_session().await?;
        Ok(Harvester {
            renderer,
            session,
            meta,
            store,
            site,
            opts,
        })
    }

    /// Process `start` down to `end` inclusive, one index at a time. For
    /// direct-item sites an index is a post id; for list-page sites it is a
    /// list page number whose summaries are admitted as a batch.
    pub async fn run(&mut self, start: u64, end: u64) -> RunSummary {
        let mut summary = RunSummary::default();
        if start < end {
            tracing::warn!(start, end, "empty range: start is below end");
            return summary;
        }

        tracing::info!(
            site = self.site.slug(),
            start,
            end,
            policy = %self.opts.policy,
            force = self.opts.force,
            "starting harvest run"
        );

        let mut index = start;
        loop {
            match self.site.listing() {
                ListingMode::DirectItem => {
                    let url = self.site.item_url(index);
                    let result = self.process_item(index).await;
                    let outcome = self.settle(index, &url, result).await;
                    self.report(index, &outcome);
                    summary.record(index, outcome);
                    tokio::time::sleep(self.opts.item_delay).await;
                }
                ListingMode::ListPage => {
                    self.process_list_page(index, &mut summary).await;
                }
            }
            if index == end {
                break;
            }
            index -= 1;
        }

        tracing::info!(
            site = self.site.slug(),
            total = summary.total(),
            saved = summary.saved,
            failed = summary.failed,
            "harvest run finished"
        );
        summary
    }

    /// Release the render session.
    pub async fn shutdown(mut self) {
        if let Err(e) = self.session.close().await {
            tracing::debug!(error = %e, "session close failed");
        }
    }

    /// Direct-item state machine: exists → meta → threshold → detail → persist.
    async fn process_item(&mut self, id: PostId) -> Result<CrawlOutcome, EngineError> {
        if !self.opts.force && self.store.exists(id) {
            return Ok(CrawlOutcome::SkippedAlreadyExists);
        }

        let Some(meta) = self.meta.fetch_post_meta(self.site, id).await? else {
            return Ok(CrawlOutcome::SkippedGoneOrBlind);
        };

        self.session.navigate(&meta.url).await?;
        wait_for_selector(
            &*self.session,
            self.site.detail_ready_selector(),
            self.opts.wait_timeout,
        )
        .await?;

        // The declared count gates the expensive comment traversal.
        let site = self.site;
        let declared = wait_for(
            &*self.session,
            "declared comment count",
            self.opts.wait_timeout,
            |doc| site.comment_count_hint(doc),
        )
        .await?;

        let summary = PostSummary {
            id,
            url: meta.url.clone(),
            comment_count: declared,
        };
        if !self
            .opts
            .policy
            .admits(&summary, std::slice::from_ref(&summary))
        {
            tracing::info!(id, comment_count = declared, "below threshold");
            return Ok(CrawlOutcome::SkippedBelowThreshold);
        }

        let detail = self.crawl_detail(id, &meta.url).await?;
        let saved = self.persist(detail)?;
        Ok(CrawlOutcome::Saved(Box::new(saved)))
    }

    /// List-page flow: one page of summaries, one admission decision per
    /// summary, then detail crawls for the admitted subset.
    async fn process_list_page(&mut self, page: u64, summary: &mut RunSummary) {
        let Some(url) = self.site.list_url(page) else {
            // Ruled out in `new`; nothing sensible to do per page.
            return;
        };

        let summaries = match self.load_list_page(&url).await {
            Ok(items) => items,
            Err(e) => {
                let failed = self.settle(page, &url, Err(e)).await;
                tracing::error!(page, url = %url, outcome = failed.label(), "list page failed");
                return;
            }
        };

        if summaries.is_empty() {
            tracing::info!(page, "no posts found on list page");
            return;
        }

        let report = self.opts.policy.admit_batch(&summaries);
        tracing::info!(
            page,
            considered = report.considered,
            admitted = report.admitted_count,
            mean = report.mean,
            "admission filter applied"
        );

        for (post, admitted) in summaries.iter().zip(&report.admitted) {
            if !*admitted {
                summary.record(post.id, CrawlOutcome::SkippedBelowThreshold);
                continue;
            }

            let outcome = if !self.opts.force && self.store.exists(post.id) {
                CrawlOutcome::SkippedAlreadyExists
            } else {
                let result = self.detail_for_summary(post).await;
                self.settle(post.id, &post.url, result).await
            };
            self.report(post.id, &outcome);
            summary.record(post.id, outcome);
            tokio::time::sleep(self.opts.item_delay).await;
        }
    }

    async fn load_list_page(&mut self, url: &str) -> Result<Vec<PostSummary>, EngineError> {
        self.session.navigate(url).await?;

        let site = self.site;
        let extracted = match wait_for(&*self.session, "list items", self.opts.wait_timeout, |doc| {
            let batch = site.list_summaries(doc);
            if batch.items.is_empty() {
                None
            } else {
                Some(batch)
            }
        })
        .await
        {
            Ok(batch) => batch,
            // A page that never yields items is an empty page, not an error.
            Err(EngineError::WaitTimeout { .. }) => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        if extracted.skipped > 0 {
            tracing::debug!(
                url,
                skipped = extracted.skipped,
                "list items skipped during extraction"
            );
        }
        Ok(extracted.items)
    }

    async fn detail_for_summary(
        &mut self,
        summary: &PostSummary,
    ) -> Result<CrawlOutcome, EngineError> {
        self.session.navigate(&summary.url).await?;
        wait_for_selector(
            &*self.session,
            self.site.detail_ready_selector(),
            self.opts.wait_timeout,
        )
        .await?;

        let detail = self.crawl_detail(summary.id, &summary.url).await?;
        let saved = self.persist(detail)?;
        Ok(CrawlOutcome::Saved(Box::new(saved)))
    }

    /// Header extraction plus the full comment traversal. Assumes the detail
    /// page is already loaded and ready.
    async fn crawl_detail(&mut self, id: PostId, url: &str) -> Result<PostDetail, EngineError> {
        let html = self.session.document().await?;
        let header = {
            let doc = Html::parse_document(&html);
            self.site.post_header(&doc)?
        };

        let flow = self.site.comment_flow();
        let walker = PaginationWalker::new(
            &mut *self.session,
            flow,
            self.opts.page_delay,
            self.opts.wait_timeout,
            self.opts.max_comment_pages,
        );
        let (comments, stats) = walker.collect_all().await?;
        tracing::debug!(
            id,
            pages = stats.pages,
            comments = comments.len(),
            skipped = stats.skipped_items,
            stop = ?stats.stop,
            "comment traversal finished"
        );
        if comments.is_empty() {
            tracing::warn!(id, url, "post has zero comments after crawl");
        }

        Ok(PostDetail {
            id,
            url: url.to_string(),
            title: header.title,
            author: header.author,
            author_ip: header.author_ip,
            date: header.date,
            body_text: header.body_text,
            body_images: header.body_images,
            likes: header.likes,
            dislikes: header.dislikes,
            comments,
        })
    }

    fn persist(&self, detail: PostDetail) -> Result<PostDetail, EngineError> {
        let record = HarvestRecord::new(self.site.slug(), detail);
        self.store.save(&record)?;
        Ok(record.post)
    }

    /// Item boundary: no error crosses this line. Session loss additionally
    /// swaps in a fresh session for the next item.
    async fn settle(
        &mut self,
        id: PostId,
        url: &str,
        result: Result<CrawlOutcome, EngineError>,
    ) -> CrawlOutcome {
        match result {
            Ok(outcome) => outcome,
            Err(EngineError::SessionInvalid(message)) => {
                tracing::error!(
                    id,
                    url,
                    error = %message,
                    "render session lost — recreating before next item"
                );
                if let Err(e) = self.session.close().await {
                    tracing::debug!(error = %e, "closing dead session failed");
                }
                match self.renderer.new_session().await {
                    Ok(session) => self.session = session,
                    Err(e) => {
                        tracing::error!(error = %e, "failed to recreate render session");
                    }
                }
                CrawlOutcome::Failed(message)
            }
            Err(e) => {
                tracing::error!(id, url, error = %e, "item failed");
                CrawlOutcome::Failed(e.to_string())
            }
        }
    }

    fn report(&self, id: PostId, outcome: &CrawlOutcome) {
        match outcome {
            CrawlOutcome::Saved(detail) => tracing::info!(
                id,
                outcome = outcome.label(),
                comments = detail.comments.len(),
                "item processed"
            ),
            other => tracing::info!(id, outcome = other.label(), "item processed"),
        }
    }
}

#[cfg(test)]
#[path = "harvester_test.rs"]
mod tests;
