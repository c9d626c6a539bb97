//! Per-platform extraction glue.
//!
//! The engine core never inspects site-specific markup; each target board
//! implements [`Site`] with its URL shapes, selectors, and pagination
//! mechanics, and the orchestrator drives whichever one the run selects.

mod dcbest;
mod fmkorea;
mod ilbe;

pub use dcbest::DcBest;
pub use fmkorea::FmKorea;
pub use ilbe::Ilbe;

use std::sync::Arc;

use bbharv_core::{Comment, PostId, PostMeta, PostSummary};
use scraper::Html;

use crate::admission::AdmissionPolicy;
use crate::error::EngineError;
use crate::walker::{Extracted, PagedFlow};

/// How a site's numeric crawl range is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingMode {
    /// Each index is a post id, probed with a cheap metadata fetch.
    DirectItem,
    /// Each index is a list-page number whose summaries are filtered as a
    /// batch.
    ListPage,
}

/// Everything on a detail page except the comments.
#[derive(Debug, Clone)]
pub struct PostHeader {
    pub title: String,
    pub author: String,
    pub author_ip: Option<String>,
    pub date: String,
    pub body_text: String,
    pub body_images: Vec<String>,
    pub likes: u32,
    pub dislikes: u32,
}

pub trait Site: Send + Sync {
    fn slug(&self) -> &'static str;

    fn listing(&self) -> ListingMode;

    fn default_policy(&self) -> AdmissionPolicy;

    /// Fixed outbound headers beyond the User-Agent (typically a Referer).
    fn headers(&self) -> Vec<(&'static str, &'static str)> {
        Vec::new()
    }

    /// Index-page URL; `Some` for list-page sites.
    fn list_url(&self, _page: u64) -> Option<String> {
        None
    }

    /// Canonical detail URL for one post.
    fn item_url(&self, id: PostId) -> String;

    /// Metadata markers from a fetched detail body. `None` means the post is
    /// removed or blinded. Only meaningful for direct-item sites.
    fn meta(&self, _html: &str, _id: PostId, _final_url: &str) -> Option<PostMeta> {
        None
    }

    /// Summaries visible on one list page.
    fn list_summaries(&self, _doc: &Html) -> Extracted<PostSummary> {
        Extracted::default()
    }

    /// Selector whose presence signals the detail page finished rendering.
    fn detail_ready_selector(&self) -> &'static str;

    /// Declared comment count on the detail page, for pre-crawl gating.
    fn comment_count_hint(&self, _doc: &Html) -> Option<u32> {
        None
    }

    /// # Errors
    ///
    /// Returns [`EngineError::Extract`] when a required field is absent from
    /// the rendered document.
    fn post_header(&self, doc: &Html) -> Result<PostHeader, EngineError>;

    fn comment_flow(&self) -> &dyn PagedFlow<Comment>;
}

/// Resolve a CLI site argument.
#[must_use]
pub fn by_slug(slug: &str) -> Option<Arc<dyn Site>> {
    match slug {
        "dcbest" => Some(Arc::new(DcBest::new())),
        "fmkorea" => Some(Arc::new(FmKorea::new())),
        "ilbe" => Some(Arc::new(Ilbe::new())),
        _ => None,
    }
}

#[must_use]
pub fn known_slugs() -> &'static [&'static str] {
    &["dcbest", "fmkorea", "ilbe"]
}

/// JS click on the pagination link whose trimmed text equals `label`,
/// scoped under `container`. Shared by the sites that advance by clicking
/// numbered page links.
#[must_use]
pub(crate) fn click_page_link_script(container: &str, label: &str) -> String {
    // serde_json produces valid JS string literals, so arbitrary link text
    // cannot break out of the script.
    let container = serde_json::to_string(container).unwrap_or_else(|_| "\"\"".to_string());
    let label = serde_json::to_string(label).unwrap_or_else(|_| "\"\"".to_string());
    format!(
        "(() => {{ const p = document.querySelector({container}); if (!p) return false; \
         for (const a of p.querySelectorAll('a')) {{ \
         if (a.textContent.trim() === {label}) {{ a.click(); return true; }} }} \
         return false; }})()"
    )
}
