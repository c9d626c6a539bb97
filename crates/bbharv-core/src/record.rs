//! Record model shared across the engine, store, and CLI.
//!
//! One [`HarvestRecord`] is persisted per harvested post. All text fields hold
//! the source text verbatim; the corpus is non-ASCII-heavy and must round-trip
//! losslessly through serialization.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Platform-scoped stable post key. Identical across repeated crawls of the
/// same post; used as the persistence key and the within-run dedup key.
pub type PostId = u64;

/// Cheap list-level metadata for one post, as seen on an index page.
///
/// Consumed by admission filtering and discarded; never persisted standalone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostSummary {
    pub id: PostId,
    pub url: String,
    pub comment_count: u32,
}

/// Result of the cheap metadata-only fetch for direct-item sites.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostMeta {
    pub id: PostId,
    pub url: String,
    pub title: String,
    pub author: String,
    pub author_ip: Option<String>,
    pub date: String,
}

/// One extracted comment. Insertion order is page-traversal order (pagination
/// page 1 first, DOM order within a page) and is a persisted invariant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub author: String,
    pub author_ip: Option<String>,
    pub date: String,
    pub text: String,
    pub likes: Option<u32>,
    pub dislikes: Option<u32>,
    /// Filled by the keyword flag pass; `None` until then.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyword_hits: Option<Vec<String>>,
}

/// A fully crawled post. Immutable once constructed; `comments.len()` is the
/// number of comments actually extracted, never a declared count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostDetail {
    pub id: PostId,
    pub url: String,
    pub title: String,
    pub author: String,
    pub author_ip: Option<String>,
    pub date: String,
    pub body_text: String,
    #[serde(default)]
    pub body_images: Vec<String>,
    pub likes: u32,
    pub dislikes: u32,
    pub comments: Vec<Comment>,
}

/// The on-disk document: one per post, keyed by `id` within a site's store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarvestRecord {
    pub site: String,
    pub id: PostId,
    pub url: String,
    pub fetched_at: DateTime<Utc>,
    pub post: PostDetail,
    /// Keyword hits found in the post body by the flag pass.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyword_hits: Option<Vec<String>>,
}

impl HarvestRecord {
    /// Wrap a crawled post for persistence, stamped with the current time.
    #[must_use]
    pub fn new(site: &str, post: PostDetail) -> Self {
        Self {
            site: site.to_string(),
            id: post.id,
            url: post.url.clone(),
            fetched_at: Utc::now(),
            post,
            keyword_hits: None,
        }
    }
}

#[cfg(test)]
#[path = "record_test.rs"]
mod tests;
