//! Cheap metadata-only fetches for direct-item sites.
//!
//! Direct-item listings probe every post id; an HTTP GET with the site's
//! fixed headers is far cheaper than spinning the renderer, so removed and
//! blinded posts are filtered out before the browser is involved at all.

use std::time::Duration;

use async_trait::async_trait;
use bbharv_core::{PostId, PostMeta};

use crate::error::EngineError;
use crate::retry::retry_with_backoff;
use crate::sites::Site;

/// Metadata-fetch capability; the orchestrator depends on this rather than a
/// concrete HTTP client so tests can count and script fetches.
#[async_trait]
pub trait MetaFetch: Send + Sync {
    /// `Ok(None)` means the fetch succeeded at the transport level but the
    /// post's content markers are absent — it was removed or blinded.
    ///
    /// # Errors
    ///
    /// Transport failures and 5xx responses, after the retry budget is spent.
    async fn fetch_post_meta(
        &self,
        site: &dyn Site,
        id: PostId,
    ) -> Result<Option<PostMeta>, EngineError>;
}

/// reqwest-backed [`MetaFetch`] with retry and backoff on transient errors.
pub struct MetaClient {
    client: reqwest::Client,
    max_retries: u32,
    backoff_base_secs: u64,
}

impl MetaClient {
    /// # Errors
    ///
    /// Returns [`EngineError::Http`] if the underlying client cannot be
    /// constructed.
    pub fn new(
        timeout_secs: u64,
        user_agent: &str,
        max_retries: u32,
        backoff_base_secs: u64,
    ) -> Result<Self, EngineError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            max_retries,
            backoff_base_secs,
        })
    }
}

#[async_trait]
impl MetaFetch for MetaClient {
    async fn fetch_post_meta(
        &self,
        site: &dyn Site,
        id: PostId,
    ) -> Result<Option<PostMeta>, EngineError> {
        let url = site.item_url(id);

        retry_with_backoff(self.max_retries, self.backoff_base_secs, || {
            let url = url.clone();
            async move {
                let mut request = self.client.get(&url);
                for (name, value) in site.headers() {
                    request = request.header(name, value);
                }
                let response = request.send().await?;
                let status = response.status();

                if status.is_server_error() {
                    return Err(EngineError::UnexpectedStatus {
                        status: status.as_u16(),
                        url,
                    });
                }
                if !status.is_success() {
                    // 4xx: the post is gone (deleted, blinded, private).
                    return Ok(None);
                }

                let final_url = response.url().to_string();
                let body = response.text().await?;
                Ok(site.meta(&body, id, &final_url))
            }
        })
        .await
    }
}
