//! Admission filtering: which discovered posts are worth a detail crawl.
//!
//! The bar is either self-adjusting (the arithmetic mean of the comment
//! counts on the page, so it tracks the page's own activity level) or a
//! fixed constant, preserved from the platform variants that gate that way.
//! The engine is policy-agnostic; a site only supplies its default.

use std::fmt;
use std::str::FromStr;

use bbharv_core::PostSummary;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmissionPolicy {
    /// Admit summaries whose comment count is at or above the page mean
    /// (ties admitted). A single-summary page always admits its one post.
    MeanOfPage,
    /// Admit summaries whose comment count strictly exceeds the constant.
    Fixed(u32),
}

impl fmt::Display for AdmissionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdmissionPolicy::MeanOfPage => write!(f, "mean"),
            AdmissionPolicy::Fixed(n) => write!(f, "fixed:{n}"),
        }
    }
}

impl FromStr for AdmissionPolicy {
    type Err = String;

    /// Accepts `mean` or `fixed:<n>`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mean" => Ok(AdmissionPolicy::MeanOfPage),
            other => match other.strip_prefix("fixed:") {
                Some(n) => n
                    .parse::<u32>()
                    .map(AdmissionPolicy::Fixed)
                    .map_err(|e| format!("bad fixed threshold {n:?}: {e}")),
                None => Err(format!(
                    "unknown admission policy {other:?} (expected \"mean\" or \"fixed:<n>\")"
                )),
            },
        }
    }
}

/// Outcome of filtering one page worth of summaries. `admitted` is parallel
/// to the input batch; order is never changed.
#[derive(Debug, Clone)]
pub struct AdmissionReport {
    pub admitted: Vec<bool>,
    pub admitted_count: usize,
    pub considered: usize,
    /// The page mean, when the mean policy ran on a non-empty batch.
    pub mean: Option<f64>,
}

impl AdmissionPolicy {
    /// Filter one page's summaries.
    #[must_use]
    pub fn admit_batch(&self, batch: &[PostSummary]) -> AdmissionReport {
        let (admitted, mean) = match self {
            AdmissionPolicy::Fixed(threshold) => {
                let flags: Vec<bool> =
                    batch.iter().map(|s| s.comment_count > *threshold).collect();
                (flags, None)
            }
            AdmissionPolicy::MeanOfPage => {
                if batch.is_empty() {
                    (Vec::new(), None)
                } else {
                    let total: u64 = batch.iter().map(|s| u64::from(s.comment_count)).sum();
                    #[allow(clippy::cast_precision_loss)]
                    let mean = total as f64 / batch.len() as f64;
                    let flags: Vec<bool> = batch
                        .iter()
                        .map(|s| f64::from(s.comment_count) >= mean)
                        .collect();
                    (flags, Some(mean))
                }
            }
        };

        let admitted_count = admitted.iter().filter(|a| **a).count();
        AdmissionReport {
            admitted_count,
            considered: batch.len(),
            admitted,
            mean,
        }
    }

    /// Predicate form: does `summary` pass, given the page it appeared on?
    #[must_use]
    pub fn admits(&self, summary: &PostSummary, page: &[PostSummary]) -> bool {
        match self {
            AdmissionPolicy::Fixed(threshold) => summary.comment_count > *threshold,
            AdmissionPolicy::MeanOfPage => {
                if page.is_empty() {
                    return true;
                }
                let total: u64 = page.iter().map(|s| u64::from(s.comment_count)).sum();
                #[allow(clippy::cast_precision_loss)]
                let mean = total as f64 / page.len() as f64;
                f64::from(summary.comment_count) >= mean
            }
        }
    }
}
