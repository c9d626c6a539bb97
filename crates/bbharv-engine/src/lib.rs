//! Generic paginated-extraction and resumable-crawl engine.
//!
//! The engine traverses site-rendered pagination sequences of unknown length,
//! applies a load-reducing admission filter before committing to expensive
//! per-post crawls, and persists one record per post idempotently so an
//! interrupted run can resume without re-fetching completed items.
//!
//! Everything site-specific (selectors, URL shapes, cleanup) lives behind the
//! [`sites::Site`] trait; everything browser-specific lives behind the
//! [`render::Renderer`] capability, so the core is testable against fixture
//! documents without a real browser.

pub mod admission;
pub mod dom;
pub mod error;
pub mod harvester;
pub mod meta;
pub mod render;
pub mod retry;
pub mod sites;
pub mod walker;

pub use admission::{AdmissionPolicy, AdmissionReport};
pub use error::EngineError;
pub use harvester::{CrawlOutcome, HarvestOptions, Harvester, RunSummary};
pub use meta::{MetaClient, MetaFetch};
pub use render::{RenderSession, Renderer};
pub use walker::{Extracted, PaginationWalker, StopCause, WalkStats};
