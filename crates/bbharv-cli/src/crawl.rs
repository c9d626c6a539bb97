//! The `crawl` subcommand.
//!
//! Wires the configured site, admission policy, metadata client, Chromium
//! renderer, and store into a [`bbharv_engine::Harvester`] and runs it over
//! the requested range. Per-item failures are reflected in the tally and the
//! event log, never in the exit code; only setup failures abort.

use std::time::Duration;

use bbharv_core::AppConfig;
use bbharv_engine::render::chromium::ChromiumRenderer;
use bbharv_engine::{AdmissionPolicy, HarvestOptions, Harvester, MetaClient};
use bbharv_store::JsonStore;

pub(crate) async fn run_crawl(
    config: &AppConfig,
    site_slug: &str,
    start: u64,
    end: u64,
    force: bool,
    policy: Option<&str>,
    dry_run: bool,
) -> anyhow::Result<()> {
    let site = bbharv_engine::sites::by_slug(site_slug).ok_or_else(|| {
        anyhow::anyhow!(
            "unknown site '{site_slug}' (known sites: {})",
            bbharv_engine::sites::known_slugs().join(", ")
        )
    })?;

    let policy = match policy {
        Some(raw) => raw
            .parse::<AdmissionPolicy>()
            .map_err(|e| anyhow::anyhow!("--policy: {e}"))?,
        None => site.default_policy(),
    };

    if start < end {
        anyhow::bail!("--start must be at or above --end (descending traversal)");
    }

    if dry_run {
        println!(
            "dry-run: would crawl {} from {start} down to {end} (policy {policy}, output {})",
            site.slug(),
            config.output_dir.join(site.slug()).display()
        );
        return Ok(());
    }

    let store = JsonStore::open(config.output_dir.join(site.slug()))?;
    let meta = MetaClient::new(
        config.request_timeout_secs,
        &config.user_agent,
        config.max_retries,
        config.retry_backoff_base_secs,
    )
    .map_err(|e| anyhow::anyhow!("failed to build metadata client: {e}"))?;
    let renderer = ChromiumRenderer::new(config.chrome_headless, config.chrome_executable.clone());

    let opts = HarvestOptions {
        policy,
        force,
        page_delay: Duration::from_millis(config.page_delay_ms),
        item_delay: Duration::from_millis(config.item_delay_ms),
        wait_timeout: Duration::from_secs(config.wait_timeout_secs),
        max_comment_pages: config.max_comment_pages,
    };

    let mut harvester = Harvester::new(&renderer, &meta, &store, site.as_ref(), opts)
        .await
        .map_err(|e| anyhow::anyhow!("failed to start harvest run: {e}"))?;
    let summary = harvester.run(start, end).await;
    harvester.shutdown().await;

    println!(
        "processed {} items: {} saved, {} below threshold, {} already stored, {} gone, {} failed",
        summary.total(),
        summary.saved,
        summary.below_threshold,
        summary.already_exists,
        summary.gone_or_blind,
        summary.failed,
    );

    Ok(())
}
