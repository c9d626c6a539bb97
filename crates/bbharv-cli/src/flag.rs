//! The `flag` subcommand: a post-processing pass over stored records.
//!
//! Scans each record's body text and comments for substring hits against an
//! operator-supplied keyword list and rewrites the record in place through
//! the store. Re-running with the same list converges: hits are recomputed
//! from scratch, so stale annotations are cleared.

use std::path::Path;

use bbharv_core::AppConfig;
use bbharv_store::JsonStore;

pub(crate) fn run_flag(
    config: &AppConfig,
    site_slug: &str,
    keywords_path: &Path,
) -> anyhow::Result<()> {
    let keywords = load_keywords(keywords_path)?;
    if keywords.is_empty() {
        anyhow::bail!(
            "no keywords found in {} (one per line, '#' for comments)",
            keywords_path.display()
        );
    }

    let store = JsonStore::open(config.output_dir.join(site_slug))?;

    let mut total = 0usize;
    let mut flagged = 0usize;
    for id in store.ids()? {
        let mut record = match store.load(id) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(id, error = %e, "skipping unreadable record");
                continue;
            }
        };

        let body_hits = find_hits(&record.post.body_text, &keywords);
        let mut any = !body_hits.is_empty();
        record.keyword_hits = if body_hits.is_empty() {
            None
        } else {
            Some(body_hits)
        };

        for comment in &mut record.post.comments {
            let hits = find_hits(&comment.text, &keywords);
            any = any || !hits.is_empty();
            comment.keyword_hits = if hits.is_empty() { None } else { Some(hits) };
        }

        if any {
            flagged += 1;
            tracing::info!(
                id,
                hits = ?record.keyword_hits,
                "keyword hits recorded"
            );
        }
        store.save(&record)?;
        total += 1;
    }

    println!("flagged {flagged} of {total} records in {site_slug}");
    Ok(())
}

/// One keyword per line; blank lines and `#` comments are ignored.
fn load_keywords(path: &Path) -> anyhow::Result<Vec<String>> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("cannot read {}: {e}", path.display()))?;
    Ok(raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}

fn find_hits(text: &str, keywords: &[String]) -> Vec<String> {
    keywords
        .iter()
        .filter(|k| text.contains(k.as_str()))
        .cloned()
        .collect()
}
