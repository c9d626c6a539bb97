//! The `report` subcommand: store statistics for one or all sites.

use bbharv_core::AppConfig;
use bbharv_store::JsonStore;

pub(crate) fn run_report(config: &AppConfig, site: Option<&str>) -> anyhow::Result<()> {
    let slugs: Vec<&str> = match site {
        Some(slug) => vec![slug],
        None => bbharv_engine::sites::known_slugs().to_vec(),
    };

    for slug in slugs {
        let dir = config.output_dir.join(slug);
        if !dir.is_dir() {
            println!("{slug}: no records");
            continue;
        }

        let store = JsonStore::open(&dir)?;
        let ids = store.ids()?;
        if ids.is_empty() {
            println!("{slug}: no records");
            continue;
        }

        let mut comments = 0usize;
        let mut flagged = 0usize;
        let mut unreadable = 0usize;
        for id in &ids {
            match store.load(*id) {
                Ok(record) => {
                    comments += record.post.comments.len();
                    if record.keyword_hits.is_some()
                        || record
                            .post
                            .comments
                            .iter()
                            .any(|c| c.keyword_hits.is_some())
                    {
                        flagged += 1;
                    }
                }
                Err(e) => {
                    tracing::warn!(id = *id, error = %e, "unreadable record");
                    unreadable += 1;
                }
            }
        }

        let first = ids.first().copied().unwrap_or_default();
        let last = ids.last().copied().unwrap_or_default();
        println!(
            "{slug}: {} records (ids {first}..{last}), {comments} comments, {flagged} flagged{}",
            ids.len(),
            if unreadable > 0 {
                format!(", {unreadable} unreadable")
            } else {
                String::new()
            }
        );
    }

    Ok(())
}
