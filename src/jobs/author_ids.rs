//! Harvests registry identifiers from a Wikidata entity dump and merges
//! them into the matching Open Library authors.

use anyhow::Result;
use log::{debug, error, info, warn};
use std::path::Path;

use super::{progress_spinner, WriteLimiter};
use crate::clients::OpenLibrary;
use crate::context::RunContext;
use crate::dump::DumpReader;
use crate::entity::{harvest_remote_ids, EntityDoc};
use crate::merge::merge_remote_ids;
use crate::registry::WIKIDATA_KEY;
use crate::report::ProblemKind;

const SAVE_COMMENT: &str = "[author-ids] add wikidata remote identifiers";

pub fn run(
    ctx: &mut RunContext,
    ol: &impl OpenLibrary,
    dump_path: &Path,
    dry_run: bool,
    limit: Option<usize>,
) -> Result<()> {
    let mut reader = DumpReader::open(dump_path)?;
    let mut limiter = WriteLimiter::new(limit);
    let spinner = progress_spinner();

    while let Some(entity) = reader.next_entity() {
        spinner.inc(1);
        if limiter.reached() {
            info!(
                "Write limit reached after {} author update(s), stopping",
                limiter.library_writes()
            );
            break;
        }
        process_entity(ctx, ol, &entity, dry_run, &mut limiter);
    }
    spinner.finish_and_clear();

    info!(
        "Processed {} dump row(s) ({} unparseable), {} author update(s){}, {} problem row(s)",
        reader.rows_read(),
        reader.parse_errors(),
        limiter.library_writes(),
        if dry_run { " (dry run)" } else { "" },
        ctx.reporter.rows_written()
    );
    Ok(())
}

fn quoted_list(values: &[String]) -> String {
    let quoted: Vec<String> = values.iter().map(|v| format!("\"{}\"", v)).collect();
    format!("[{}]", quoted.join(","))
}

/// Reconcile one dump entity against Open Library. All anomalies land in
/// the problems sheet; only a conflict-free merge with at least one new
/// identifier results in a save.
pub(crate) fn process_entity(
    ctx: &mut RunContext,
    ol: &impl OpenLibrary,
    entity: &EntityDoc,
    dry_run: bool,
    limiter: &mut WriteLimiter,
) {
    let olids = entity.openlibrary_author_ids();
    if olids.is_empty() {
        return;
    }

    // Some Wikidata entities claim several distinct Open Library authors.
    // That is never resolved automatically, only flagged, one row per OLID.
    if olids.len() > 1 {
        let details = quoted_list(&olids);
        for olid in &olids {
            let name = match ol.get_author(olid) {
                Ok(Some(author)) => author.name,
                _ => String::new(),
            };
            ctx.reporter.report(
                &entity.id,
                olid,
                Some(&name),
                ProblemKind::MultipleOpenlibraryAuthorsForOneWikidataRow,
                "ol_id",
                &details,
            );
        }
        return;
    }

    let olid = &olids[0];
    let author = match ol.get_author(olid) {
        Ok(Some(author)) => author,
        Ok(None) => {
            warn!("No Open Library author {} for {}", olid, entity.id);
            return;
        }
        Err(e) => {
            error!("Failed to fetch author {} for {}: {}", olid, entity.id, e);
            return;
        }
    };

    let (incoming, anomalies) = harvest_remote_ids(entity);
    for anomaly in &anomalies {
        ctx.reporter.report(
            &entity.id,
            olid,
            Some(&author.name),
            ProblemKind::MultipleWikidataRemoteIdsForOneAuthor,
            anomaly.identifier,
            &quoted_list(&anomaly.values),
        );
    }

    let result = merge_remote_ids(&author.remote_ids, &incoming);
    for conflict in &result.conflicts {
        ctx.reporter.report(
            &entity.id,
            olid,
            Some(&author.name),
            ProblemKind::OpenlibraryWikidataRemoteIdCollision,
            conflict.identifier,
            &format!(r#"{{"ol": "{}", "wd": "{}"}}"#, conflict.existing, conflict.incoming),
        );
    }
    if result.update_count < 0 {
        return;
    }

    // The merge is registry-scoped; the reciprocal cross-reference to the
    // dump entity itself is handled here.
    let mut merged = result.ids;
    let mut updates = result.update_count;
    match merged.get(WIKIDATA_KEY) {
        None => {
            merged.insert(WIKIDATA_KEY.to_string(), entity.id.clone());
            updates += 1;
        }
        Some(existing_qid) if existing_qid != &entity.id => {
            ctx.reporter.report(
                &entity.id,
                olid,
                Some(&author.name),
                ProblemKind::OpenlibraryWikidataRemoteIdCollision,
                WIKIDATA_KEY,
                &format!(r#"{{"ol": "{}", "wd": "{}"}}"#, existing_qid, entity.id),
            );
            return;
        }
        Some(_) => {}
    }
    if updates == 0 {
        debug!("{} already synchronized with {}", olid, entity.id);
        return;
    }

    info!("new remote_ids for {}: {:?}", olid, merged);
    if dry_run {
        info!("Dry run, not saving {}", olid);
    } else {
        let mut updated = author;
        updated.remote_ids = merged;
        if let Err(e) = ol.save_author(&updated, SAVE_COMMENT) {
            error!("Failed to save author {}: {}", olid, e);
            return;
        }
    }
    limiter.record_library();
}
