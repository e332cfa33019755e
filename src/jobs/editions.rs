//! Edition reconciliation: match Wikidata edition items to Open Library
//! editions by ISBN, add the QID to each matched edition and the OLID claim
//! to the item. Two job variants share the same write-back logic and differ
//! only in how the SPARQL result set shapes its ISBN columns.

use anyhow::{Context, Result};
use log::{debug, error, info, warn};

use super::{progress_bar, WriteLimiter};
use crate::clients::{qid_from_uri, OpenLibrary, SparqlRow, Wikidata};
use crate::context::RunContext;
use crate::isbn::normalize_isbns;
use crate::records::Edition;
use crate::registry::{P_OPEN_LIBRARY_ID, WIKIDATA_KEY};
use crate::util::remove_dupes;

// Edition items with at least one ISBN and no Open Library ID claim yet.
const PER_ROW_QUERY: &str = "
SELECT
?item
?isbn13
?isbn10
WHERE {
  ?item  wdt:P31 wd:Q3331189.                # instanceOf: Edition
  OPTIONAL { ?item wdt:P212 ?isbn13. }       # isbn13: ?isbn13
  OPTIONAL { ?item wdt:P957 ?isbn10. }       # isbn10: ?isbn10
  FILTER(bound(?isbn13) || bound(?isbn10))
  FILTER NOT EXISTS { ?item wdt:P648 ?olid } # Open Library ID: ?olid
}
";

// Same selection, one row per item with the ISBNs concatenated.
const GROUPED_QUERY: &str = "
SELECT
?item
(group_concat(distinct ?isbn13; separator=\";\") as ?isbn13s)
(group_concat(distinct ?isbn10; separator=\";\") as ?isbn10s)
WHERE {
  ?item  wdt:P31 wd:Q3331189.                # instanceOf: Edition
  OPTIONAL { ?item wdt:P212 ?isbn13. }       # isbn13: ?isbn13
  OPTIONAL { ?item wdt:P957 ?isbn10. }       # isbn10: ?isbn10
  FILTER(bound(?isbn13) || bound(?isbn10))
  FILTER NOT EXISTS { ?item wdt:P648 ?olid } # Open Library ID: ?olid
}
GROUP BY ?item
";

const OL_SAVE_COMMENT: &str = "[edition-olids] add wikidata identifier";
const WD_CLAIM_COMMENT: &str = "[edition-olids] add Open Library ID";

#[derive(Clone, Copy)]
enum IsbnColumns {
    PerRow,
    Grouped,
}

pub fn run_edition_olids(
    ctx: &mut RunContext,
    ol: &impl OpenLibrary,
    wd: &impl Wikidata,
    dry_run: bool,
    limit: Option<usize>,
) -> Result<()> {
    run_with_query(ctx, ol, wd, PER_ROW_QUERY, IsbnColumns::PerRow, dry_run, limit)
}

pub fn run_edition_olids_by_isbns(
    ctx: &mut RunContext,
    ol: &impl OpenLibrary,
    wd: &impl Wikidata,
    dry_run: bool,
    limit: Option<usize>,
) -> Result<()> {
    run_with_query(ctx, ol, wd, GROUPED_QUERY, IsbnColumns::Grouped, dry_run, limit)
}

fn run_with_query(
    ctx: &mut RunContext,
    ol: &impl OpenLibrary,
    wd: &impl Wikidata,
    query: &str,
    columns: IsbnColumns,
    dry_run: bool,
    limit: Option<usize>,
) -> Result<()> {
    let rows = wd
        .select(query)
        .context("SPARQL query for editions failed")?;
    info!("Found {} editions to update", rows.len());

    let bar = progress_bar(rows.len() as u64);
    let mut limiter = WriteLimiter::new(limit);
    for row in &rows {
        bar.inc(1);
        if limiter.reached() {
            info!(
                "Write limit reached ({} Open Library, {} Wikidata), stopping",
                limiter.library_writes(),
                limiter.graph_writes()
            );
            break;
        }
        let Some(item) = row.get("item") else {
            continue;
        };
        let qid = qid_from_uri(item);
        debug!("Processing {}", qid);

        let isbns = normalize_isbns(raw_isbns(row, columns, qid));
        if isbns.is_empty() {
            warn!("{} has no usable isbn", qid);
            continue;
        }

        let editions = resolve_editions(ol, qid, &isbns);
        info!(
            "Found {} Open Library book(s) for {} (isbns {})",
            editions.len(),
            qid,
            isbns.join(", ")
        );
        if editions.is_empty() {
            warn!("No Open Library books for {} (isbns {})", qid, isbns.join(", "));
            continue;
        }
        if editions.len() > 1 {
            // Deliberate policy: every matched edition gets the write-back.
            warn!(
                "Multiple ({}) Open Library books for {} (isbns {})",
                editions.len(),
                qid,
                isbns.join(", ")
            );
        }
        sync_item(ol, wd, qid, &editions, dry_run, &mut limiter);
    }
    bar.finish_and_clear();

    info!(
        "Updated {} Open Library books and {} Wikidata items{}, {} problem row(s)",
        limiter.library_writes(),
        limiter.graph_writes(),
        if dry_run { " (dry run)" } else { "" },
        ctx.reporter.rows_written()
    );
    Ok(())
}

fn raw_isbns(row: &SparqlRow, columns: IsbnColumns, qid: &str) -> Vec<String> {
    match columns {
        IsbnColumns::PerRow => ["isbn13", "isbn10"]
            .iter()
            .filter_map(|var| row.get(*var))
            .cloned()
            .collect(),
        IsbnColumns::Grouped => {
            let mut isbns = Vec::new();
            for var in ["isbn13s", "isbn10s"] {
                let Some(concatenated) = row.get(var) else {
                    continue;
                };
                let values: Vec<String> = concatenated
                    .split(';')
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect();
                if values.len() > 1 {
                    warn!("{} has multiple {} ({})", qid, var, values.len());
                }
                isbns.extend(values);
            }
            isbns
        }
    }
}

/// Look up each ISBN independently and deduplicate the hits on OLID; the
/// same book is routinely reachable through both its isbn10 and isbn13.
fn resolve_editions(ol: &impl OpenLibrary, qid: &str, isbns: &[String]) -> Vec<Edition> {
    let mut found = Vec::new();
    for isbn in isbns {
        match ol.get_edition_by_isbn(isbn) {
            Ok(Some(edition)) => found.push(edition),
            Ok(None) => {}
            Err(e) => error!("Failed to resolve isbn {} for {}: {}", isbn, qid, e),
        }
    }
    remove_dupes(found, |edition| edition.olid().to_string())
}

/// Write both directions for one item. The two catalogs are updated
/// independently; a failure on one side is logged and does not suppress
/// the attempt on the other. There is no transactional coupling, so a
/// partially synchronized item is an accepted, logged outcome.
fn sync_item(
    ol: &impl OpenLibrary,
    wd: &impl Wikidata,
    qid: &str,
    editions: &[Edition],
    dry_run: bool,
    limiter: &mut WriteLimiter,
) {
    for edition in editions {
        if limiter.reached() {
            return;
        }
        let known_qids = edition
            .identifiers
            .get(WIKIDATA_KEY)
            .cloned()
            .unwrap_or_default();
        if known_qids.iter().any(|known| known == qid) {
            warn!("{} already has qid {}", edition.olid(), qid);
            continue;
        }

        let mut updated = edition.clone();
        let qids = updated
            .identifiers
            .entry(WIKIDATA_KEY.to_string())
            .or_default();
        qids.push(qid.to_string());
        if qids.len() > 1 {
            warn!(
                "{} now has multiple ({}) qids ({})",
                edition.olid(),
                qids.len(),
                qids.join(", ")
            );
        }
        if dry_run {
            info!("Dry run, would add {} to {}", qid, edition.olid());
        } else if let Err(e) = ol.save_edition(&updated, OL_SAVE_COMMENT) {
            error!("Failed to save edition {}: {}", edition.olid(), e);
            continue;
        } else {
            debug!("Added {} to {}", qid, edition.olid());
        }
        limiter.record_library();
    }

    for edition in editions {
        if limiter.reached() {
            return;
        }
        if dry_run {
            info!("Dry run, would add {} to {}", edition.olid(), qid);
        } else if let Err(e) =
            wd.add_string_claim(qid, P_OPEN_LIBRARY_ID, edition.olid(), WD_CLAIM_COMMENT)
        {
            error!("Failed to add claim {}={} to {}: {}", P_OPEN_LIBRARY_ID, edition.olid(), qid, e);
            continue;
        } else {
            debug!("Added {} to {}", edition.olid(), qid);
        }
        limiter.record_graph();
    }
}
