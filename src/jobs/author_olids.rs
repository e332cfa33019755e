//! Lists Open Library authors that Wikidata already cross-references but
//! that are missing the reciprocal `wikidata` remote ID. Emits a TSV of
//! `olid <TAB> qid` pairs for review; never writes to either catalog.

use anyhow::{Context, Result};
use log::{debug, error, info, warn};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use super::progress_bar;
use crate::clients::{qid_from_uri, OpenLibrary, Wikidata};
use crate::context::RunContext;
use crate::registry::WIKIDATA_KEY;

// Items that carry an Open Library author ID and authored at least one work.
const QUERY: &str = "
SELECT DISTINCT ?item ?olid WHERE {
    ?item wdt:P648 ?olid.              # Open Library ID: ?olid
    ?work (wdt:P50|wdt:P2093) ?item.   # author | author name string
}
";

pub fn run(
    ctx: &mut RunContext,
    ol: &impl OpenLibrary,
    wd: &impl Wikidata,
    out_path: &Path,
) -> Result<()> {
    let rows = wd
        .select(QUERY)
        .context("SPARQL query for cross-referenced authors failed")?;
    info!("Found {} authors with Open Library ids", rows.len());

    let out = File::create(out_path)
        .with_context(|| format!("Failed to create output file: {}", out_path.display()))?;
    let mut out = BufWriter::new(out);

    let bar = progress_bar(rows.len() as u64);
    let mut written = 0usize;
    let mut redirects = 0usize;
    let mut missing = 0usize;

    for row in &rows {
        bar.inc(1);
        let (Some(olid), Some(item)) = (row.get("olid"), row.get("item")) else {
            continue;
        };
        let qid = qid_from_uri(item);

        let author = match ol.get_author(olid) {
            Ok(Some(author)) => author,
            Ok(None) => {
                warn!("No Open Library author {} for {}", olid, qid);
                missing += 1;
                continue;
            }
            Err(e) => {
                error!("Failed to fetch author {} for {}: {}", olid, qid, e);
                continue;
            }
        };
        if author.is_redirect() {
            debug!("{} is a redirect, skipping", olid);
            redirects += 1;
            continue;
        }
        if !author.remote_ids.contains_key(WIKIDATA_KEY) {
            writeln!(out, "{}\t{}", olid, qid)?;
            written += 1;
        }
    }
    bar.finish_and_clear();
    out.flush()?;

    info!(
        "Wrote {} author pair(s) to {} ({} redirect(s), {} missing author(s), {} problem row(s))",
        written,
        out_path.display(),
        redirects,
        missing,
        ctx.reporter.rows_written()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::fake::{sparql_row, FakeOpenLibrary, FakeWikidata};
    use crate::records::Author;
    use serde_json::json;
    use std::fs;

    fn author(olid: &str, doc: serde_json::Value) -> Author {
        let mut base = json!({"key": format!("/authors/{}", olid), "name": olid});
        base.as_object_mut()
            .unwrap()
            .extend(doc.as_object().unwrap().clone());
        serde_json::from_value(base).unwrap()
    }

    #[test]
    fn emits_pairs_only_for_authors_missing_the_cross_reference() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = RunContext::create(dir.path(), "author-olids", true).unwrap();
        let ol = FakeOpenLibrary::default()
            .with_author(author("OL1A", json!({})))
            .with_author(author("OL2A", json!({"remote_ids": {"wikidata": "Q2"}})))
            .with_author(author("OL3A", json!({"type": {"key": "/type/redirect"}})));
        let wd = FakeWikidata::with_rows(vec![
            sparql_row(&[("item", "http://www.wikidata.org/entity/Q1"), ("olid", "OL1A")]),
            sparql_row(&[("item", "http://www.wikidata.org/entity/Q2"), ("olid", "OL2A")]),
            sparql_row(&[("item", "http://www.wikidata.org/entity/Q3"), ("olid", "OL3A")]),
            sparql_row(&[("item", "http://www.wikidata.org/entity/Q4"), ("olid", "OL4A")]),
        ]);

        let out_path = dir.path().join("authors.tsv");
        run(&mut ctx, &ol, &wd, &out_path).unwrap();

        let content = fs::read_to_string(&out_path).unwrap();
        // Q2 already cross-referenced, Q3 is a redirect, Q4 has no author.
        assert_eq!(content, "OL1A\tQ1\n");
        assert!(ol.saved_authors.borrow().is_empty());
        assert!(wd.claims.borrow().is_empty());
    }
}
