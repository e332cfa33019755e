use anyhow::{Context, Result};
use csv::Writer;
use log::error;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Reconciliation anomalies tracked in the problems sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProblemKind {
    MultipleOpenlibraryAuthorsForOneWikidataRow,
    MultipleWikidataRemoteIdsForOneAuthor,
    OpenlibraryWikidataRemoteIdCollision,
}

impl ProblemKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ProblemKind::MultipleOpenlibraryAuthorsForOneWikidataRow => {
                "multiple_openlibrary_authors_for_one_wikidata_row"
            }
            ProblemKind::MultipleWikidataRemoteIdsForOneAuthor => {
                "multiple_wikidata_remote_ids_for_one_author"
            }
            ProblemKind::OpenlibraryWikidataRemoteIdCollision => {
                "openlibrary_wikidata_remote_id_collision"
            }
        }
    }
}

/// Append-only CSV sink for one job run. Rows are created once per anomaly
/// and never rewritten. Author flows carry a display-name column, edition
/// flows do not. Creating the sink is the only fallible setup step; writes
/// after that flush per row and surface failures in the log only.
pub struct ProblemReporter {
    writer: Writer<File>,
    path: PathBuf,
    with_name_column: bool,
    rows_written: usize,
}

impl ProblemReporter {
    pub fn create(path: &Path, with_name_column: bool) -> Result<Self> {
        let file = File::create(path)
            .with_context(|| format!("Failed to create problems sheet: {}", path.display()))?;
        let mut writer = Writer::from_writer(file);
        if with_name_column {
            writer.write_record(["wdid", "olid", "author_name", "problem", "identifier", "details"])?;
        } else {
            writer.write_record(["wdid", "olid", "problem", "identifier", "details"])?;
        }
        writer.flush()?;
        Ok(Self {
            writer,
            path: path.to_path_buf(),
            with_name_column,
            rows_written: 0,
        })
    }

    /// Append one anomaly row and log it at error severity.
    pub fn report(
        &mut self,
        wd_id: &str,
        olid: &str,
        name: Option<&str>,
        kind: ProblemKind,
        identifier: &str,
        details: &str,
    ) {
        error!(
            "{} for {} ({}), wd {}: {}: {}",
            kind.as_str(),
            olid,
            name.unwrap_or(""),
            wd_id,
            identifier,
            details
        );
        let row: Vec<&str> = if self.with_name_column {
            vec![wd_id, olid, name.unwrap_or(""), kind.as_str(), identifier, details]
        } else {
            vec![wd_id, olid, kind.as_str(), identifier, details]
        };
        if let Err(e) = self
            .writer
            .write_record(&row)
            .and_then(|_| self.writer.flush().map_err(csv::Error::from))
        {
            error!("Failed to append to problems sheet {}: {}", self.path.display(), e);
            return;
        }
        self.rows_written += 1;
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn rows_written(&self) -> usize {
        self.rows_written
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn writes_header_and_rows_with_name_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("problems.csv");
        let mut reporter = ProblemReporter::create(&path, true).unwrap();
        reporter.report(
            "Q42",
            "OL2162284A",
            Some("Douglas Adams"),
            ProblemKind::OpenlibraryWikidataRemoteIdCollision,
            "viaf",
            r#"{"ol": "113230702", "wd": "999"}"#,
        );
        assert_eq!(reporter.rows_written(), 1);

        let content = fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert_eq!(
            lines.next().unwrap(),
            "wdid,olid,author_name,problem,identifier,details"
        );
        let row = lines.next().unwrap();
        assert!(row.starts_with("Q42,OL2162284A,Douglas Adams,openlibrary_wikidata_remote_id_collision,viaf,"));
    }

    #[test]
    fn edition_flow_header_has_no_name_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("problems.csv");
        let reporter = ProblemReporter::create(&path, false).unwrap();
        drop(reporter);
        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().next().unwrap(), "wdid,olid,problem,identifier,details");
    }
}
