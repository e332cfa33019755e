use anyhow::{Context, Result};
use csv::{ReaderBuilder, StringRecordsIntoIter};
use flate2::read::GzDecoder;
use log::error;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::entity::EntityDoc;

/// Streams Wikidata entity documents out of a tab-separated dump file.
///
/// The dump has a header row (skipped) and one entity per line, with the
/// JSON statements document in the second column. A row with too few
/// columns or malformed JSON is logged and skipped; it never aborts the
/// stream. `.gz` inputs are decompressed transparently.
pub struct DumpReader {
    records: StringRecordsIntoIter<Box<dyn Read>>,
    rows_read: u64,
    parse_errors: u64,
}

impl DumpReader {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open dump file: {}", path.display()))?;
        let reader: Box<dyn Read> = if path.extension().is_some_and(|ext| ext == "gz") {
            Box::new(GzDecoder::new(file))
        } else {
            Box::new(file)
        };
        let records = ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(true)
            .flexible(true)
            .quoting(false)
            .from_reader(reader)
            .into_records();
        Ok(Self {
            records,
            rows_read: 0,
            parse_errors: 0,
        })
    }

    /// Next parseable entity, or `None` at end of input.
    pub fn next_entity(&mut self) -> Option<EntityDoc> {
        loop {
            let record = match self.records.next()? {
                Ok(record) => record,
                Err(e) => {
                    self.parse_errors += 1;
                    error!("Error reading dump row: {}", e);
                    continue;
                }
            };
            self.rows_read += 1;
            let Some(raw_json) = record.get(1) else {
                self.parse_errors += 1;
                error!("Dump row {} has no entity JSON column", self.rows_read);
                continue;
            };
            match serde_json::from_str::<EntityDoc>(raw_json) {
                Ok(entity) => return Some(entity),
                Err(e) => {
                    self.parse_errors += 1;
                    error!("Error parsing entity JSON on dump row {}: {}", self.rows_read, e);
                }
            }
        }
    }

    pub fn rows_read(&self) -> u64 {
        self.rows_read
    }

    pub fn parse_errors(&self) -> u64 {
        self.parse_errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    fn write_dump(lines: &[&str]) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dump.tsv");
        let mut file = File::create(&path).unwrap();
        writeln!(file, "id\tentity\tlast_modified").unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
        (dir, path)
    }

    #[test]
    fn malformed_json_rows_are_skipped_not_fatal() {
        let (_dir, path) = write_dump(&[
            "Q1\t{\"id\": \"Q1\", \"statements\": {}}\t2024-01-01",
            "Q2\tnot json at all\t2024-01-01",
            "Q3\t{\"id\": \"Q3\", \"statements\": {}}\t2024-01-01",
        ]);
        let mut reader = DumpReader::open(&path).unwrap();
        assert_eq!(reader.next_entity().unwrap().id, "Q1");
        assert_eq!(reader.next_entity().unwrap().id, "Q3");
        assert!(reader.next_entity().is_none());
        assert_eq!(reader.rows_read(), 3);
        assert_eq!(reader.parse_errors(), 1);
    }

    #[test]
    fn short_rows_are_skipped() {
        let (_dir, path) = write_dump(&["Q1", "Q2\t{\"id\": \"Q2\"}\tx"]);
        let mut reader = DumpReader::open(&path).unwrap();
        assert_eq!(reader.next_entity().unwrap().id, "Q2");
        assert!(reader.next_entity().is_none());
        assert_eq!(reader.parse_errors(), 1);
    }

    #[test]
    fn reads_gzipped_dumps() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dump.tsv.gz");
        let mut encoder = GzEncoder::new(File::create(&path).unwrap(), Compression::default());
        writeln!(encoder, "id\tentity\tlast_modified").unwrap();
        writeln!(encoder, "Q5\t{{\"id\": \"Q5\", \"statements\": {{}}}}\t2024-01-01").unwrap();
        encoder.finish().unwrap();

        let mut reader = DumpReader::open(&path).unwrap();
        assert_eq!(reader.next_entity().unwrap().id, "Q5");
        assert!(reader.next_entity().is_none());
    }

    #[test]
    fn statements_json_with_embedded_tabs_in_quotes_is_not_required() {
        // Dump JSON is compact and tab-free; this guards the simpler case of
        // quotes inside the JSON column surviving the non-quoting reader.
        let (_dir, path) = write_dump(&[
            "Q9\t{\"id\": \"Q9\", \"statements\": {\"P214\": []}}\t2024-01-01",
        ]);
        let mut reader = DumpReader::open(&path).unwrap();
        let entity = reader.next_entity().unwrap();
        assert!(entity.statements.contains_key("P214"));
    }
}
