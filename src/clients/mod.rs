use std::collections::HashMap;
use thiserror::Error;

use crate::records::{Author, Edition};

pub mod openlibrary;
pub mod wikidata;

#[cfg(test)]
pub mod fake;

pub use openlibrary::HttpOpenLibrary;
pub use wikidata::HttpWikidata;

/// One SPARQL result row, keyed by variable name. Unbound or empty
/// variables are absent from the map.
pub type SparqlRow = HashMap<String, String>;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("http status {status} from {url}")]
    Status { status: u16, url: String },
    #[error("transport failure for {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: Box<ureq::Error>,
    },
    #[error("unexpected payload from {url}: {detail}")]
    Payload { url: String, detail: String },
    #[error("missing credentials: set the {0} environment variable")]
    Credentials(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// The Library side: record fetch by natural key and guarded persistence.
/// Gets return `None` for a missing counterpart; that is expected noise,
/// not an error.
pub trait OpenLibrary {
    fn get_author(&self, olid: &str) -> Result<Option<Author>, ClientError>;
    fn save_author(&self, author: &Author, comment: &str) -> Result<(), ClientError>;
    fn get_edition_by_isbn(&self, isbn: &str) -> Result<Option<Edition>, ClientError>;
    fn save_edition(&self, edition: &Edition, comment: &str) -> Result<(), ClientError>;
}

/// The Knowledge Graph side: query endpoint plus claim write-back.
pub trait Wikidata {
    fn select(&self, query: &str) -> Result<Vec<SparqlRow>, ClientError>;
    fn add_string_claim(
        &self,
        qid: &str,
        property_id: &str,
        value: &str,
        comment: &str,
    ) -> Result<(), ClientError>;
}

/// Trailing path segment of an entity URI, e.g. "Q42" from
/// "http://www.wikidata.org/entity/Q42". SPARQL binds item variables as
/// full URIs.
pub fn qid_from_uri(uri: &str) -> &str {
    uri.rsplit('/').next().unwrap_or(uri)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qid_from_uri_handles_uris_and_bare_ids() {
        assert_eq!(qid_from_uri("http://www.wikidata.org/entity/Q42"), "Q42");
        assert_eq!(qid_from_uri("Q42"), "Q42");
    }
}
