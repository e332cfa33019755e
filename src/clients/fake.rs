//! In-memory clients for job-level tests.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use super::{ClientError, OpenLibrary, SparqlRow, Wikidata};
use crate::records::{Author, Edition};

#[derive(Default)]
pub struct FakeOpenLibrary {
    pub authors: RefCell<HashMap<String, Author>>,
    pub editions_by_isbn: RefCell<HashMap<String, Edition>>,
    /// (olid, comment) for every persisted author, in call order.
    pub saved_authors: RefCell<Vec<(Author, String)>>,
    pub saved_editions: RefCell<Vec<(Edition, String)>>,
    pub fail_saves: Cell<bool>,
}

impl FakeOpenLibrary {
    pub fn with_author(self, author: Author) -> Self {
        self.authors
            .borrow_mut()
            .insert(author.olid().to_string(), author.clone());
        self
    }

    pub fn with_edition(self, isbn: &str, edition: Edition) -> Self {
        self.editions_by_isbn
            .borrow_mut()
            .insert(isbn.to_string(), edition);
        self
    }
}

impl OpenLibrary for FakeOpenLibrary {
    fn get_author(&self, olid: &str) -> Result<Option<Author>, ClientError> {
        Ok(self.authors.borrow().get(olid).cloned())
    }

    fn save_author(&self, author: &Author, comment: &str) -> Result<(), ClientError> {
        if self.fail_saves.get() {
            return Err(ClientError::Status {
                status: 500,
                url: format!("fake:{}", author.key),
            });
        }
        self.saved_authors
            .borrow_mut()
            .push((author.clone(), comment.to_string()));
        Ok(())
    }

    fn get_edition_by_isbn(&self, isbn: &str) -> Result<Option<Edition>, ClientError> {
        Ok(self.editions_by_isbn.borrow().get(isbn).cloned())
    }

    fn save_edition(&self, edition: &Edition, comment: &str) -> Result<(), ClientError> {
        if self.fail_saves.get() {
            return Err(ClientError::Status {
                status: 500,
                url: format!("fake:{}", edition.key),
            });
        }
        self.saved_editions
            .borrow_mut()
            .push((edition.clone(), comment.to_string()));
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeWikidata {
    pub rows: Vec<SparqlRow>,
    /// (qid, property, value) for every claim written, in call order.
    pub claims: RefCell<Vec<(String, String, String)>>,
    pub fail_claims: Cell<bool>,
}

impl FakeWikidata {
    pub fn with_rows(rows: Vec<SparqlRow>) -> Self {
        Self {
            rows,
            ..Self::default()
        }
    }
}

impl Wikidata for FakeWikidata {
    fn select(&self, _query: &str) -> Result<Vec<SparqlRow>, ClientError> {
        Ok(self.rows.clone())
    }

    fn add_string_claim(
        &self,
        qid: &str,
        property_id: &str,
        value: &str,
        _comment: &str,
    ) -> Result<(), ClientError> {
        if self.fail_claims.get() {
            return Err(ClientError::Status {
                status: 500,
                url: format!("fake:{}", qid),
            });
        }
        self.claims.borrow_mut().push((
            qid.to_string(),
            property_id.to_string(),
            value.to_string(),
        ));
        Ok(())
    }
}

pub fn sparql_row(pairs: &[(&str, &str)]) -> SparqlRow {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}
