use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// A record's attached external cross-references, keyed by identifier-type
/// name ("viaf", "amazon", "wikidata", ...). One value per type on authors.
pub type RemoteIds = BTreeMap<String, String>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TypeRef {
    pub key: String,
}

/// An Open Library author record. Fields we don't model are kept in
/// `extra` so a save round-trips the full document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Author {
    pub key: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<TypeRef>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub remote_ids: RemoteIds,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Author {
    /// Stable local identifier, e.g. "OL26320A" from "/authors/OL26320A".
    pub fn olid(&self) -> &str {
        self.key.rsplit('/').next().unwrap_or(&self.key)
    }

    pub fn is_redirect(&self) -> bool {
        self.kind
            .as_ref()
            .map(|t| t.key == "/type/redirect")
            .unwrap_or(false)
    }
}

/// An Open Library edition record. Unlike author `remote_ids`, the
/// `identifiers` map holds a list of values per identifier type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edition {
    pub key: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub identifiers: BTreeMap<String, Vec<String>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Edition {
    /// Stable local identifier, e.g. "OL7353617M" from "/books/OL7353617M".
    pub fn olid(&self) -> &str {
        self.key.rsplit('/').next().unwrap_or(&self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn author_olid_and_redirect() {
        let author: Author = serde_json::from_value(json!({
            "key": "/authors/OL26320A",
            "name": "J. R. R. Tolkien",
            "type": {"key": "/type/redirect"},
            "remote_ids": {"viaf": "95218067"}
        }))
        .unwrap();
        assert_eq!(author.olid(), "OL26320A");
        assert!(author.is_redirect());
        assert_eq!(author.remote_ids.get("viaf").map(String::as_str), Some("95218067"));
    }

    #[test]
    fn unknown_fields_round_trip_on_save() {
        let doc = json!({
            "key": "/authors/OL1A",
            "name": "Somebody",
            "birth_date": "1920",
            "remote_ids": {}
        });
        let author: Author = serde_json::from_value(doc).unwrap();
        let back = serde_json::to_value(&author).unwrap();
        assert_eq!(back.get("birth_date"), Some(&json!("1920")));
    }

    #[test]
    fn edition_identifiers_are_lists() {
        let edition: Edition = serde_json::from_value(json!({
            "key": "/books/OL7353617M",
            "title": "The Hobbit",
            "identifiers": {"goodreads": ["1540236"], "wikidata": ["Q188745"]}
        }))
        .unwrap();
        assert_eq!(edition.olid(), "OL7353617M");
        assert_eq!(edition.identifiers["wikidata"], vec!["Q188745"]);
    }
}
