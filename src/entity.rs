use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::OnceLock;

use crate::records::RemoteIds;
use crate::registry::{self, P_OPEN_LIBRARY_ID};
use crate::util::remove_dupes;

/// One Wikidata entity as found in the dump: a stable QID plus its
/// statements, keyed by property id. Immutable once parsed.
#[derive(Debug, Clone, Deserialize)]
pub struct EntityDoc {
    pub id: String,
    #[serde(default)]
    pub statements: HashMap<String, Vec<Statement>>,
}

/// A single claim. Every section is optional on purpose: malformed
/// statements must deserialize cleanly and then fail validation, rather
/// than abort the row.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Statement {
    #[serde(default)]
    pub property: Option<PropertyRef>,
    #[serde(default)]
    pub value: Option<StatementValue>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PropertyRef {
    #[serde(default)]
    pub id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatementValue {
    #[serde(default)]
    pub content: Option<Value>,
}

/// A statement is trusted only if it declares the property we are querying
/// for and carries a non-empty string payload. Anything else is excluded,
/// not raised.
pub fn validate_statement(statement: &Statement, property_id: &str) -> bool {
    let declared = statement
        .property
        .as_ref()
        .and_then(|p| p.id.as_deref());
    if declared != Some(property_id) {
        return false;
    }
    statement_content(statement).is_some()
}

fn statement_content(statement: &Statement) -> Option<&str> {
    statement
        .value
        .as_ref()
        .and_then(|v| v.content.as_ref())
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

impl EntityDoc {
    /// Validated string payloads for one property, in statement order.
    pub fn statement_values(&self, property_id: &str) -> Vec<&str> {
        self.statements
            .get(property_id)
            .map(|claims| {
                claims
                    .iter()
                    .filter(|s| validate_statement(s, property_id))
                    .filter_map(statement_content)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Distinct Open Library author OLIDs claimed by this entity. Payloads
    /// that don't look like author OLIDs are dropped silently.
    pub fn openlibrary_author_ids(&self) -> Vec<String> {
        static AUTHOR_OLID: OnceLock<Regex> = OnceLock::new();
        let pattern = AUTHOR_OLID.get_or_init(|| Regex::new(r"^OL\d+A$").expect("valid author olid pattern"));
        let olids: Vec<String> = self
            .statement_values(P_OPEN_LIBRARY_ID)
            .into_iter()
            .filter(|v| pattern.is_match(v))
            .map(str::to_string)
            .collect();
        remove_dupes(olids, |olid| olid.clone())
    }
}

/// A registry identifier that carried more than one distinct value on a
/// single entity. Never resolved by picking one; reported and excluded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiValuedId {
    pub identifier: &'static str,
    pub values: Vec<String>,
}

/// Harvest the registry-scoped remote IDs from an entity's statements.
///
/// Identifiers with exactly one distinct valid value land in the returned
/// map; identifiers with several distinct values are returned separately as
/// anomalies and excluded from the map entirely.
pub fn harvest_remote_ids(entity: &EntityDoc) -> (RemoteIds, Vec<MultiValuedId>) {
    let mut incoming = RemoteIds::new();
    let mut anomalies = Vec::new();
    for (property_id, identifier) in registry::IDENTIFIER_REGISTRY {
        let values: Vec<String> = entity
            .statement_values(property_id)
            .into_iter()
            .map(str::to_string)
            .collect();
        let mut distinct = remove_dupes(values, |v| v.clone());
        match distinct.len() {
            0 => {}
            1 => {
                incoming.insert(identifier.to_string(), distinct.remove(0));
            }
            _ => anomalies.push(MultiValuedId {
                identifier,
                values: distinct,
            }),
        }
    }
    (incoming, anomalies)
}
