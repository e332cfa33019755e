use crate::records::RemoteIds;
use crate::registry;

/// A registry identifier present on both sides with differing values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdConflict {
    pub identifier: &'static str,
    pub existing: String,
    pub incoming: String,
}

#[derive(Debug, Clone)]
pub struct MergeResult {
    pub ids: RemoteIds,
    /// Number of identifiers newly added by the merge, or -1 when the merge
    /// was aborted because of conflicts.
    pub update_count: i64,
    pub conflicts: Vec<IdConflict>,
}

/// Merge incoming remote IDs into an existing map, identifier by identifier.
///
/// Only identifier names from the registry are ever considered, so unknown
/// keys in `incoming` can never leak into the output. Values present on both
/// sides with equal content are left alone and not counted as updates. Any
/// exact-value collision aborts the merge as a whole: the result carries the
/// original `existing` map unchanged and an update count of -1, with the
/// conflicts returned for reporting. Nothing is ever silently overwritten.
pub fn merge_remote_ids(existing: &RemoteIds, incoming: &RemoteIds) -> MergeResult {
    let mut merged = existing.clone();
    let mut update_count: i64 = 0;
    let mut conflicts = Vec::new();

    for identifier in registry::identifier_names() {
        match (existing.get(identifier), incoming.get(identifier)) {
            (Some(ours), Some(theirs)) if ours != theirs => {
                conflicts.push(IdConflict {
                    identifier,
                    existing: ours.clone(),
                    incoming: theirs.clone(),
                });
            }
            (None, Some(theirs)) => {
                merged.insert(identifier.to_string(), theirs.clone());
                update_count += 1;
            }
            // Already synchronized, or absent from the incoming side.
            _ => {}
        }
    }

    if !conflicts.is_empty() {
        return MergeResult {
            ids: existing.clone(),
            update_count: -1,
            conflicts,
        };
    }
    MergeResult {
        ids: merged,
        update_count,
        conflicts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(pairs: &[(&str, &str)]) -> RemoteIds {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn adds_missing_identifiers_and_counts_them() {
        let existing = ids(&[("viaf", "123")]);
        let incoming = ids(&[("viaf", "123"), ("amazon", "B01")]);
        let result = merge_remote_ids(&existing, &incoming);
        assert_eq!(result.ids, ids(&[("viaf", "123"), ("amazon", "B01")]));
        assert_eq!(result.update_count, 1);
        assert!(result.conflicts.is_empty());
    }

    #[test]
    fn conflict_aborts_whole_merge() {
        let existing = ids(&[("viaf", "123")]);
        let incoming = ids(&[("viaf", "999")]);
        let result = merge_remote_ids(&existing, &incoming);
        assert_eq!(result.ids, existing);
        assert_eq!(result.update_count, -1);
        assert_eq!(
            result.conflicts,
            vec![IdConflict {
                identifier: "viaf",
                existing: "123".into(),
                incoming: "999".into(),
            }]
        );
    }

    #[test]
    fn conflict_discards_otherwise_mergeable_additions() {
        let existing = ids(&[("viaf", "123"), ("isni", "0000")]);
        let incoming = ids(&[("viaf", "999"), ("amazon", "B01"), ("goodreads", "42")]);
        let result = merge_remote_ids(&existing, &incoming);
        // The partial merge must not survive the abort.
        assert_eq!(result.ids, existing);
        assert_eq!(result.update_count, -1);
    }

    #[test]
    fn unregistered_keys_never_reach_the_output() {
        let existing = ids(&[]);
        let incoming = ids(&[("viaf", "123"), ("wikidata", "Q42"), ("bogus", "x")]);
        let result = merge_remote_ids(&existing, &incoming);
        assert_eq!(result.ids, ids(&[("viaf", "123")]));
        assert_eq!(result.update_count, 1);
    }

    #[test]
    fn equal_values_are_not_counted_as_updates() {
        let existing = ids(&[("viaf", "123"), ("imdb", "nm001")]);
        let incoming = ids(&[("viaf", "123"), ("imdb", "nm001")]);
        let result = merge_remote_ids(&existing, &incoming);
        assert_eq!(result.ids, existing);
        assert_eq!(result.update_count, 0);
    }

    #[test]
    fn empty_incoming_is_a_noop() {
        let existing = ids(&[("viaf", "123")]);
        let result = merge_remote_ids(&existing, &ids(&[]));
        assert_eq!(result.ids, existing);
        assert_eq!(result.update_count, 0);
    }
}
