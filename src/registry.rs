/// Wikidata property that carries an Open Library ID (author OLIDs on
/// people, edition OLIDs on edition items).
pub const P_OPEN_LIBRARY_ID: &str = "P648";

/// Remote-identifier key under which the Wikidata QID is stored on an
/// Open Library record.
pub const WIKIDATA_KEY: &str = "wikidata";

// Wikidata only exposes the P### property id in its JSON, so this table is
// our only way to target specific remote ID types. It is defined once and
// never mutated.
pub const IDENTIFIER_REGISTRY: [(&str, &str); 14] = [
    ("P214", "viaf"),
    ("P2607", "bookbrainz"),
    ("P434", "musicbrainz"),
    ("P2963", "goodreads"),
    ("P213", "isni"),
    ("P345", "imdb"),
    ("P244", "lc_naf"),
    ("P7400", "librarything"),
    ("P1899", "librivox"),
    ("P1938", "project_gutenberg"),
    ("P396", "opac_sbn"),
    ("P4862", "amazon"),
    ("P12430", "storygraph"),
    ("P2397", "youtube"),
];

/// Open Library identifier name for a Wikidata property id, if the
/// property is one we synchronize.
pub fn identifier_name(property_id: &str) -> Option<&'static str> {
    IDENTIFIER_REGISTRY
        .iter()
        .find(|(pid, _)| *pid == property_id)
        .map(|(_, name)| *name)
}

/// All Open Library identifier names the registry covers, in table order.
pub fn identifier_names() -> impl Iterator<Item = &'static str> {
    IDENTIFIER_REGISTRY.iter().map(|(_, name)| *name)
}
