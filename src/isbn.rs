use crate::util::remove_dupes;

/// Remove hyphens and uppercase. Both catalogs are joined on this form, so
/// the same normalization must be applied to every ISBN before lookup.
pub fn normalize_isbn(isbn: &str) -> String {
    isbn.chars()
        .filter(|c| *c != '-')
        .collect::<String>()
        .to_uppercase()
}

/// Normalize a batch of raw ISBN strings and drop empties and duplicates.
pub fn normalize_isbns<I, S>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let normalized: Vec<String> = raw
        .into_iter()
        .map(|s| normalize_isbn(s.as_ref()))
        .filter(|s| !s.is_empty())
        .collect();
    remove_dupes(normalized, |s| s.clone())
}
