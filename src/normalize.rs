use unicode_normalization::UnicodeNormalization;

/// Fold text into a lookup key: lowercase, strip diacritics, ASCII only.
///
/// The importer applies this when storing a city and the dispatcher applies
/// it again at query time, so "São Paulo", "SAO PAULO" and "sao paulo" all
/// land on the same key. NFD decomposition splits accented letters into a
/// base letter plus combining marks; dropping every non-ASCII char then
/// removes the marks.
pub fn normalize_text(text: &str) -> String {
    text.to_lowercase()
        .nfd()
        .filter(|c| c.is_ascii())
        .collect()
}
