use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Lookup key for a place name: accents stripped, lowercased, only `[a-z0-9]` kept.
///
/// "Saint-Étienne" and "saint etienne" both map to `"saintetienne"`.
pub fn normalize_key(name: &str) -> String {
    name.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        .collect()
}
