//! Title comparison for taxonomy lookups.
//!
//! Majors, categories and services are referenced by human-entered titles.
//! Administrative writes match exactly; seller-facing flows tolerate casing and
//! surrounding whitespace.

/// Trimmed, lower-cased form of a title.
#[must_use]
pub fn normalize_title(title: &str) -> String {
    title.trim().to_lowercase()
}

/// Case-sensitive exact match.
#[must_use]
pub fn titles_match(stored: &str, wanted: &str) -> bool {
    stored == wanted
}

/// Match ignoring case and surrounding whitespace.
#[must_use]
pub fn titles_match_ignore_case(stored: &str, wanted: &str) -> bool {
    normalize_title(stored) == normalize_title(wanted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_is_case_sensitive() {
        assert!(titles_match("Engineering", "Engineering"));
        assert!(!titles_match("Engineering", "engineering"));
        assert!(!titles_match("Engineering", " Engineering"));
    }

    #[test]
    fn test_ignore_case() {
        assert!(titles_match_ignore_case("Engineering", "  engineering "));
        assert!(titles_match_ignore_case("Teknik Sipil", "TEKNIK SIPIL"));
        assert!(!titles_match_ignore_case("Engineering", "Engineer"));
    }
}
