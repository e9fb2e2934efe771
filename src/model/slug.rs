//! Slug derivation for tour names.
//!
//! Runs before every insert; derivation is total for any non-empty name,
//! which upstream validation already guarantees.

/// Derives a URL-safe slug from a display name.
///
/// Lowercases the name and collapses every run of whitespace or punctuation
/// into a single `-`, with no leading or trailing separator. Deterministic
/// and idempotent: re-deriving from the same name yields the same slug.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_separator = false;

    for c in name.chars() {
        if c.is_alphanumeric() {
            if pending_separator && !slug.is_empty() {
                slug.push('-');
            }
            pending_separator = false;
            for lower in c.to_lowercase() {
                slug.push(lower);
            }
        } else {
            pending_separator = true;
        }
    }

    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_lowercases_and_joins() {
        assert_eq!(slugify("The Forest Hiker"), "the-forest-hiker");
    }

    #[test]
    fn test_slugify_collapses_punctuation_runs() {
        assert_eq!(slugify("The  Snow,  Adventurer!"), "the-snow-adventurer");
    }

    #[test]
    fn test_slugify_no_edge_separators() {
        assert_eq!(slugify("  The City Wanderer  "), "the-city-wanderer");
        assert!(!slugify("...Sea Explorer...").starts_with('-'));
        assert!(!slugify("...Sea Explorer...").ends_with('-'));
    }

    #[test]
    fn test_slugify_idempotent() {
        let first = slugify("The Park Camper");
        assert_eq!(slugify(&first), first);
    }

    #[test]
    fn test_slugify_keeps_digits() {
        assert_eq!(slugify("Tour 2024: Northern Lights"), "tour-2024-northern-lights");
    }
}
