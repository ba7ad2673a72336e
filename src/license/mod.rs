// src/license/mod.rs

//! License canonicalization.
//!
//! Raw license text from package metadata is matched against the
//! canonical identifier registry; compound expressions joined by
//! `OR`/`AND`/`WITH` resolve part-wise. Unresolvable text falls back to
//! `NOASSERTION` with an explanatory comment, never an error.

pub mod registry;

pub use registry::LicenseRegistry;

use crate::model::NOASSERTION;

/// Outcome of resolving raw license text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LicenseResolution {
    /// Canonical identifier or expression, or `NOASSERTION`.
    pub canonical: String,
    /// The raw text already was the canonical form, byte for byte.
    pub exact: bool,
    /// At least one matched identifier is deprecated.
    pub deprecated: bool,
}

impl LicenseResolution {
    fn noassertion() -> Self {
        Self {
            canonical: NOASSERTION.to_string(),
            exact: false,
            deprecated: false,
        }
    }
}

/// Resolve raw license text to a canonical identifier or expression.
///
/// A compound expression resolves only if every operand does; otherwise
/// the whole text is unresolvable and canonicalizes to `NOASSERTION`.
pub fn resolve(registry: &LicenseRegistry, raw: &str) -> LicenseResolution {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == NOASSERTION {
        return LicenseResolution::noassertion();
    }

    let mut canonical_parts: Vec<String> = Vec::new();
    let mut deprecated = false;

    for token in trimmed.split_whitespace() {
        let bare = token.trim_matches(|c| c == '(' || c == ')');
        if bare.is_empty() {
            continue;
        }
        if is_operator(bare) {
            canonical_parts.push(bare.to_uppercase());
            continue;
        }
        match registry.lookup(bare) {
            Some(id) => {
                deprecated |= registry.is_deprecated(id);
                canonical_parts.push(id.to_string());
            }
            None => return LicenseResolution::noassertion(),
        }
    }

    if canonical_parts.is_empty() {
        return LicenseResolution::noassertion();
    }

    let canonical = canonical_parts.join(" ");
    let exact = canonical == trimmed;
    LicenseResolution {
        canonical,
        exact,
        deprecated,
    }
}

fn is_operator(token: &str) -> bool {
    token.eq_ignore_ascii_case("OR")
        || token.eq_ignore_ascii_case("AND")
        || token.eq_ignore_ascii_case("WITH")
}

/// Build the explanatory comment for a resolved license, if any.
///
/// The rule is applied uniformly by every ecosystem: a successful
/// canonicalization gets a provenance note, any divergence between the
/// declared text and the canonical form gets a mismatch note, and a
/// deprecated identifier gets a deprecation note. Unresolvable text gets
/// the mismatch note alone, without a provenance claim.
pub fn comment(subject: &str, raw: &str, resolution: &LicenseResolution) -> Option<String> {
    let raw = raw.trim();
    let mut notes: Vec<String> = Vec::new();

    if resolution.canonical != NOASSERTION {
        notes.push("License information was automatically extracted from the package metadata.".to_string());
    }
    if !raw.is_empty() && raw != resolution.canonical {
        notes.push(format!(
            "{} declares {} which is not a valid SPDX license identifier or expression.",
            subject, raw
        ));
    }
    if resolution.deprecated {
        notes.push(format!(
            "{} is a deprecated SPDX license identifier.",
            resolution.canonical
        ));
    }

    if notes.is_empty() {
        None
    } else {
        Some(notes.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_identifier_round_trips() {
        let registry = LicenseRegistry::new();
        let resolution = resolve(&registry, "MIT");
        assert_eq!(resolution.canonical, "MIT");
        assert!(resolution.exact);
        assert!(!resolution.deprecated);

        let note = comment("widget", "MIT", &resolution).unwrap();
        assert!(note.contains("automatically extracted"));
        assert!(!note.contains("not a valid"));
    }

    #[test]
    fn test_case_mismatch_canonicalizes_with_note() {
        let registry = LicenseRegistry::new();
        let resolution = resolve(&registry, "mit");
        assert_eq!(resolution.canonical, "MIT");
        assert!(!resolution.exact);

        let note = comment("widget", "mit", &resolution).unwrap();
        assert!(note.contains("widget declares mit"));
    }

    #[test]
    fn test_unknown_text_is_noassertion() {
        let registry = LicenseRegistry::new();
        let resolution = resolve(&registry, "Some-Nonstandard-Text");
        assert_eq!(resolution.canonical, NOASSERTION);
        assert!(!resolution.exact);

        let note = comment("widget", "Some-Nonstandard-Text", &resolution).unwrap();
        assert!(note.contains("not a valid"));
        assert!(!note.contains("automatically extracted"));
    }

    #[test]
    fn test_empty_text_has_no_comment() {
        let registry = LicenseRegistry::new();
        let resolution = resolve(&registry, "");
        assert_eq!(resolution.canonical, NOASSERTION);
        assert!(comment("widget", "", &resolution).is_none());
    }

    #[test]
    fn test_expression_resolves_partwise() {
        let registry = LicenseRegistry::new();
        let resolution = resolve(&registry, "MIT OR Apache-2.0");
        assert_eq!(resolution.canonical, "MIT OR Apache-2.0");
        assert!(resolution.exact);
    }

    #[test]
    fn test_expression_with_unknown_operand_fails_whole() {
        let registry = LicenseRegistry::new();
        let resolution = resolve(&registry, "MIT OR Mystery-License");
        assert_eq!(resolution.canonical, NOASSERTION);
    }

    #[test]
    fn test_deprecated_identifier_is_flagged() {
        let registry = LicenseRegistry::new();
        let resolution = resolve(&registry, "GPL-2.0");
        assert_eq!(resolution.canonical, "GPL-2.0");
        assert!(resolution.exact);
        assert!(resolution.deprecated);

        let note = comment("widget", "GPL-2.0", &resolution).unwrap();
        assert!(note.contains("deprecated"));
    }

    #[test]
    fn test_parenthesized_expression() {
        let registry = LicenseRegistry::new();
        let resolution = resolve(&registry, "(MIT OR GPL-2.0-only)");
        assert_eq!(resolution.canonical, "MIT OR GPL-2.0-only");
        assert!(!resolution.exact);
    }
}
