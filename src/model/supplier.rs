// src/model/supplier.rs

//! Supplier identification from maintainer/packager free text.
//!
//! Package metadata carries the responsible party as unstructured text,
//! usually `Some Name <address@example.org>`. This module degrades the
//! text to ASCII, pulls out the email address, and classifies the party.

use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

/// Party responsible for a package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Supplier {
    Unknown,
    Person { name: String, email: Option<String> },
    Organization { name: String },
}

impl Supplier {
    /// Classify raw maintainer/packager text.
    ///
    /// More than three whitespace-separated tokens reads as an organization
    /// name, one to three as a person, blank as unknown. Non-ASCII bytes
    /// are stripped rather than failing the record.
    pub fn from_field(raw: &str) -> Self {
        let cleaned = to_ascii(raw);
        let tokens = cleaned.split_whitespace().count();
        if tokens == 0 {
            return Supplier::Unknown;
        }

        let email = extract_email(&cleaned);
        let name = display_name(&cleaned);
        if name.is_empty() {
            return Supplier::Unknown;
        }

        if tokens > 3 {
            Supplier::Organization { name }
        } else {
            Supplier::Person { name, email }
        }
    }

    /// Create an organization supplier, or unknown for blank input.
    pub fn organization(name: &str) -> Self {
        let name = to_ascii(name);
        if name.is_empty() {
            Supplier::Unknown
        } else {
            Supplier::Organization { name }
        }
    }

    /// The supplier's display name, empty for unknown.
    pub fn name(&self) -> &str {
        match self {
            Supplier::Unknown => "",
            Supplier::Person { name, .. } => name,
            Supplier::Organization { name } => name,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Supplier::Unknown)
    }
}

impl fmt::Display for Supplier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Supplier::Unknown => write!(f, "NOASSERTION"),
            Supplier::Person {
                name,
                email: Some(email),
            } => write!(f, "Person: {} ({})", name, email),
            Supplier::Person { name, email: None } => write!(f, "Person: {}", name),
            Supplier::Organization { name } => write!(f, "Organization: {}", name),
        }
    }
}

fn email_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"[A-Za-z0-9!#$%&'*+/=?^_`{|}~.-]+@[A-Za-z0-9-]+(?:\.[A-Za-z0-9-]+)+")
            .expect("hardcoded pattern")
    })
}

/// Strip characters that cannot be represented as printable ASCII.
fn to_ascii(raw: &str) -> String {
    let kept: String = raw
        .chars()
        .filter(|c| c.is_ascii() && (!c.is_ascii_control() || c.is_ascii_whitespace()))
        .collect();
    collapse_spaces(&kept)
}

/// Last email address in the text, if any. When several are listed only
/// one can be attributed, so the final one wins.
fn extract_email(text: &str) -> Option<String> {
    email_re()
        .find_iter(text)
        .last()
        .map(|m| m.as_str().to_string())
}

/// The text with any email address and its angle brackets removed.
fn display_name(text: &str) -> String {
    let without_email = email_re().replace_all(text, "");
    let without_brackets: String = without_email
        .chars()
        .filter(|c| *c != '<' && *c != '>' && *c != '(' && *c != ')')
        .collect();
    collapse_spaces(&without_brackets)
}

fn collapse_spaces(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
