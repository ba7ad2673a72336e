// src/metadata.rs

//! Attribute maps extracted from package-manager query output.
//!
//! Each ecosystem's "query package info" command prints one package's
//! metadata as text; this module turns those lines into a key/value map.
//! Two parsing styles exist: strict `Key: value` per line, and a
//! continuation style for tools that wrap long field values across lines.

use std::collections::HashMap;

/// Key/value mapping parsed from one package's query output.
///
/// Lookups are whitespace-trimmed and absent keys yield an empty string,
/// so callers can chain field accesses without existence checks. An empty
/// map is the "package not installed" signal.
#[derive(Debug, Clone, Default)]
pub struct AttributeMap {
    fields: HashMap<String, String>,
}

impl AttributeMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(key.into(), value.into());
    }

    /// Trimmed value for `key`, or `""` when absent.
    pub fn get(&self, key: &str) -> &str {
        self.fields.get(key).map(|v| v.trim()).unwrap_or("")
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }
}

/// How lines lacking a `Key:` separator are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Continuation {
    /// Separator-less lines are ignored.
    Ignore,
    /// Separator-less lines append (space-joined) to the value of the most
    /// recently seen key.
    Join,
}

/// Parse `Key: value` lines into an attribute map.
///
/// Malformed lines (no separator) are skipped or joined per `continuation`;
/// a repeated key overwrites the earlier value.
pub fn parse_key_value(lines: &[String], continuation: Continuation) -> AttributeMap {
    let mut map = AttributeMap::new();
    let mut current_key: Option<String> = None;

    for line in lines {
        if let Some((key, value)) = line.split_once(':') {
            let key = key.trim().to_string();
            map.insert(key.clone(), value.trim().to_string());
            current_key = Some(key);
        } else if continuation == Continuation::Join {
            if let Some(key) = &current_key {
                let joined = format!("{} {}", map.get(key), line.trim());
                map.insert(key.clone(), joined.trim().to_string());
            }
        }
    }

    map
}
