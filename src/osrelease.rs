// src/osrelease.rs

//! Host release identity from the os-release file.

use std::collections::HashMap;
use std::path::Path;

/// Parse `<root>/etc/os-release` into a lower-cased key map.
///
/// Values keep their content with surrounding quotes stripped. A missing
/// or unreadable file yields an empty map; the file is a fallback source
/// of distro identity, never a requirement.
pub fn load(root: &Path) -> HashMap<String, String> {
    let path = root.join("etc/os-release");
    let mut metadata = HashMap::new();

    let Ok(content) = std::fs::read_to_string(&path) else {
        return metadata;
    };

    for line in content.lines() {
        if let Some((key, value)) = line.split_once('=') {
            metadata.insert(
                key.trim().to_lowercase(),
                value.replace('"', "").trim().to_string(),
            );
        }
    }

    metadata
}
