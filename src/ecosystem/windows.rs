// src/ecosystem/windows.rs

//! Windows-style ecosystem: captured product listings only.
//!
//! There is no query tool to shell out to, so live single-package and
//! whole-system modes are unavailable. Snapshot files are product
//! exports, UTF-16LE encoded, one `Key : value` block per product with
//! blank lines between blocks. Two installed versions of one product are
//! common, so snapshot edges carry id disambiguators.

use crate::ecosystem::{Ecosystem, EcosystemId};
use crate::error::{Error, Result};
use crate::gateway::CommandGateway;
use crate::license::LicenseRegistry;
use crate::metadata::AttributeMap;
use crate::model::{PackageKind, PackageRecord, Supplier, normalize_name};
use std::collections::HashMap;
use std::path::Path;

pub struct WindowsEcosystem;

impl WindowsEcosystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for WindowsEcosystem {
    fn default() -> Self {
        Self::new()
    }
}

impl Ecosystem for WindowsEcosystem {
    fn id(&self) -> EcosystemId {
        EcosystemId::Windows
    }

    fn query_package(&self, _gateway: &dyn CommandGateway, _name: &str) -> Result<AttributeMap> {
        Err(Error::Unsupported(
            "package queries are not available for the windows ecosystem".to_string(),
        ))
    }

    fn list_all(&self, _gateway: &dyn CommandGateway) -> Result<Vec<String>> {
        Err(Error::Unsupported(
            "system enumeration is not available for the windows ecosystem".to_string(),
        ))
    }

    fn parse_dependency_field(&self, _raw: &str) -> Vec<String> {
        Vec::new()
    }

    fn build_record(
        &self,
        queried_name: &str,
        attributes: &AttributeMap,
        _licenses: &LicenseRegistry,
    ) -> PackageRecord {
        // Never reached through the walker; kept total for the trait.
        PackageRecord::new(
            normalize_name(queried_name),
            attributes.get("Version"),
            PackageKind::Application,
        )
    }

    fn distro_root_record(&self, name: &str, release: &str) -> PackageRecord {
        let mut record =
            PackageRecord::new(normalize_name(name), release, PackageKind::OperatingSystem);
        record.supplier = Supplier::organization("Microsoft Corporation");
        record
    }

    fn parse_snapshot(&self, path: &Path) -> Result<Vec<PackageRecord>> {
        let bytes = std::fs::read(path)?;
        let content = decode_snapshot(&bytes);

        let mut records = Vec::new();
        let mut block: HashMap<String, String> = HashMap::new();

        for line in content.lines() {
            let trimmed = line.trim();
            if !trimmed.is_empty() {
                let fields: Vec<&str> = trimmed.split(':').collect();
                if fields.len() > 1 {
                    block.insert(fields[0].trim().to_string(), fields[1].trim().to_string());
                }
            } else if !block.is_empty() {
                if let Some(record) = block_record(&block) {
                    records.push(record);
                }
                block.clear();
            }
        }
        if let Some(record) = block_record(&block) {
            records.push(record);
        }

        Ok(records)
    }

    fn snapshot_edge_ids(&self) -> bool {
        true
    }
}

fn block_record(block: &HashMap<String, String>) -> Option<PackageRecord> {
    let name = block.get("Name").filter(|name| !name.is_empty())?;
    let version = block.get("Version").cloned().unwrap_or_default();

    let mut record =
        PackageRecord::new(normalize_name(name), version, PackageKind::Application);
    if let Some(vendor) = block.get("Vendor") {
        record.supplier = Supplier::organization(vendor);
    }
    if let Some(caption) = block.get("Caption").filter(|caption| !caption.is_empty()) {
        record.summary = Some(caption.clone());
    }
    Some(record)
}

/// Product exports are UTF-16LE with a byte-order mark; plain UTF-8 is
/// accepted as well for listings that were re-saved along the way.
fn decode_snapshot(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFF && bytes[1] == 0xFE {
        let units: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        String::from_utf16_lossy(&units)
    } else {
        String::from_utf8_lossy(bytes).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utf16le(text: &str) -> Vec<u8> {
        let mut bytes = vec![0xFF, 0xFE];
        for unit in text.encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        bytes
    }

    #[test]
    fn test_utf16_snapshot_blocks() {
        let dir = tempfile::tempdir().unwrap();
        let listing = dir.path().join("products.txt");
        std::fs::write(
            &listing,
            utf16le(
                "Name    : Example Runtime\nVersion : 14.0.30704\nVendor  : Example Corporation\nCaption : Example Runtime x64\n\nName    : Other_Tool\nVersion : 2.1\nVendor  : Other Vendor\nCaption : Other Tool\n\n",
            ),
        )
        .unwrap();

        let records = WindowsEcosystem::new().parse_snapshot(&listing).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "example runtime");
        assert_eq!(records[0].version, "14.0.30704");
        assert_eq!(
            records[0].supplier,
            Supplier::organization("Example Corporation")
        );
        assert_eq!(records[0].summary.as_deref(), Some("Example Runtime x64"));
        assert_eq!(records[1].name, "other-tool");
    }

    #[test]
    fn test_block_without_name_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let listing = dir.path().join("products.txt");
        std::fs::write(&listing, "Version : 1.0\nVendor : Nobody\n\n").unwrap();

        let records = WindowsEcosystem::new().parse_snapshot(&listing).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_trailing_block_without_blank_line() {
        let dir = tempfile::tempdir().unwrap();
        let listing = dir.path().join("products.txt");
        std::fs::write(&listing, "Name : Tool\nVersion : 3.0\n").unwrap();

        let records = WindowsEcosystem::new().parse_snapshot(&listing).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "tool");
    }

    #[test]
    fn test_live_queries_are_unsupported() {
        use crate::gateway::ExecGateway;
        let ecosystem = WindowsEcosystem::new();
        assert!(matches!(
            ecosystem.query_package(&ExecGateway, "anything"),
            Err(Error::Unsupported(_))
        ));
        assert!(matches!(
            ecosystem.list_all(&ExecGateway),
            Err(Error::Unsupported(_))
        ));
    }
}
