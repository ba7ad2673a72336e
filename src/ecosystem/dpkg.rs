// src/ecosystem/dpkg.rs

//! Debian-style ecosystem: dpkg query tooling.
//!
//! Metadata comes from `dpkg -s`, strict `Key: value` lines. Dependency
//! fields separate entries with commas, alternatives with `|`, and carry
//! parenthesized version constraints plus `:any`/`:arch` qualifiers, all
//! of which are stripped. License and copyright text come from the
//! package's copyright file under the doc directory, not from the query
//! output.

use crate::ecosystem::{Ecosystem, EcosystemId};
use crate::error::Result;
use crate::gateway::{CommandGateway, command_line, env_options};
use crate::identifier;
use crate::license::{self, LicenseRegistry};
use crate::metadata::{AttributeMap, Continuation, parse_key_value};
use crate::model::{NOASSERTION, PackageKind, PackageRecord, Supplier, normalize_name};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable holding extra `dpkg` query flags.
pub const DPKG_OPTIONS_VAR: &str = "TALLY_DPKG_OPTIONS";

pub struct DpkgEcosystem {
    root: PathBuf,
    /// purl namespace, from the os-release id (debian, ubuntu, ...).
    namespace: String,
    /// `distro=` qualifier value, when the release identity is known.
    distro: Option<String>,
}

impl DpkgEcosystem {
    pub fn new(root: &Path, os_release: &HashMap<String, String>) -> Self {
        let namespace = os_release
            .get("id")
            .cloned()
            .unwrap_or_else(|| "debian".to_string());
        let distro = os_release
            .get("version_id")
            .map(|version| format!("{}-{}", namespace, version));
        Self {
            root: root.to_path_buf(),
            namespace,
            distro,
        }
    }

    /// First `License:` and `Copyright:` fields of the package's
    /// copyright file, scanned by line prefix. A missing file is "no
    /// additional data", not an error.
    fn copyright_fields(&self, package: &str) -> (Option<String>, Option<String>) {
        let path = self
            .root
            .join("usr/share/doc")
            .join(package)
            .join("copyright");
        let Ok(content) = std::fs::read_to_string(&path) else {
            debug!("No copyright file for {}", package);
            return (None, None);
        };

        let mut license = None;
        let mut copyright = None;
        for line in content.lines() {
            if license.is_none() {
                if let Some(rest) = line.strip_prefix("License:") {
                    let rest = rest.trim();
                    if !rest.is_empty() {
                        license = Some(rest.to_string());
                    }
                }
            }
            if copyright.is_none() {
                if let Some(rest) = line.strip_prefix("Copyright:") {
                    let rest = rest.trim();
                    if !rest.is_empty() {
                        copyright = Some(rest.to_string());
                    }
                }
            }
            if license.is_some() && copyright.is_some() {
                break;
            }
        }
        (license, copyright)
    }
}

impl Ecosystem for DpkgEcosystem {
    fn id(&self) -> EcosystemId {
        EcosystemId::Deb
    }

    fn query_package(&self, gateway: &dyn CommandGateway, name: &str) -> Result<AttributeMap> {
        let command = command_line(&["dpkg", &env_options(DPKG_OPTIONS_VAR), "-s", name]);
        let lines = gateway.run(&command)?;
        Ok(parse_key_value(&lines, Continuation::Ignore))
    }

    fn list_all(&self, gateway: &dyn CommandGateway) -> Result<Vec<String>> {
        let command = command_line(&[
            "dpkg-query",
            &env_options(DPKG_OPTIONS_VAR),
            "-W",
            "-f",
            "${Package}\\n",
        ]);
        let names = gateway
            .run(&command)?
            .iter()
            .map(|line| line.trim().to_string())
            .filter(|line| !line.is_empty())
            .collect();
        Ok(names)
    }

    fn parse_dependency_field(&self, raw: &str) -> Vec<String> {
        raw.split(',')
            .flat_map(|entry| entry.split('|'))
            .filter_map(|entry| entry.split_whitespace().next())
            .filter_map(|token| token.split(':').next())
            .map(|token| token.to_string())
            .filter(|token| !token.is_empty())
            .collect()
    }

    fn dependencies(
        &self,
        _gateway: &dyn CommandGateway,
        _name: &str,
        attributes: &AttributeMap,
    ) -> Vec<String> {
        self.parse_dependency_field(attributes.get("Depends"))
    }

    fn recommends(&self, attributes: &AttributeMap) -> Option<String> {
        let raw = attributes.get("Recommends");
        if raw.is_empty() {
            None
        } else {
            Some(raw.to_string())
        }
    }

    fn build_record(
        &self,
        _queried_name: &str,
        attributes: &AttributeMap,
        licenses: &LicenseRegistry,
    ) -> PackageRecord {
        let name = normalize_name(attributes.get("Package"));
        let version = attributes.get("Version").to_string();
        let mut record = PackageRecord::new(name.clone(), version.clone(), PackageKind::Application);

        let (raw_license, copyright) = self.copyright_fields(&name);
        if let Some(raw) = &raw_license {
            let resolution = license::resolve(licenses, raw);
            record.license_declared = if resolution.exact {
                resolution.canonical.clone()
            } else {
                NOASSERTION.to_string()
            };
            record.license_concluded = resolution.canonical.clone();
            record.license_comment = license::comment(&name, raw, &resolution);
        }
        record.copyright_text = copyright;

        record.supplier = Supplier::from_field(attributes.get("Maintainer"));

        let summary = attributes.get("Description");
        if !summary.is_empty() {
            record.summary = Some(summary.to_string());
        }
        let homepage = attributes.get("Homepage");
        if !homepage.is_empty() {
            record.homepage = Some(homepage.to_string());
        }

        let arch = attributes.get("Architecture");
        record.locator = Some(identifier::purl(
            "deb",
            Some(&self.namespace),
            &name,
            &version,
            &[
                ("arch", arch.to_string()),
                ("distro", self.distro.clone().unwrap_or_default()),
            ],
        ));
        if record.supplier.is_known() {
            record.platform_id = Some(identifier::cpe(record.supplier.name(), &name, &version));
        }

        for (field, property) in [
            ("Installed-Size", "installed-size"),
            ("Section", "section"),
            ("Priority", "priority"),
        ] {
            let value = attributes.get(field);
            if !value.is_empty() {
                record.properties.insert(property.to_string(), value.to_string());
            }
        }

        record
    }

    /// Snapshot rows come from a captured `dpkg -l` style listing: only
    /// rows flagged `ii` (installed) are taken, with columns name,
    /// version, architecture, then the description.
    fn parse_snapshot(&self, path: &Path) -> Result<Vec<PackageRecord>> {
        let content = std::fs::read_to_string(path)?;
        let mut records = Vec::new();

        for line in content.lines() {
            if !line.starts_with("ii") {
                continue;
            }
            let columns: Vec<&str> = line[2..].split_whitespace().collect();
            if columns.len() < 2 {
                continue;
            }
            let name = normalize_name(columns[0]);
            let version = columns[1];
            let mut record = PackageRecord::new(name, version, PackageKind::Application);
            if columns.len() > 3 {
                record.summary = Some(columns[3..].join(" "));
            }
            records.push(record);
        }

        Ok(records)
    }
}
