// src/ecosystem/rpm.rs

//! RPM-style ecosystem: rpm and yum query tooling.
//!
//! Metadata comes from `rpm -qi`, column-aligned `Key : value` lines.
//! The query output carries no dependency field, so dependencies are
//! reconstructed from `yum repoquery --deplist` provider lines, each of
//! which names a providing package as `name-version-release.arch`; the
//! name is everything before the first `-<digit>`.

use crate::ecosystem::{Ecosystem, EcosystemId};
use crate::error::Result;
use crate::gateway::{CommandGateway, command_line, env_options};
use crate::identifier;
use crate::license::{self, LicenseRegistry};
use crate::metadata::{AttributeMap, Continuation, parse_key_value};
use crate::model::{NOASSERTION, PackageKind, PackageRecord, Supplier, normalize_name};
use regex::Regex;
use std::collections::HashMap;
use std::path::Path;
use std::sync::OnceLock;
use tracing::{debug, warn};

/// Environment variable holding extra `rpm` query flags.
pub const RPM_OPTIONS_VAR: &str = "TALLY_RPM_OPTIONS";
/// Environment variable holding extra `yum` query flags.
pub const YUM_OPTIONS_VAR: &str = "TALLY_YUM_OPTIONS";

/// Version suffix of a `name-version-release` item. Versions are assumed
/// to start with a digit.
fn version_suffix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"-(\d[.\d]*[a-z0-9]*)").expect("hardcoded pattern"))
}

pub struct RpmEcosystem {
    /// purl namespace, from the os-release id (fedora, rhel, ...).
    namespace: Option<String>,
    /// `distro=` qualifier value, when the release identity is known.
    distro: Option<String>,
}

impl RpmEcosystem {
    pub fn new(os_release: &HashMap<String, String>) -> Self {
        let namespace = os_release.get("id").cloned();
        let distro = match (&namespace, os_release.get("version_id")) {
            (Some(id), Some(version)) => Some(format!("{}-{}", id, version)),
            _ => None,
        };
        Self { namespace, distro }
    }

    /// Split a provider item into its package name, dropping the
    /// trailing `.arch` extension and the version suffix.
    fn provider_package(item: &str) -> Option<String> {
        let base = item.rsplit('/').next().unwrap_or(item);
        let base = match base.rfind('.') {
            Some(position) => &base[..position],
            None => base,
        };
        let base = base.to_lowercase();
        let matched = version_suffix_re().find(&base)?;
        let name = base[..matched.start()].trim().to_string();
        if name.is_empty() { None } else { Some(name) }
    }
}

impl Ecosystem for RpmEcosystem {
    fn id(&self) -> EcosystemId {
        EcosystemId::Rpm
    }

    fn query_package(&self, gateway: &dyn CommandGateway, name: &str) -> Result<AttributeMap> {
        let command = command_line(&["rpm", &env_options(RPM_OPTIONS_VAR), "-qi", name]);
        let lines = gateway.run(&command)?;
        Ok(parse_key_value(&lines, Continuation::Ignore))
    }

    fn list_all(&self, gateway: &dyn CommandGateway) -> Result<Vec<String>> {
        let command = command_line(&[
            "rpm",
            &env_options(RPM_OPTIONS_VAR),
            "-qa",
            "--queryformat",
            "%{NAME}\\n",
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
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty())
            .collect()
    }

    /// Provider lines from the repository tooling, deduplicated in order
    /// of appearance, excluding the package's own name.
    fn dependencies(
        &self,
        gateway: &dyn CommandGateway,
        name: &str,
        _attributes: &AttributeMap,
    ) -> Vec<String> {
        let command = command_line(&[
            "yum",
            &env_options(YUM_OPTIONS_VAR),
            "repoquery",
            "--deplist",
            name,
        ]);
        let lines = match gateway.run(&command) {
            Ok(lines) => lines,
            Err(e) => {
                warn!("Dependency query for {} failed: {}", name, e);
                return Vec::new();
            }
        };

        let mut requires: Vec<String> = Vec::new();
        for line in &lines {
            let Some(position) = line.find("provider:") else {
                continue;
            };
            let item = line[position + "provider:".len()..].trim();
            let Some(dependency) = Self::provider_package(item) else {
                continue;
            };
            if dependency != name && !requires.contains(&dependency) {
                requires.push(dependency);
            }
        }
        debug!("Found {} dependencies for package {}", requires.len(), name);
        requires
    }

    fn build_record(
        &self,
        _queried_name: &str,
        attributes: &AttributeMap,
        licenses: &LicenseRegistry,
    ) -> PackageRecord {
        let name = normalize_name(attributes.get("Name"));
        let version = attributes.get("Version").to_string();
        let mut record = PackageRecord::new(name.clone(), version.clone(), PackageKind::Application);

        let raw_license = attributes.get("License");
        if !raw_license.is_empty() {
            let resolution = license::resolve(licenses, raw_license);
            record.license_declared = if resolution.exact {
                resolution.canonical.clone()
            } else {
                NOASSERTION.to_string()
            };
            record.license_concluded = resolution.canonical.clone();
            record.license_comment = license::comment(&name, raw_license, &resolution);
        }

        record.supplier = Supplier::from_field(attributes.get("Packager"));

        let summary = attributes.get("Summary");
        if !summary.is_empty() {
            record.summary = Some(summary.to_string());
        }
        let homepage = attributes.get("URL");
        if !homepage.is_empty() {
            record.homepage = Some(homepage.to_string());
        }

        let arch = attributes.get("Architecture");
        record.locator = Some(identifier::purl(
            "rpm",
            self.namespace.as_deref(),
            &name,
            &version,
            &[
                ("arch", arch.to_string()),
                ("distro", self.distro.clone().unwrap_or_default()),
            ],
        ));

        let vendor = attributes.get("Vendor");
        if !vendor.is_empty() && vendor != "(none)" {
            record.platform_id = Some(identifier::cpe(vendor, &name, &version));
        } else if record.supplier.is_known() {
            record.platform_id = Some(identifier::cpe(record.supplier.name(), &name, &version));
        }

        for (field, property) in [
            ("Release", "release"),
            ("Epoch", "epoch"),
            ("Build Date", "build-date"),
            ("Install Date", "install-date"),
            ("Size", "size"),
        ] {
            let value = attributes.get(field);
            if !value.is_empty() && value != "(none)" {
                record.properties.insert(property.to_string(), value.to_string());
            }
        }

        record
    }

    /// Snapshot rows are captured package file names,
    /// `name-version[-release][.arch][.rpm]`; rows that do not follow the
    /// pattern are ignored.
    fn parse_snapshot(&self, path: &Path) -> Result<Vec<PackageRecord>> {
        let content = std::fs::read_to_string(path)?;
        let mut records = Vec::new();

        for line in content.lines() {
            let item = line.trim();
            if item.is_empty() {
                continue;
            }
            let base = item.rsplit('/').next().unwrap_or(item);
            let base = match base.rfind('.') {
                Some(position) => &base[..position],
                None => base,
            };
            let base = base.to_lowercase();
            let Some(matched) = version_suffix_re().find(&base) else {
                continue;
            };
            let name = normalize_name(&base[..matched.start()]);
            if name.is_empty() {
                continue;
            }
            let version = &matched.as_str()[1..];

            let mut record = PackageRecord::new(name.clone(), version, PackageKind::Application);
            record.locator = Some(identifier::purl(
                "rpm",
                self.namespace.as_deref(),
                &name,
                version,
                &[("distro", self.distro.clone().unwrap_or_default())],
            ));
            records.push(record);
        }

        Ok(records)
    }
}
