// src/ecosystem/freebsd.rs

//! BSD-style ecosystem: pkg query tooling.
//!
//! Metadata comes from `pkg info`, which wraps long field values across
//! lines, so parsing runs in continuation mode. Dependencies come from
//! `pkg info -d`. License data does not appear in the query output at
//! all: every package has a license directory whose file names are the
//! license tokens, and multiple files mean alternative licensing.

use crate::ecosystem::{Ecosystem, EcosystemId};
use crate::error::Result;
use crate::gateway::{CommandGateway, command_line, env_options};
use crate::identifier;
use crate::license::{self, LicenseRegistry};
use crate::metadata::{AttributeMap, Continuation, parse_key_value};
use crate::model::{PackageKind, PackageRecord, Supplier, normalize_name};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Environment variable holding extra `pkg` query flags.
pub const PKG_OPTIONS_VAR: &str = "TALLY_PKG_OPTIONS";

/// License directory entries that are not license tokens.
const LICENSE_DIR_IGNORE: &[&str] = &["LICENSE", "catalog.mk"];

pub struct FreeBsdEcosystem {
    root: PathBuf,
    /// Distro identity from os-release, used for the root record.
    supplier_id: String,
    home_url: Option<String>,
}

impl FreeBsdEcosystem {
    pub fn new(root: &Path, os_release: &HashMap<String, String>) -> Self {
        Self {
            root: root.to_path_buf(),
            supplier_id: os_release
                .get("id")
                .cloned()
                .unwrap_or_else(|| "freebsd".to_string()),
            home_url: os_release.get("home_url").cloned(),
        }
    }

    /// `pkg` invocation prefix, carrying `--rootdir` for alternate roots.
    fn pkg_command(&self, rest: &str) -> String {
        let rootdir = if self.root == Path::new("/") {
            String::new()
        } else {
            format!("--rootdir {}", self.root.display())
        };
        command_line(&["pkg", &rootdir, &env_options(PKG_OPTIONS_VAR), rest])
    }

    /// Joined license expression from the package's license directory.
    ///
    /// Every non-ignored file name is a token; multiple files encode
    /// alternative licensing, so tokens join with OR. File names are
    /// sorted for deterministic output. A missing directory means no
    /// license data.
    fn license_expression(&self, package: &str) -> Option<String> {
        let directory = self.root.join("usr/local/share/licenses").join(package);
        let entries = std::fs::read_dir(&directory).ok()?;

        let mut tokens: Vec<String> = entries
            .flatten()
            .filter(|entry| entry.path().is_file())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| !LICENSE_DIR_IGNORE.contains(&name.as_str()))
            .collect();
        if tokens.is_empty() {
            return None;
        }
        tokens.sort();

        let translated: Vec<String> = tokens
            .iter()
            .map(|token| translate_port_license(token))
            .collect();
        Some(translated.join(" OR "))
    }
}

impl Ecosystem for FreeBsdEcosystem {
    fn id(&self) -> EcosystemId {
        EcosystemId::FreeBsd
    }

    fn query_package(&self, gateway: &dyn CommandGateway, name: &str) -> Result<AttributeMap> {
        let command = self.pkg_command(&format!("info {}", name));
        let lines = gateway.run(&command)?;
        Ok(parse_key_value(&lines, Continuation::Join))
    }

    fn list_all(&self, gateway: &dyn CommandGateway) -> Result<Vec<String>> {
        let command = self.pkg_command("query %n");
        let names = gateway
            .run(&command)?
            .iter()
            .map(|line| line.trim().to_string())
            .filter(|line| !line.is_empty())
            .collect();
        Ok(names)
    }

    fn parse_dependency_field(&self, raw: &str) -> Vec<String> {
        raw.split_whitespace()
            .filter(|token| !token.ends_with(':'))
            .filter_map(|token| token.split(['>', '<', '=']).next())
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty())
            .collect()
    }

    fn dependencies(
        &self,
        gateway: &dyn CommandGateway,
        name: &str,
        _attributes: &AttributeMap,
    ) -> Vec<String> {
        let command = self.pkg_command(&format!("info -d {}", name));
        let lines = match gateway.run(&command) {
            Ok(lines) => lines,
            Err(e) => {
                warn!("Dependency query for {} failed: {}", name, e);
                return Vec::new();
            }
        };
        let dependencies = self.parse_dependency_field(&lines.join(" "));
        debug!("Found {} dependencies for package {}", dependencies.len(), name);
        dependencies
    }

    fn build_record(
        &self,
        queried_name: &str,
        attributes: &AttributeMap,
        licenses: &LicenseRegistry,
    ) -> PackageRecord {
        let name = normalize_name(attributes.get("Name"));
        let version = attributes.get("Version").to_string();
        let mut record = PackageRecord::new(name.clone(), version.clone(), PackageKind::Application);

        if let Some(expression) = self.license_expression(queried_name) {
            let resolution = license::resolve(licenses, &expression);
            // Directory tokens are the declaration as-is; unmapped
            // tokens stay in the expression.
            record.license_declared = expression.clone();
            record.license_concluded = expression.clone();
            record.license_comment = license::comment(&name, &expression, &resolution);
        }

        let maintainer = attributes.get("Maintainer");
        record.supplier = Supplier::from_field(maintainer);

        let summary = attributes.get("Comment");
        if !summary.is_empty() {
            record.summary = Some(summary.to_string());
        }
        let homepage = attributes.get("WWW");
        if !homepage.is_empty() {
            record.homepage = Some(homepage.to_string());
        }

        let arch = map_arch(attributes.get("Architecture"));
        record.locator = Some(identifier::purl(
            "generic",
            None,
            &name,
            &version,
            &[("distro", "freebsd".to_string()), ("arch", arch)],
        ));
        // Ports maintainers are usually bare addresses with no display
        // name; the platform id keys off the raw field, not the parsed
        // supplier.
        if !maintainer.is_empty() {
            record.platform_id = Some(identifier::cpe("freebsd", &name, &version));
        }

        record
    }

    fn distro_root_record(&self, name: &str, release: &str) -> PackageRecord {
        let mut record =
            PackageRecord::new(normalize_name(name), release, PackageKind::OperatingSystem);
        record.supplier = Supplier::organization(&self.supplier_id);
        record.homepage = self.home_url.clone();
        record
    }

    /// Snapshot rows are `name[:<os:release:arch>] version [origin comment...]`.
    fn parse_snapshot(&self, path: &Path) -> Result<Vec<PackageRecord>> {
        let content = std::fs::read_to_string(path)?;
        let mut records = Vec::new();

        for line in content.lines() {
            let columns: Vec<&str> = line.split_whitespace().collect();
            if columns.len() < 2 {
                continue;
            }
            let (name, arch) = match columns[0].split_once(':') {
                Some((name, arch_triple)) => (normalize_name(name), map_arch(arch_triple)),
                None => (normalize_name(columns[0]), String::new()),
            };
            let version = columns[1];

            let mut record = PackageRecord::new(name.clone(), version, PackageKind::Application);
            if columns.len() > 3 {
                record.summary = Some(columns[3..].join(" "));
            }
            record.locator = Some(identifier::purl(
                "generic",
                None,
                &name,
                version,
                &[("distro", "freebsd".to_string()), ("arch", arch)],
            ));
            records.push(record);
        }

        Ok(records)
    }
}

/// Map the third component of a `os:release:arch` triple to its common
/// architecture name. Unknown values pass through; malformed triples map
/// to the empty string.
fn map_arch(arch_triple: &str) -> String {
    let lowered = arch_triple.to_lowercase();
    let parts: Vec<&str> = lowered.split(':').collect();
    if parts.len() != 3 {
        return String::new();
    }
    match parts[2] {
        "i386" => "x86",
        "amd64" => "x86_64",
        "powerpc" => "ppc",
        "sparc64" => "sparc",
        other => other,
    }
    .to_string()
}

/// Translate a ports-tree license file name to its canonical identifier.
/// Unmapped tokens are returned unchanged so no information is lost.
fn translate_port_license(token: &str) -> String {
    let cleaned = token
        .to_uppercase()
        .replace("LICENSE", "")
        .replace(".TXT", "")
        .trim()
        .to_string();

    let translated = match cleaned.as_str() {
        "BSD0CLAUSE" => "0BSD",
        "BSD1CLAUSE" => "BSD-1-Clause",
        "BSD2CLAUSE" => "BSD-2-Clause",
        "BSD3CLAUSE" => "BSD-3-Clause",
        "BSD4CLAUSE" => "BSD-4-Clause",
        "MIT" => "MIT",
        "APACHE10" => "Apache-1.0",
        "APACHE11" => "Apache-1.1",
        "APACHE20" => "Apache-2.0",
        "GPLV1" => "GPL-1.0-only",
        "GPLV1+" => "GPL-1.0-or-later",
        "GPLV2" => "GPL-2.0-only",
        "GPLV2+" => "GPL-2.0-or-later",
        "GPLV3" => "GPL-3.0-only",
        "GPLV3+" => "GPL-3.0-or-later",
        "AGPLV3" => "AGPL-3.0-only",
        "AGPLV3+" => "AGPL-3.0-or-later",
        "LGPL20" => "LGPL-2.0-only",
        "LGPL20+" => "LGPL-2.0-or-later",
        "LGPL21" => "LGPL-2.1-only",
        "LGPL21+" => "LGPL-2.1-or-later",
        "LGPL3" => "LGPL-3.0-only",
        "LGPL3+" => "LGPL-3.0-or-later",
        "MPL11" => "MPL-1.1",
        "MPL20" => "MPL-2.0",
        "CDDL" => "CDDL-1.0",
        "ZLIB" => "Zlib",
        "ISC" => "ISC",
        "POSTGRESQL" => "PostgreSQL",
        "ARTISTIC" => "Artistic-1.0-Perl",
        "ARTISTIC2" => "Artistic-2.0",
        "PHP202" => "PHP-2.02",
        "PHP30" => "PHP-3.0",
        "PHP301" => "PHP-3.01",
        "UNLICENSE" => "Unlicense",
        "OPENSSL" => "OpenSSL",
        "PSFL" => "Python-2.0",
        "RUBY" => "Ruby",
        _ => return token.to_string(),
    };
    translated.to_string()
}
