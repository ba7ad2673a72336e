// src/ecosystem/mod.rs

//! Ecosystem strategies for package metadata extraction.
//!
//! The dependency walker is a single traversal engine; everything that
//! differs between packaging families lives behind the [`Ecosystem`]
//! trait: query-command templates, field-parsing style, dependency-token
//! splitting rules, license sourcing, and locator formats.

pub mod dpkg;
pub mod freebsd;
pub mod rpm;
pub mod windows;

pub use dpkg::DpkgEcosystem;
pub use freebsd::FreeBsdEcosystem;
pub use rpm::RpmEcosystem;
pub use windows::WindowsEcosystem;

use crate::error::Result;
use crate::gateway::{self, CommandGateway};
use crate::license::LicenseRegistry;
use crate::metadata::AttributeMap;
use crate::model::{PackageKind, PackageRecord, normalize_name};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Supported packaging families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EcosystemId {
    Deb,
    Rpm,
    FreeBsd,
    Windows,
}

impl EcosystemId {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Deb => "deb",
            Self::Rpm => "rpm",
            Self::FreeBsd => "freebsd",
            Self::Windows => "windows",
        }
    }

    /// The query tool this family needs for live package resolution.
    pub fn required_binary(&self) -> Option<&'static str> {
        match self {
            Self::Deb => Some("dpkg"),
            Self::Rpm => Some("rpm"),
            Self::FreeBsd => Some("pkg"),
            Self::Windows => None,
        }
    }

    /// Whether single-package and whole-system modes exist for this family.
    pub fn supports_live_queries(&self) -> bool {
        !matches!(self, Self::Windows)
    }
}

impl fmt::Display for EcosystemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for EcosystemId {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "deb" => Ok(Self::Deb),
            "rpm" => Ok(Self::Rpm),
            "freebsd" => Ok(Self::FreeBsd),
            "windows" => Ok(Self::Windows),
            other => Err(format!("unknown ecosystem: {}", other)),
        }
    }
}

/// Pick an ecosystem by probing for its query tool on the search path.
pub fn detect() -> Option<EcosystemId> {
    [EcosystemId::Deb, EcosystemId::Rpm, EcosystemId::FreeBsd]
        .into_iter()
        .find(|id| id.required_binary().is_some_and(gateway::in_path))
}

/// Construct the strategy for `id`, parameterized by the filesystem root
/// under inspection and the host's release identity.
pub fn create(
    id: EcosystemId,
    root: &Path,
    os_release: &HashMap<String, String>,
) -> Box<dyn Ecosystem> {
    match id {
        EcosystemId::Deb => Box::new(DpkgEcosystem::new(root, os_release)),
        EcosystemId::Rpm => Box::new(RpmEcosystem::new(os_release)),
        EcosystemId::FreeBsd => Box::new(FreeBsdEcosystem::new(root, os_release)),
        EcosystemId::Windows => Box::new(WindowsEcosystem::new()),
    }
}

/// Strategy interface: one implementation per packaging family.
pub trait Ecosystem {
    fn id(&self) -> EcosystemId;

    /// Query one package's installed metadata through the gateway.
    ///
    /// An empty map is the "not installed" signal, not an error.
    fn query_package(&self, gateway: &dyn CommandGateway, name: &str) -> Result<AttributeMap>;

    /// Names of every installed package, for whole-system resolution.
    fn list_all(&self, gateway: &dyn CommandGateway) -> Result<Vec<String>>;

    /// Split a raw dependency field into bare package-name tokens,
    /// stripping version constraints and architecture qualifiers.
    fn parse_dependency_field(&self, raw: &str) -> Vec<String>;

    /// Dependency tokens declared by `name`. The default reads no field;
    /// families that keep dependencies in the query output or behind a
    /// second command override this.
    fn dependencies(
        &self,
        _gateway: &dyn CommandGateway,
        _name: &str,
        _attributes: &AttributeMap,
    ) -> Vec<String> {
        Vec::new()
    }

    /// Raw soft-dependency field, for families that defer them.
    fn recommends(&self, _attributes: &AttributeMap) -> Option<String> {
        None
    }

    /// Build the enriched record for an extracted package. `queried_name`
    /// is the token the walker queried with, which may differ from the
    /// canonical name in the attributes.
    fn build_record(
        &self,
        queried_name: &str,
        attributes: &AttributeMap,
        licenses: &LicenseRegistry,
    ) -> PackageRecord;

    /// The distro-root record for whole-system and snapshot runs.
    fn distro_root_record(&self, name: &str, release: &str) -> PackageRecord {
        PackageRecord::new(normalize_name(name), release, PackageKind::OperatingSystem)
    }

    /// Parse a captured snapshot listing into flat one-level records.
    fn parse_snapshot(&self, path: &Path) -> Result<Vec<PackageRecord>>;

    /// Whether snapshot edges carry source/target id disambiguators.
    fn snapshot_edge_ids(&self) -> bool {
        false
    }
}
