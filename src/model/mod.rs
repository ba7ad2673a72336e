// src/model/mod.rs

//! SBOM record types accumulated by the dependency walker.

pub mod supplier;

pub use supplier::Supplier;

use std::collections::BTreeMap;
use std::fmt;

/// Sentinel for license fields with no usable data.
pub const NOASSERTION: &str = "NOASSERTION";

/// Classification of a resolved package.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageKind {
    /// The distro root itself.
    OperatingSystem,
    /// Everything resolved underneath it.
    Application,
}

impl fmt::Display for PackageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OperatingSystem => write!(f, "operating-system"),
            Self::Application => write!(f, "application"),
        }
    }
}

/// One resolved package. Identity is `(name, version)`.
#[derive(Debug, Clone)]
pub struct PackageRecord {
    /// Canonical name: lower-cased, underscores normalized to hyphens.
    pub name: String,
    /// Ecosystem-native version string; may embed an epoch or release.
    pub version: String,
    pub kind: PackageKind,
    pub supplier: Supplier,
    /// Canonical license identifier as declared, or `NOASSERTION`.
    pub license_declared: String,
    /// Canonical license identifier as concluded, or `NOASSERTION`.
    pub license_concluded: String,
    /// Note explaining a declared/canonical mismatch or a deprecation.
    pub license_comment: Option<String>,
    pub summary: Option<String>,
    pub homepage: Option<String>,
    pub copyright_text: Option<String>,
    /// Package-url style locator.
    pub locator: Option<String>,
    /// CPE-style platform identifier.
    pub platform_id: Option<String>,
    /// Ecosystem-specific extras (install date, size, section, ...).
    pub properties: BTreeMap<String, String>,
}

impl PackageRecord {
    /// Create a record with both license fields set to `NOASSERTION` and
    /// an unknown supplier.
    pub fn new(name: impl Into<String>, version: impl Into<String>, kind: PackageKind) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            kind,
            supplier: Supplier::Unknown,
            license_declared: NOASSERTION.to_string(),
            license_concluded: NOASSERTION.to_string(),
            license_comment: None,
            summary: None,
            homepage: None,
            copyright_text: None,
            locator: None,
            platform_id: None,
            properties: BTreeMap::new(),
        }
    }

    /// Registry identity key.
    pub fn key(&self) -> (String, String) {
        (self.name.clone(), self.version.clone())
    }

    /// Stable identifier used to disambiguate two installed versions of the
    /// same name in relationship edges.
    pub fn id(&self) -> String {
        format!("{}-{}", self.name, self.version)
    }
}

/// Relationship kinds between SBOM elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationshipKind {
    /// Connects a synthetic root to its immediate subject.
    Describes,
    /// Connects a package to a package it requires.
    DependsOn,
}

impl fmt::Display for RelationshipKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Describes => write!(f, "DESCRIBES"),
            Self::DependsOn => write!(f, "DEPENDS_ON"),
        }
    }
}

/// One directed edge between two package names.
#[derive(Debug, Clone)]
pub struct RelationshipRecord {
    pub source: String,
    pub kind: RelationshipKind,
    pub target: String,
    /// Disambiguators for graphs where two versions of one name coexist.
    pub source_id: Option<String>,
    pub target_id: Option<String>,
}

impl RelationshipRecord {
    pub fn new(
        source: impl Into<String>,
        kind: RelationshipKind,
        target: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            kind,
            target: target.into(),
            source_id: None,
            target_id: None,
        }
    }

    pub fn describes(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self::new(source, RelationshipKind::Describes, target)
    }

    pub fn depends_on(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self::new(source, RelationshipKind::DependsOn, target)
    }

    pub fn with_ids(mut self, source_id: impl Into<String>, target_id: impl Into<String>) -> Self {
        self.source_id = Some(source_id.into());
        self.target_id = Some(target_id.into());
        self
    }
}

/// Lower-case a package name and normalize underscores to hyphens.
pub fn normalize_name(name: &str) -> String {
    name.to_lowercase().replace('_', "-")
}
