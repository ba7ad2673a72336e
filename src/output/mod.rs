// src/output/mod.rs

//! SPDX-style document writer.
//!
//! Serializes the accumulated package and relationship collections into a
//! tag-value or JSON document, written to a file or stdout. This is the
//! downstream generator's seat in the repo; the traversal core never
//! depends on it.

use crate::error::{Error, Result};
use crate::model::{PackageRecord, RelationshipRecord};
use crate::store::{PackageRegistry, RelationshipStore};
use chrono::Utc;
use std::collections::HashMap;
use std::fmt::Write as _;
use std::path::Path;
use std::str::FromStr;
use tracing::info;
use uuid::Uuid;

/// Supported document renderings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// SPDX tag-value text.
    Tag,
    /// SPDX-shaped JSON.
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "tag" => Ok(Self::Tag),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown output format: {}", other)),
        }
    }
}

/// SPDX 2.3 JSON document structures.
mod spdx {
    use serde::Serialize;

    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Document {
        pub spdx_version: String,
        pub data_license: String,
        #[serde(rename = "SPDXID")]
        pub spdx_id: String,
        pub name: String,
        pub document_namespace: String,
        pub creation_info: CreationInfo,
        pub packages: Vec<Package>,
        pub relationships: Vec<Relationship>,
    }

    #[derive(Serialize)]
    pub struct CreationInfo {
        pub created: String,
        pub creators: Vec<String>,
    }

    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Package {
        pub name: String,
        #[serde(rename = "SPDXID")]
        pub spdx_id: String,
        pub version_info: String,
        pub primary_package_purpose: String,
        pub supplier: String,
        pub license_declared: String,
        pub license_concluded: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub license_comments: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub summary: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub homepage: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub copyright_text: Option<String>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        pub external_refs: Vec<ExternalRef>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        pub annotations: Vec<Annotation>,
    }

    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ExternalRef {
        pub reference_category: String,
        pub reference_type: String,
        pub reference_locator: String,
    }

    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Annotation {
        pub annotation_type: String,
        pub comment: String,
    }

    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Relationship {
        pub spdx_element_id: String,
        pub relationship_type: String,
        pub related_spdx_element: String,
    }
}

/// Write the document for one resolution run.
pub fn write(
    subject: &str,
    registry: &PackageRegistry,
    relationships: &RelationshipStore,
    format: OutputFormat,
    output: Option<&Path>,
) -> Result<()> {
    let text = match format {
        OutputFormat::Tag => render_tag(subject, registry, relationships),
        OutputFormat::Json => render_json(subject, registry, relationships)?,
    };

    match output {
        Some(path) => {
            std::fs::write(path, text)?;
            info!("Document written to {}", path.display());
        }
        None => print!("{}", text),
    }
    Ok(())
}

/// Reference ids for every known element: the document subject plus one
/// `SPDXRef-<n>` per package, keyed by name and by name-version id so
/// edges with disambiguators resolve to the right element.
fn reference_map(subject: &str, registry: &PackageRegistry) -> HashMap<String, String> {
    let mut refs = HashMap::new();
    refs.insert(subject.to_string(), "SPDXRef-DOCUMENT".to_string());
    for (position, record) in registry.all().iter().enumerate() {
        let reference = format!("SPDXRef-{}", position);
        refs.entry(record.name.clone()).or_insert_with(|| reference.clone());
        refs.insert(record.id(), reference);
    }
    refs
}

fn edge_refs<'a>(
    edge: &'a RelationshipRecord,
    refs: &'a HashMap<String, String>,
) -> Option<(&'a str, &'a str)> {
    let source_key = edge.source_id.as_deref().unwrap_or(&edge.source);
    let target_key = edge.target_id.as_deref().unwrap_or(&edge.target);
    // An edge to a package that never produced a record has no element
    // to point at; the walker permits those, the writer skips them.
    Some((refs.get(source_key)?.as_str(), refs.get(target_key)?.as_str()))
}

fn creation_timestamp() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

fn document_namespace(subject: &str) -> String {
    format!(
        "https://spdx.org/spdxdocs/{}-{}",
        subject.to_lowercase(),
        Uuid::new_v4()
    )
}

fn render_tag(
    subject: &str,
    registry: &PackageRegistry,
    relationships: &RelationshipStore,
) -> String {
    let refs = reference_map(subject, registry);
    let mut out = String::new();

    let _ = writeln!(out, "SPDXVersion: SPDX-2.3");
    let _ = writeln!(out, "DataLicense: CC0-1.0");
    let _ = writeln!(out, "SPDXID: SPDXRef-DOCUMENT");
    let _ = writeln!(out, "DocumentName: {}", subject);
    let _ = writeln!(out, "DocumentNamespace: {}", document_namespace(subject));
    let _ = writeln!(out, "Creator: Tool: tally-{}", env!("CARGO_PKG_VERSION"));
    let _ = writeln!(out, "Created: {}", creation_timestamp());

    for (position, record) in registry.all().iter().enumerate() {
        let _ = writeln!(out);
        let _ = writeln!(out, "##### Package: {}", record.name);
        let _ = writeln!(out);
        let _ = writeln!(out, "PackageName: {}", record.name);
        let _ = writeln!(out, "SPDXID: SPDXRef-{}", position);
        if !record.version.is_empty() {
            let _ = writeln!(out, "PackageVersion: {}", record.version);
        }
        let _ = writeln!(out, "PrimaryPackagePurpose: {}", record.kind);
        let _ = writeln!(out, "PackageSupplier: {}", record.supplier);
        let _ = writeln!(out, "PackageLicenseDeclared: {}", record.license_declared);
        let _ = writeln!(out, "PackageLicenseConcluded: {}", record.license_concluded);
        if let Some(comment) = &record.license_comment {
            let _ = writeln!(out, "PackageLicenseComments: <text>{}</text>", comment);
        }
        if let Some(copyright) = &record.copyright_text {
            let _ = writeln!(out, "PackageCopyrightText: <text>{}</text>", copyright);
        }
        if let Some(summary) = &record.summary {
            let _ = writeln!(out, "PackageSummary: <text>{}</text>", summary);
        }
        if let Some(homepage) = &record.homepage {
            let _ = writeln!(out, "PackageHomePage: {}", homepage);
        }
        if let Some(locator) = &record.locator {
            let _ = writeln!(out, "ExternalRef: PACKAGE-MANAGER purl {}", locator);
        }
        if let Some(platform_id) = &record.platform_id {
            let _ = writeln!(out, "ExternalRef: SECURITY cpe23Type {}", platform_id);
        }
        for (key, value) in &record.properties {
            let _ = writeln!(out, "PackageComment: <text>{}: {}</text>", key, value);
        }
    }

    let _ = writeln!(out);
    for edge in relationships.all() {
        if let Some((source, target)) = edge_refs(edge, &refs) {
            let _ = writeln!(out, "Relationship: {} {} {}", source, edge.kind, target);
        }
    }

    out
}

fn render_json(
    subject: &str,
    registry: &PackageRegistry,
    relationships: &RelationshipStore,
) -> Result<String> {
    let refs = reference_map(subject, registry);

    let packages = registry
        .all()
        .iter()
        .enumerate()
        .map(|(position, record)| json_package(position, record))
        .collect();

    let json_relationships = relationships
        .all()
        .iter()
        .filter_map(|edge| {
            edge_refs(edge, &refs).map(|(source, target)| spdx::Relationship {
                spdx_element_id: source.to_string(),
                relationship_type: edge.kind.to_string(),
                related_spdx_element: target.to_string(),
            })
        })
        .collect();

    let document = spdx::Document {
        spdx_version: "SPDX-2.3".to_string(),
        data_license: "CC0-1.0".to_string(),
        spdx_id: "SPDXRef-DOCUMENT".to_string(),
        name: subject.to_string(),
        document_namespace: document_namespace(subject),
        creation_info: spdx::CreationInfo {
            created: creation_timestamp(),
            creators: vec![format!("Tool: tally-{}", env!("CARGO_PKG_VERSION"))],
        },
        packages,
        relationships: json_relationships,
    };

    serde_json::to_string_pretty(&document)
        .map_err(|e| Error::InvalidInput(format!("serialization failed: {}", e)))
}

fn json_package(position: usize, record: &PackageRecord) -> spdx::Package {
    let mut external_refs = Vec::new();
    if let Some(locator) = &record.locator {
        external_refs.push(spdx::ExternalRef {
            reference_category: "PACKAGE-MANAGER".to_string(),
            reference_type: "purl".to_string(),
            reference_locator: locator.clone(),
        });
    }
    if let Some(platform_id) = &record.platform_id {
        external_refs.push(spdx::ExternalRef {
            reference_category: "SECURITY".to_string(),
            reference_type: "cpe23Type".to_string(),
            reference_locator: platform_id.clone(),
        });
    }

    let annotations = record
        .properties
        .iter()
        .map(|(key, value)| spdx::Annotation {
            annotation_type: "OTHER".to_string(),
            comment: format!("{}: {}", key, value),
        })
        .collect();

    spdx::Package {
        name: record.name.clone(),
        spdx_id: format!("SPDXRef-{}", position),
        version_info: record.version.clone(),
        primary_package_purpose: record.kind.to_string(),
        supplier: record.supplier.to_string(),
        license_declared: record.license_declared.clone(),
        license_concluded: record.license_concluded.clone(),
        license_comments: record.license_comment.clone(),
        summary: record.summary.clone(),
        homepage: record.homepage.clone(),
        copyright_text: record.copyright_text.clone(),
        external_refs,
        annotations,
    }
}
