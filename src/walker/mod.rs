// src/walker/mod.rs

//! The traversal engine.
//!
//! One walker drives every ecosystem strategy: it owns the visited-set,
//! the package registry, and the relationship store for a single
//! resolution run, and guarantees each package name is extracted at most
//! once regardless of how many dependents reference it.
//!
//! Traversal is depth-first over an explicit LIFO work stack rather than
//! native recursion; dependency chains on real systems are deep enough to
//! threaten the call stack. Children are pushed in reverse order, so the
//! visit sequence is identical to the recursive formulation, and a name
//! is marked visited before its dependencies are expanded — that ordering
//! is what terminates cycles.

use crate::ecosystem::Ecosystem;
use crate::error::Result;
use crate::gateway::CommandGateway;
use crate::license::LicenseRegistry;
use crate::model::{RelationshipRecord, normalize_name};
use crate::store::{PackageRegistry, RelationshipStore};
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, warn};

pub struct DependencyWalker<'a> {
    ecosystem: &'a dyn Ecosystem,
    gateway: &'a dyn CommandGateway,
    licenses: &'a LicenseRegistry,
    distro_name: String,
    release: String,
    /// Synthetic root label the DESCRIBES edge hangs from.
    parent: String,
    registry: PackageRegistry,
    relationships: RelationshipStore,
    /// Names already processed this run, keyed by the queried token, not
    /// by (name, version). Two versions of one name in different graph
    /// branches collapse to whichever was extracted first; changing that
    /// would change output for existing consumers.
    visited: HashSet<String>,
    /// Soft dependencies collected during the main pass, resolved after
    /// the traversal completes.
    pending_recommends: Vec<(String, String)>,
}

impl<'a> DependencyWalker<'a> {
    pub fn new(
        ecosystem: &'a dyn Ecosystem,
        gateway: &'a dyn CommandGateway,
        licenses: &'a LicenseRegistry,
        distro_name: &str,
        release: &str,
    ) -> Self {
        let distro_name = distro_name.replace(' ', "-");
        let parent = format!("Distro-{}", distro_name);
        Self {
            ecosystem,
            gateway,
            licenses,
            distro_name,
            release: release.to_string(),
            parent,
            registry: PackageRegistry::new(),
            relationships: RelationshipStore::new(),
            visited: HashSet::new(),
            pending_recommends: Vec::new(),
        }
    }

    /// The synthetic root label, used by the writer as the document subject.
    pub fn parent(&self) -> &str {
        &self.parent
    }

    pub fn registry(&self) -> &PackageRegistry {
        &self.registry
    }

    pub fn relationships(&self) -> &RelationshipStore {
        &self.relationships
    }

    /// Hand the accumulated collections to the downstream generator.
    pub fn into_parts(self) -> (PackageRegistry, RelationshipStore) {
        (self.registry, self.relationships)
    }

    /// Resolve one requested package and its transitive dependencies.
    ///
    /// A package the package manager does not recognize resolves to
    /// nothing: zero records, zero edges, no error. The caller decides
    /// whether an empty registry is fatal.
    pub fn resolve_package(&mut self, package: &str) {
        self.parent = format!(
            "{}-{}-Package-{}",
            self.distro_name, self.release, package
        );
        self.resolve(package, None);
        self.resolve_pending_recommends();
    }

    /// Resolve every installed package, each as a direct child of the
    /// distro root.
    pub fn resolve_system(&mut self) -> Result<()> {
        let (root, _) = self.insert_distro_root();
        let names = self.ecosystem.list_all(self.gateway)?;
        debug!("Resolving {} installed packages", names.len());
        for name in names {
            self.resolve(&name, Some(root.as_str()));
        }
        self.resolve_pending_recommends();
        Ok(())
    }

    /// Process a captured listing instead of the live system. Snapshot
    /// rows carry no dependency data, so every entry is exactly one level
    /// below the distro root.
    pub fn resolve_snapshot(&mut self, path: &Path) -> Result<()> {
        let entries = self.ecosystem.parse_snapshot(path)?;
        if entries.is_empty() {
            return Ok(());
        }

        let (root, root_id) = self.insert_distro_root();
        let with_ids = self.ecosystem.snapshot_edge_ids();

        for record in entries {
            let mut edge = RelationshipRecord::depends_on(root.clone(), record.name.clone());
            if with_ids {
                edge = edge.with_ids(root_id.clone(), record.id());
            }
            self.registry.insert(record);
            self.relationships.push(edge);
        }
        Ok(())
    }

    /// Depth-first resolution of `package` and everything it requires.
    fn resolve(&mut self, package: &str, parent: Option<&str>) {
        let mut stack: Vec<(String, Option<String>)> =
            vec![(package.to_string(), parent.map(|p| p.to_string()))];

        while let Some((name, parent)) = stack.pop() {
            if self.visited.contains(&name) {
                // Cycle / diamond guard: one more edge, no re-extraction.
                if let Some(parent) = parent {
                    self.relationships.push(RelationshipRecord::depends_on(
                        normalize_name(&parent),
                        normalize_name(&name),
                    ));
                }
                continue;
            }
            // Mark before expanding; this is the cycle guard.
            self.visited.insert(name.clone());

            debug!("Process package {}. Parent {}", name, parent.as_deref().unwrap_or("-"));
            let attributes = match self.ecosystem.query_package(self.gateway, &name) {
                Ok(attributes) => attributes,
                Err(e) => {
                    warn!("Query for {} failed: {}", name, e);
                    continue;
                }
            };
            if attributes.is_empty() {
                debug!("Package {} not found", name);
                continue;
            }

            let record = self
                .ecosystem
                .build_record(&name, &attributes, self.licenses);
            let record_name = record.name.clone();
            if let Some(raw) = self.ecosystem.recommends(&attributes) {
                self.pending_recommends.push((name.clone(), raw));
            }
            self.registry.insert(record);
            match &parent {
                Some(parent) => self.relationships.push(RelationshipRecord::depends_on(
                    normalize_name(parent),
                    record_name,
                )),
                None => self
                    .relationships
                    .push(RelationshipRecord::describes(self.parent.clone(), record_name)),
            }

            let dependencies = self
                .ecosystem
                .dependencies(self.gateway, &name, &attributes);
            for dependency in dependencies.iter().rev() {
                stack.push((dependency.clone(), Some(name.clone())));
            }
        }
    }

    /// Deferred recommends pass: a soft dependency becomes an edge only
    /// when the recommended name was independently resolved during the
    /// main traversal.
    fn resolve_pending_recommends(&mut self) {
        let pending = std::mem::take(&mut self.pending_recommends);
        for (name, raw) in pending {
            for token in self.ecosystem.parse_dependency_field(&raw) {
                if self.visited.contains(&token) {
                    self.relationships.push(RelationshipRecord::depends_on(
                        normalize_name(&name),
                        normalize_name(&token),
                    ));
                } else {
                    debug!("Recommended package {} not installed, no edge", token);
                }
            }
        }
    }

    /// Insert the distro-root record and its DESCRIBES edge; returns the
    /// root's name and id.
    fn insert_distro_root(&mut self) -> (String, String) {
        let record = self
            .ecosystem
            .distro_root_record(&self.distro_name, &self.release);
        let root = record.name.clone();
        let root_id = record.id();
        self.registry.insert(record);
        self.relationships
            .push(RelationshipRecord::describes(self.parent.clone(), root.clone()));
        (root, root_id)
    }
}
