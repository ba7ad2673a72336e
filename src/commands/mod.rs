// src/commands/mod.rs

//! Run orchestration for the tally CLI.
//!
//! Everything here is caller-level per the error-handling design: option
//! validation and the zero-packages check are the only places a run may
//! turn into a terminal failure. Per-package problems never surface past
//! the walker.

use crate::Error;
use crate::cli::Cli;
use crate::ecosystem::{self, EcosystemId};
use crate::gateway::{self, ExecGateway};
use crate::license::LicenseRegistry;
use crate::osrelease;
use crate::output::{self, OutputFormat};
use crate::walker::DependencyWalker;
use anyhow::{Result, bail};
use std::collections::HashMap;
use tracing::{debug, info};

pub fn generate(cli: &Cli) -> Result<()> {
    if cli.name.is_some() && cli.release.is_none() {
        bail!("distro release must be specified when a distro name is given");
    }
    if cli.name.is_none() && cli.release.is_some() {
        bail!("distro name must be specified when a distro release is given");
    }
    if cli.input_file.is_none() && cli.package.is_none() && !cli.system {
        bail!("a distro file, a package name, or --system must be specified");
    }

    let id = select_ecosystem(cli)?;
    debug!("Selected ecosystem: {}", id);

    let os_release = osrelease::load(&cli.root);
    let (name, release) = distro_identity(cli, id, &os_release)?;

    let licenses = LicenseRegistry::new();
    let gateway = ExecGateway;
    let strategy = ecosystem::create(id, &cli.root, &os_release);
    let mut walker = DependencyWalker::new(strategy.as_ref(), &gateway, &licenses, &name, &release);

    if let Some(path) = &cli.input_file {
        if !path.is_file() {
            return Err(Error::NotFound(format!("unable to locate file {}", path.display())).into());
        }
        walker.resolve_snapshot(path)?;
    } else if cli.system {
        info!("Resolving the installed system; this may take some time");
        walker.resolve_system()?;
    } else if let Some(package) = &cli.package {
        walker.resolve_package(package);
    }

    if walker.registry().is_empty() {
        match &cli.package {
            Some(package) => {
                return Err(
                    Error::NotFound(format!("unable to locate package {}", package)).into(),
                );
            }
            None => bail!("no packages resolved"),
        }
    }

    let format: OutputFormat = cli
        .format
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;
    let subject = walker.parent().to_string();
    let (registry, relationships) = walker.into_parts();
    info!(
        "Resolved {} packages, {} relationships",
        registry.len(),
        relationships.len()
    );

    output::write(
        &subject,
        &registry,
        &relationships,
        format,
        cli.output_file.as_deref(),
    )?;
    Ok(())
}

/// Pick the ecosystem, probing for query tools when set to auto, and
/// confirm the tool the live modes need is actually present.
fn select_ecosystem(cli: &Cli) -> Result<EcosystemId> {
    let id = if cli.distro == "auto" {
        match ecosystem::detect() {
            Some(id) => id,
            None => bail!("unable to determine the distro type; use --distro"),
        }
    } else {
        cli.distro
            .parse::<EcosystemId>()
            .map_err(|e| anyhow::anyhow!(e))?
    };

    let live_request = cli.package.is_some() || cli.system;
    if live_request {
        if !id.supports_live_queries() {
            bail!(
                "the {} ecosystem only supports --input-file processing",
                id
            );
        }
        if let Some(binary) = id.required_binary() {
            if !gateway::in_path(binary) {
                bail!(
                    "unable to produce package information: {} is not available",
                    binary
                );
            }
        }
    }
    Ok(id)
}

/// Distribution identity from the options, falling back to the host's
/// release file.
fn distro_identity(
    cli: &Cli,
    id: EcosystemId,
    os_release: &HashMap<String, String>,
) -> Result<(String, String)> {
    if let (Some(name), Some(release)) = (&cli.name, &cli.release) {
        return Ok((name.clone(), release.clone()));
    }

    let name = os_release.get("name").cloned();
    let release = os_release.get("version_id").cloned();
    match (name, release) {
        (Some(name), Some(release)) => Ok((name, release)),
        _ if id == EcosystemId::Windows => {
            Ok(("Windows".to_string(), "unknown".to_string()))
        }
        _ => bail!("unable to determine the distribution identity; use --name and --release"),
    }
}
