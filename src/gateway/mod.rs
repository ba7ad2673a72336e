// src/gateway/mod.rs

//! Execution of package-manager query commands.
//!
//! All metadata extraction goes through the [`CommandGateway`] trait so the
//! traversal engine can be driven by a scripted gateway in tests. The
//! production implementation shells out synchronously and captures stdout.

use crate::error::{Error, Result};
use std::process::Command;
use tracing::debug;

/// Runs a single shell-style command line and returns captured stdout lines.
pub trait CommandGateway {
    /// Execute `command_line` and return its standard output split into lines.
    ///
    /// Embedded NUL bytes are stripped before execution and the command line
    /// is split on whitespace. Standard error is discarded. A non-zero exit
    /// with empty stdout is indistinguishable from "no matching package" and
    /// yields an empty vector.
    fn run(&self, command_line: &str) -> Result<Vec<String>>;
}

/// Gateway that executes commands on the live system.
///
/// Every call blocks until the child process exits; there is no timeout.
#[derive(Debug, Default)]
pub struct ExecGateway;

impl CommandGateway for ExecGateway {
    fn run(&self, command_line: &str) -> Result<Vec<String>> {
        let cleaned = command_line.replace('\0', "");
        let mut params = cleaned.split_whitespace();
        let program = params
            .next()
            .ok_or_else(|| Error::Gateway("empty command line".to_string()))?;

        debug!("Running: {}", cleaned);
        let output = Command::new(program)
            .args(params)
            .output()
            .map_err(|e| Error::Gateway(format!("failed to run {}: {}", program, e)))?;

        let lines: Vec<String> = String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(|s| s.to_string())
            .collect();

        Ok(lines)
    }
}

/// Check whether a package-manager binary is present on the search path.
///
/// Used by ecosystem auto-detection before any traversal starts.
pub fn in_path(binary: &str) -> bool {
    let path = std::env::var_os("PATH").unwrap_or_default();
    std::env::split_paths(&path).any(|dir| dir.join(binary).is_file())
}

/// Extra query flags supplied through an environment variable.
///
/// Returns an empty string when the variable is unset, so the value can be
/// spliced into a command template unconditionally.
pub fn env_options(var: &str) -> String {
    std::env::var(var).unwrap_or_default().trim().to_string()
}

/// Join non-empty command fragments with single spaces.
pub fn command_line(parts: &[&str]) -> String {
    parts
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
