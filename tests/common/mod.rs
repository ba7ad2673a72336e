// tests/common/mod.rs

//! Shared test fixtures: a scripted command gateway standing in for the
//! package-manager tools, plus dpkg metadata helpers.

#![allow(dead_code)] // not every suite uses every helper

use std::cell::RefCell;
use std::collections::HashMap;
use tally::{CommandGateway, Result};

/// Gateway that answers from a fixed command → output script and records
/// every invocation. Unscripted commands return empty output, which is
/// the "package not found" signal.
#[derive(Default)]
pub struct MockGateway {
    responses: HashMap<String, Vec<String>>,
    calls: RefCell<Vec<String>>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, command: &str, output: &str) -> Self {
        self.responses.insert(
            command.to_string(),
            output.lines().map(|line| line.to_string()).collect(),
        );
        self
    }

    /// How many times `command` was run.
    pub fn call_count(&self, command: &str) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|call| call.as_str() == command)
            .count()
    }
}

impl CommandGateway for MockGateway {
    fn run(&self, command_line: &str) -> Result<Vec<String>> {
        self.calls.borrow_mut().push(command_line.to_string());
        Ok(self.responses.get(command_line).cloned().unwrap_or_default())
    }
}

/// A minimal `dpkg -s` style stanza.
pub fn dpkg_stanza(name: &str, version: &str, depends: &str, recommends: &str) -> String {
    let mut stanza = format!(
        "Package: {}\nStatus: install ok installed\nVersion: {}\nMaintainer: Test Maintainer <test@example.org>\nArchitecture: amd64\nDescription: test package {}\n",
        name, version, name
    );
    if !depends.is_empty() {
        stanza.push_str(&format!("Depends: {}\n", depends));
    }
    if !recommends.is_empty() {
        stanza.push_str(&format!("Recommends: {}\n", recommends));
    }
    stanza
}
