// src/cli.rs
//! Command-line interface definitions.
//!
//! Option validation and the actual run orchestration live in the
//! `commands` module.

use clap::Parser;
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "tally")]
#[command(version)]
#[command(
    about = "Generate a software bill of materials for the specified package or distribution",
    long_about = None
)]
pub struct Cli {
    /// Packaging ecosystem to inspect
    #[arg(long, default_value = "auto", value_parser = ["deb", "rpm", "freebsd", "windows", "auto"])]
    pub distro: String,

    /// Captured package listing to process instead of querying the system
    #[arg(short, long)]
    pub input_file: Option<PathBuf>,

    /// Name of the distribution
    #[arg(short, long)]
    pub name: Option<String>,

    /// Release identity of the distribution
    #[arg(short, long)]
    pub release: Option<String>,

    /// Single package to resolve, together with its dependencies
    #[arg(short, long)]
    pub package: Option<String>,

    /// Inventory every installed package
    #[arg(short, long)]
    pub system: bool,

    /// Alternate filesystem root to inspect
    #[arg(long, default_value = "/")]
    pub root: PathBuf,

    /// Output format
    #[arg(long, default_value = "tag", value_parser = ["tag", "json"])]
    pub format: String,

    /// Output file (stdout when omitted)
    #[arg(short, long)]
    pub output_file: Option<PathBuf>,

    /// Emit shell completions and exit
    #[arg(long, value_enum)]
    pub completions: Option<Shell>,
}
