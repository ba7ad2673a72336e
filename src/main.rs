// src/main.rs

use anyhow::Result;
use clap::{CommandFactory, Parser};
use tally::cli::Cli;

fn main() -> Result<()> {
    // stdout carries the document; logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Some(shell) = cli.completions {
        let mut command = Cli::command();
        clap_complete::generate(shell, &mut command, "tally", &mut std::io::stdout());
        return Ok(());
    }

    tally::commands::generate(&cli)
}
