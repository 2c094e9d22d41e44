//! Binary crate for the weather ingestion pipeline.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Wiring config, client and storage together
//! - Human-friendly run summary output

use clap::Parser;

mod cli;
mod ingest;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    ingest::init_tracing();

    let cmd = cli::Cli::parse();
    cmd.run().await
}
