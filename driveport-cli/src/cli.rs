//! # Command-Line Interface
//!
//! Argument definitions for the `driveport` binary.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

const DEFAULT_CONFIG_FILE: &str = "driveport.toml";

/// Resumable extraction of cloud drive trees for provider migrations
#[derive(Debug, Parser)]
#[command(name = "driveport", version, about)]
pub struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Extract a remote folder tree to local disk, resumably
    Extract(ExtractArgs),
    /// Count a remote tree's entries by MIME type
    Census(CensusArgs),
}

#[derive(Debug, Args)]
pub struct ExtractArgs {
    /// Identifier of the remote folder to extract
    #[arg(long)]
    pub folder_id: String,

    /// Build the plan and local directory skeleton without transferring
    #[arg(long)]
    pub structure_only: bool,

    /// Abort the run if any remote folder cannot be listed
    #[arg(long)]
    pub strict_walk: bool,
}

#[derive(Debug, Args)]
pub struct CensusArgs {
    /// Identifier of the remote folder to inventory
    #[arg(long)]
    pub folder_id: String,
}
