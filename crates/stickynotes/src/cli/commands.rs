//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand};

/// List command arguments.
#[derive(Debug, Args)]
pub struct ListCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Show command arguments.
#[derive(Debug, Args)]
pub struct ShowCommand {
    /// Note id
    pub id: i64,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Add command arguments.
#[derive(Debug, Args)]
pub struct AddCommand {
    /// Note title
    pub title: String,

    /// Note content (rich-text markup)
    #[arg(long, default_value = "")]
    pub content: String,

    /// Output the saved note as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Edit command arguments.
#[derive(Debug, Args)]
pub struct EditCommand {
    /// Note id
    pub id: i64,

    /// Replacement content
    pub content: String,
}

/// Delete command arguments.
#[derive(Debug, Args)]
pub struct DeleteCommand {
    /// Note id
    pub id: i64,
}

/// Pin command arguments.
#[derive(Debug, Args)]
pub struct PinCommand {
    /// Note id
    pub id: i64,
}

/// Status command arguments.
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}
