//! Command-line interface for stickynotes.
//!
//! This module provides the CLI structure for the `stickies` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    AddCommand, ConfigCommand, DeleteCommand, EditCommand, ListCommand, PinCommand, ShowCommand,
    StatusCommand,
};

/// stickies - Sticky notes with a pinned always-on-top window
///
/// Runs the note service over stdin/stdout for a window front end, and
/// offers quick access to the note store from the terminal.
#[derive(Debug, Parser)]
#[command(name = "stickies")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the note service, reading JSON requests from stdin
    Serve,

    /// List all notes, pinned first
    List(ListCommand),

    /// Show one note
    Show(ShowCommand),

    /// Create a note
    Add(AddCommand),

    /// Replace a note's content
    Edit(EditCommand),

    /// Delete a note
    Delete(DeleteCommand),

    /// Toggle a note's pin (pinning unpins every other note)
    Pin(PinCommand),

    /// Show store statistics
    Status(StatusCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        crate::logging::Verbosity::from_flags(self.verbose, self.quiet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn cli(verbose: u8, quiet: bool) -> Cli {
        Cli {
            config: None,
            verbose,
            quiet,
            command: Command::Status(StatusCommand { json: false }),
        }
    }

    #[test]
    fn test_cli_name() {
        let cli = Cli::command();
        assert_eq!(cli.get_name(), "stickies");
    }

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(cli(0, true).verbosity(), crate::logging::Verbosity::Quiet);
        assert_eq!(cli(0, false).verbosity(), crate::logging::Verbosity::Normal);
        assert_eq!(cli(1, false).verbosity(), crate::logging::Verbosity::Verbose);
        assert_eq!(cli(2, false).verbosity(), crate::logging::Verbosity::Trace);
    }

    #[test]
    fn test_quiet_wins_over_verbose() {
        assert_eq!(cli(2, true).verbosity(), crate::logging::Verbosity::Quiet);
    }

    #[test]
    fn test_cli_verify() {
        // Verify the CLI structure is valid
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_serve() {
        let cli = Cli::try_parse_from(["stickies", "serve"]).unwrap();
        assert!(matches!(cli.command, Command::Serve));
    }

    #[test]
    fn test_parse_add() {
        let cli =
            Cli::try_parse_from(["stickies", "add", "Groceries", "--content", "<p>milk</p>"])
                .unwrap();
        match cli.command {
            Command::Add(cmd) => {
                assert_eq!(cmd.title, "Groceries");
                assert_eq!(cmd.content, "<p>milk</p>");
                assert!(!cmd.json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_add_defaults_to_empty_content() {
        let cli = Cli::try_parse_from(["stickies", "add", "Empty"]).unwrap();
        assert!(matches!(cli.command, Command::Add(AddCommand { ref content, .. }) if content.is_empty()));
    }

    #[test]
    fn test_parse_edit() {
        let cli = Cli::try_parse_from(["stickies", "edit", "3", "<p>new</p>"]).unwrap();
        assert!(matches!(cli.command, Command::Edit(EditCommand { id: 3, .. })));
    }

    #[test]
    fn test_parse_rejects_non_numeric_id() {
        assert!(Cli::try_parse_from(["stickies", "delete", "three"]).is_err());
    }

    #[test]
    fn test_parse_config_validate() {
        let cli = Cli::try_parse_from(["stickies", "config", "validate", "-f", "/tmp/c.toml"])
            .unwrap();
        assert!(matches!(
            cli.command,
            Command::Config(ConfigCommand::Validate { file: Some(_) })
        ));
    }

    #[test]
    fn test_parse_with_config() {
        let args = vec!["stickies", "-c", "/custom/config.toml", "status"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/custom/config.toml")));
    }

    #[test]
    fn test_parse_with_verbose() {
        let args = vec!["stickies", "-v", "list"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert_eq!(cli.verbose, 1);
    }

    #[test]
    fn test_parse_with_quiet() {
        let args = vec!["stickies", "-q", "status"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert!(cli.quiet);
    }
}
