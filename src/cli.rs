//! Command-line interface definitions using clap
//!
//! This module defines the CLI structure for credithub using clap's derive macros.

use clap::{Parser, Subcommand, ValueEnum};

use crate::services::{ImportKind, ImportMode};

/// CreditHub - Free AI API credit campaign marketplace
#[derive(Parser)]
#[command(name = "credithub")]
#[command(version)]
#[command(about = "A marketplace for free AI API credit campaigns", long_about = None)]
pub struct Cli {
    /// Configuration file path
    #[arg(long, short = 'c', global = true, default_value = crate::config::DEFAULT_CONFIG_PATH)]
    pub config: String,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP server (default when no command is given)
    Serve,

    /// Import platforms, campaigns or tags from a JSON bundle or CSV file
    Import {
        /// What to import
        #[arg(value_enum)]
        kind: ImportTarget,

        /// Input file path (`.csv` or JSON)
        file_path: String,

        /// How to handle slugs that already exist
        #[arg(long, value_enum, default_value_t = ImportModeArg::Skip)]
        mode: ImportModeArg,
    },

    /// Insert the default category, AI-model and condition tags when missing
    SeedTags,

    /// Expire overdue campaigns and clear lapsed featured slots
    Sweep,

    /// Mint an access token for a user
    Token {
        /// Subject (user id) of the token
        user_id: String,

        /// Grant the admin role
        #[arg(long)]
        admin: bool,

        /// Lifetime in minutes (default: api.access_token_minutes)
        #[arg(long)]
        minutes: Option<u64>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

/// Configuration management commands
#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Generate example configuration file
    Generate {
        /// Output path (default: config.example.toml)
        output_path: Option<String>,

        /// Force overwrite without confirmation
        #[arg(long)]
        force: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ImportTarget {
    Platforms,
    Campaigns,
    Tags,
}

impl From<ImportTarget> for ImportKind {
    fn from(target: ImportTarget) -> Self {
        match target {
            ImportTarget::Platforms => ImportKind::Platforms,
            ImportTarget::Campaigns => ImportKind::Campaigns,
            ImportTarget::Tags => ImportKind::Tags,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ImportModeArg {
    Skip,
    Overwrite,
    Error,
}

impl From<ImportModeArg> for ImportMode {
    fn from(mode: ImportModeArg) -> Self {
        match mode {
            ImportModeArg::Skip => ImportMode::Skip,
            ImportModeArg::Overwrite => ImportMode::Overwrite,
            ImportModeArg::Error => ImportMode::Error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_command_defaults_to_server() {
        let cli = Cli::try_parse_from(["credithub"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.config, "config.toml");
    }

    #[test]
    fn test_import_command() {
        let cli = Cli::try_parse_from([
            "credithub",
            "--config",
            "/etc/credithub.toml",
            "import",
            "campaigns",
            "seed.csv",
            "--mode",
            "overwrite",
        ])
        .unwrap();

        assert_eq!(cli.config, "/etc/credithub.toml");
        match cli.command {
            Some(Commands::Import {
                kind,
                file_path,
                mode,
            }) => {
                assert_eq!(ImportKind::from(kind), ImportKind::Campaigns);
                assert_eq!(file_path, "seed.csv");
                assert_eq!(ImportMode::from(mode), ImportMode::Overwrite);
            }
            _ => panic!("expected import command"),
        }
    }

    #[test]
    fn test_token_command() {
        let cli =
            Cli::try_parse_from(["credithub", "token", "alice", "--admin", "--minutes", "30"])
                .unwrap();
        match cli.command {
            Some(Commands::Token {
                user_id,
                admin,
                minutes,
            }) => {
                assert_eq!(user_id, "alice");
                assert!(admin);
                assert_eq!(minutes, Some(30));
            }
            _ => panic!("expected token command"),
        }
    }

    #[test]
    fn test_unknown_import_kind_rejected() {
        assert!(Cli::try_parse_from(["credithub", "import", "links", "x.json"]).is_err());
    }
}
