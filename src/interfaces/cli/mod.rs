//! CLI interface module
//!
//! This module provides command-line interface functionality for credithub.

pub mod commands;

use std::fmt;

use crate::cli::{Commands, ConfigCommands};
use crate::services::AppServices;
use crate::storage::StorageFactory;
use commands::{config_generate, import_file, mint_token, run_sweep, seed_tags};

#[derive(Debug)]
pub enum CliError {
    StorageError(String),
    ParseError(String),
    CommandError(String),
}

impl CliError {
    /// Format as simple output
    pub fn format_simple(&self) -> String {
        match self {
            CliError::StorageError(msg) => format!("Storage error: {}", msg),
            CliError::ParseError(msg) => format!("Parse error: {}", msg),
            CliError::CommandError(msg) => format!("Command error: {}", msg),
        }
    }

    /// Format as colored output
    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        match self {
            CliError::StorageError(msg) => {
                format!("{} {}", "Storage error:".red().bold(), msg.white())
            }
            CliError::ParseError(msg) => {
                format!("{} {}", "Parse error:".yellow().bold(), msg.white())
            }
            CliError::CommandError(msg) => {
                format!("{} {}", "Command error:".red().bold(), msg.white())
            }
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for CliError {}

impl From<crate::errors::CreditHubError> for CliError {
    fn from(err: crate::errors::CreditHubError) -> Self {
        match err {
            crate::errors::CreditHubError::Validation(msg)
            | crate::errors::CreditHubError::Serialization(msg)
            | crate::errors::CreditHubError::DateParse(msg) => CliError::ParseError(msg),
            other => CliError::StorageError(other.to_string()),
        }
    }
}

/// 打开数据库并构建 service（需要存储的命令使用）
async fn open_services() -> Result<AppServices, CliError> {
    let storage = StorageFactory::create()
        .await
        .map_err(|e| CliError::StorageError(e.to_string()))?;
    Ok(AppServices::new(storage))
}

/// Run a CLI command from clap-parsed input
///
/// `Serve` is handled by the caller.
pub async fn run_cli_command(cmd: Commands) -> Result<(), CliError> {
    match cmd {
        // 不需要数据库连接
        Commands::Config {
            action: ConfigCommands::Generate { output_path, force },
        } => config_generate(output_path, force).await,

        Commands::Token {
            user_id,
            admin,
            minutes,
        } => mint_token(&user_id, admin, minutes),

        Commands::Import {
            kind,
            file_path,
            mode,
        } => {
            let services = open_services().await?;
            import_file(&services, kind.into(), &file_path, mode.into()).await
        }

        Commands::SeedTags => seed_tags(&open_services().await?).await,

        Commands::Sweep => run_sweep(&open_services().await?).await,

        Commands::Serve => Err(CliError::CommandError(
            "serve is not a CLI command".to_string(),
        )),
    }
}
