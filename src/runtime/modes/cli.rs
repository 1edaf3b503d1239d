//! CLI mode
//!
//! This module contains the CLI mode startup logic.
//! It delegates to the actual CLI implementation.

use crate::cli::Commands;
use crate::interfaces::cli::CliError;

/// Run CLI mode
pub async fn run_cli(cmd: Commands) -> Result<(), CliError> {
    crate::runtime::lifetime::startup::install_crypto_provider()
        .map_err(|e| CliError::CommandError(e.to_string()))?;
    crate::interfaces::cli::run_cli_command(cmd).await
}
