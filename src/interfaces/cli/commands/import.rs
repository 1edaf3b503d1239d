//! Import command

use colored::Colorize;
use std::path::Path;

use crate::interfaces::cli::CliError;
use crate::services::{AppServices, ImportKind, ImportMode};

/// 显示的最大错误条数
const MAX_ERRORS_SHOWN: usize = 20;

pub async fn import_file(
    services: &AppServices,
    kind: ImportKind,
    file_path: &str,
    mode: ImportMode,
) -> Result<(), CliError> {
    let path = Path::new(file_path);
    if !path.exists() {
        return Err(CliError::CommandError(format!(
            "File not found: {}",
            file_path
        )));
    }

    println!(
        "{} Importing {} from {} (mode: {})",
        "→".bold().blue(),
        kind.to_string().cyan(),
        file_path.blue(),
        mode
    );

    let report = services.imports.import_file(kind, path, mode).await?;

    println!(
        "{} Import finished: {} imported, {} skipped, {} failed",
        if report.failed == 0 {
            "✓".bold().green()
        } else {
            "⚠".bold().yellow()
        },
        report.success.to_string().green(),
        report.skipped.to_string().yellow(),
        report.failed.to_string().red()
    );

    for err in report.errors.iter().take(MAX_ERRORS_SHOWN) {
        println!("  {} {}: {}", "✗".red(), err.item.bold(), err.message);
    }
    if report.errors.len() > MAX_ERRORS_SHOWN {
        println!(
            "  {} ... and {} more",
            "✗".red(),
            report.errors.len() - MAX_ERRORS_SHOWN
        );
    }

    Ok(())
}
