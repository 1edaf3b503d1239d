//! Maintenance commands: tag seeding and the moderation sweep

use colored::Colorize;

use crate::interfaces::cli::CliError;
use crate::services::AppServices;

pub async fn seed_tags(services: &AppServices) -> Result<(), CliError> {
    let report = services.tags.seed_defaults().await?;
    println!(
        "{} Default tags seeded: {} created, {} already present",
        "✓".bold().green(),
        report.created.to_string().green(),
        report.existing
    );
    Ok(())
}

pub async fn run_sweep(services: &AppServices) -> Result<(), CliError> {
    let report = services.moderation.sweep(chrono::Utc::now()).await?;
    println!(
        "{} Sweep finished: {} campaigns expired, {} featured slots cleared",
        "✓".bold().green(),
        report.expired.to_string().yellow(),
        report.unfeatured.to_string().yellow()
    );
    Ok(())
}
