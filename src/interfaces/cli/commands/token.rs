//! Mint access tokens for operators and scripts

use colored::Colorize;

use crate::api::jwt::{JwtService, Role};
use crate::config::get_config;
use crate::interfaces::cli::CliError;

pub fn mint_token(user_id: &str, admin: bool, minutes: Option<u64>) -> Result<(), CliError> {
    let config = get_config();
    if config.api.jwt_secret.is_empty() {
        return Err(CliError::CommandError(
            "api.jwt_secret is empty; a token signed with a random secret would be useless"
                .to_string(),
        ));
    }
    if user_id.trim().is_empty() {
        return Err(CliError::ParseError("user id must not be empty".to_string()));
    }

    let role = if admin { Role::Admin } else { Role::User };
    let minutes = minutes.unwrap_or(config.api.access_token_minutes);
    let service = JwtService::new(&config.api.jwt_secret, config.api.access_token_minutes);
    let token = service
        .generate_token_with_ttl(user_id.trim(), role, minutes)
        .map_err(|e| CliError::CommandError(format!("Failed to sign token: {}", e)))?;

    eprintln!(
        "{} {} token for {} (valid {} min)",
        "✓".bold().green(),
        role.to_string().cyan(),
        user_id.trim().blue(),
        minutes
    );
    // token 单独输出到 stdout，便于脚本捕获
    println!("{}", token);
    Ok(())
}
