//! `config generate`：写出带默认值的配置模板

use std::io::{self, BufRead, Write};
use std::path::Path;

use colored::Colorize;

use crate::config::StaticConfig;
use crate::interfaces::cli::CliError;

const DEFAULT_OUTPUT: &str = "config.example.toml";

/// 部署前通常需要修改的键
const KEYS_TO_REVIEW: &[(&str, &str)] = &[
    ("api.jwt_secret", "empty means a random secret per process"),
    ("database.database_url", "sqlite file in the working directory"),
    ("api.cors_allowed_origins", "browser origins allowed to call the API"),
    ("marketplace.supported_locales", "first entry is the fallback locale"),
];

fn render_template() -> String {
    format!(
        "# credithub configuration\n\
         # Every key can be overridden with CH__<SECTION>__<KEY>, e.g. CH__SERVER__PORT=9000\n\n{}",
        StaticConfig::generate_sample_config()
    )
}

fn confirm_overwrite(path: &str) -> Result<bool, CliError> {
    print!(
        "{} {} {}",
        "File already exists:".yellow(),
        path.blue(),
        "Overwrite? [y/N] ".yellow()
    );
    io::stdout()
        .flush()
        .map_err(|e| CliError::CommandError(e.to_string()))?;

    let mut answer = String::new();
    io::stdin()
        .lock()
        .read_line(&mut answer)
        .map_err(|e| CliError::CommandError(e.to_string()))?;
    Ok(answer.trim().eq_ignore_ascii_case("y"))
}

pub async fn config_generate(output_path: Option<String>, force: bool) -> Result<(), CliError> {
    let path = output_path.unwrap_or_else(|| DEFAULT_OUTPUT.to_string());

    if !force && Path::new(&path).exists() && !confirm_overwrite(&path)? {
        println!("{}", "Aborted.".red());
        return Ok(());
    }

    let content = render_template();
    if let Some(parent) = Path::new(&path).parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|e| {
            CliError::CommandError(format!("Unable to create {}: {}", parent.display(), e))
        })?;
    }
    std::fs::write(&path, content)
        .map_err(|e| CliError::CommandError(format!("Unable to write {}: {}", path, e)))?;

    println!("{} Wrote {}", "✓".bold().green(), path.blue());
    println!("  Review before deploying:");
    for (key, hint) in KEYS_TO_REVIEW {
        println!("    {} {}", key.cyan(), hint.dimmed());
    }
    Ok(())
}
