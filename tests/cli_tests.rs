//! CLI command tests
//!
//! 只覆盖不依赖全局数据库连接的命令路径。

use std::sync::Arc;

use credithub::config::StaticConfig;
use credithub::interfaces::cli::CliError;
use credithub::interfaces::cli::commands::{config_generate, import_file, mint_token};
use credithub::services::{AppServices, ImportKind, ImportMode};
use credithub::storage::SeaOrmStorage;
use tempfile::TempDir;

async fn setup() -> (TempDir, AppServices) {
    let dir = TempDir::new().unwrap();
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("cli.db").display());
    let storage = SeaOrmStorage::new(&url, "sqlite").await.unwrap();
    (dir, AppServices::new(Arc::new(storage)))
}

#[tokio::test]
async fn test_config_generate_writes_loadable_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("credithub.toml");
    let path_str = path.to_string_lossy().to_string();

    config_generate(Some(path_str.clone()), true).await.unwrap();
    assert!(path.exists());

    let content = std::fs::read_to_string(&path).unwrap();
    assert!(content.contains("[server]"));
    assert!(content.contains("[marketplace]"));

    let loaded = StaticConfig::load(&path_str);
    let defaults = StaticConfig::default();
    assert_eq!(loaded.server.port, defaults.server.port);
    assert_eq!(loaded.api.public_prefix, "/api");
    assert_eq!(
        loaded.marketplace.supported_locales,
        defaults.marketplace.supported_locales
    );
}

#[tokio::test]
async fn test_config_generate_force_overwrites() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "garbage = true\n").unwrap();

    config_generate(Some(path.to_string_lossy().to_string()), true)
        .await
        .unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    assert!(!content.contains("garbage"));
}

#[tokio::test]
async fn test_import_missing_file() {
    let (dir, services) = setup().await;
    let missing = dir.path().join("nope.json");

    let err = import_file(
        &services,
        ImportKind::Campaigns,
        &missing.to_string_lossy(),
        ImportMode::Skip,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, CliError::CommandError(msg) if msg.contains("File not found")));
}

#[tokio::test]
async fn test_import_tags_file() {
    let (dir, services) = setup().await;
    let path = dir.path().join("tags.json");
    std::fs::write(
        &path,
        r#"[{"name":"Embeddings","kind":"category"},{"name":"Llama 3","kind":"ai_model"}]"#,
    )
    .unwrap();

    import_file(
        &services,
        ImportKind::Tags,
        &path.to_string_lossy(),
        ImportMode::Skip,
    )
    .await
    .unwrap();

    let tags = services.tags.list_tags(None).await.unwrap();
    assert!(tags.iter().any(|t| t.slug == "embeddings"));
    assert!(tags.iter().any(|t| t.slug == "llama-3"));
}

#[test]
fn test_mint_token_rejects_blank_user() {
    let err = mint_token("   ", false, None).unwrap_err();
    // 未配置密钥时先报密钥错误，否则报用户 id 错误
    assert!(matches!(
        err,
        CliError::CommandError(_) | CliError::ParseError(_)
    ));
}

#[test]
fn test_cli_error_formatting() {
    let err = CliError::ParseError("bad date".to_string());
    assert_eq!(err.to_string(), "Parse error: bad date");
    assert!(err.format_colored().contains("bad date"));
}
