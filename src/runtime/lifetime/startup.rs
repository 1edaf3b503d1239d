use anyhow::{Context, Result};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::config::get_config;
use crate::services::AppServices;
use crate::storage::{SeaOrmStorage, StorageFactory};

pub struct StartupContext {
    pub storage: Arc<SeaOrmStorage>,
    pub services: Arc<AppServices>,
}

/// 准备服务器启动的上下文
/// 包括存储、业务 service 与后台清理任务
pub async fn prepare_server_startup() -> Result<StartupContext> {
    let start_time = std::time::Instant::now();
    debug!("Starting pre-startup processing...");

    install_crypto_provider()?;

    let storage = StorageFactory::create()
        .await
        .context("Failed to create storage backend")?;
    info!("Using storage backend: {}", storage.backend_name());

    let services = Arc::new(AppServices::new(storage.clone()));

    if get_config().api.jwt_secret.is_empty() {
        warn!("api.jwt_secret is empty: tokens will not survive a restart");
    }

    spawn_sweep_task(services.clone());

    info!(
        "Pre-startup processing completed in {} ms",
        start_time.elapsed().as_millis()
    );

    Ok(StartupContext { storage, services })
}

/// rustls 需要进程级 crypto provider（数据库 TLS 连接使用）
pub fn install_crypto_provider() -> Result<()> {
    // 已安装时返回 Err，重复调用视为成功
    if rustls::crypto::CryptoProvider::get_default().is_some() {
        return Ok(());
    }
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|e| anyhow::anyhow!("Failed to install rustls crypto provider: {:?}", e))
}

/// 周期性执行过期与推荐位清理
fn spawn_sweep_task(services: Arc<AppServices>) {
    let interval_secs = get_config().marketplace.sweep_interval_secs;
    if interval_secs == 0 {
        warn!("marketplace.sweep_interval_secs is 0, background sweep disabled");
        return;
    }

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
        loop {
            ticker.tick().await;
            match services.moderation.sweep(Utc::now()).await {
                Ok(report) if report.expired > 0 || report.unfeatured > 0 => {
                    info!(
                        "Background sweep: {} expired, {} unfeatured",
                        report.expired, report.unfeatured
                    );
                }
                Ok(_) => debug!("Background sweep: nothing to do"),
                Err(e) => error!("Background sweep failed: {}", e),
            }
        }
    });
    debug!("Background sweep scheduled every {}s", interval_secs);
}
