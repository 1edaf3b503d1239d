use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::DatabaseBackend;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();
        let conn = manager.get_connection();

        match backend {
            DatabaseBackend::Postgres => {
                // PostgreSQL: pg_trgm + GIN 索引支持 LOWER(x) LIKE '%keyword%' 搜索
                conn.execute_unprepared("CREATE EXTENSION IF NOT EXISTS pg_trgm")
                    .await?;

                conn.execute_unprepared(
                    "CREATE INDEX IF NOT EXISTS idx_translations_title_trgm ON campaign_translations USING GIN (LOWER(title) gin_trgm_ops)",
                )
                .await?;

                conn.execute_unprepared(
                    "CREATE INDEX IF NOT EXISTS idx_translations_description_trgm ON campaign_translations USING GIN (LOWER(description) gin_trgm_ops)",
                )
                .await?;

                conn.execute_unprepared(
                    "CREATE INDEX IF NOT EXISTS idx_platforms_name_trgm ON platforms USING GIN (LOWER(name) gin_trgm_ops)",
                )
                .await?;
            }
            DatabaseBackend::MySql => {
                // MySQL 的 FULLTEXT 不支持 IF NOT EXISTS，忽略重复创建错误
                conn.execute_unprepared(
                    "ALTER TABLE campaign_translations ADD FULLTEXT INDEX idx_translations_fulltext (title, description)",
                )
                .await
                .ok();
            }
            _ => {
                // SQLite: LIKE '%keyword%' 无法走 B-Tree 索引，小规模部署直接全表扫描
            }
        }

        // 所有数据库：公开列表 "已发布、未删除、按创建时间倒序"
        conn.execute_unprepared(
            "CREATE INDEX IF NOT EXISTS idx_campaigns_listing ON campaigns (status, deleted_at, created_at DESC)",
        )
        .await
        .ok(); // MySQL 8.0 以下不支持 DESC

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();
        let conn = manager.get_connection();

        conn.execute_unprepared("DROP INDEX IF EXISTS idx_campaigns_listing")
            .await
            .ok();

        match backend {
            DatabaseBackend::Postgres => {
                conn.execute_unprepared("DROP INDEX IF EXISTS idx_platforms_name_trgm")
                    .await?;
                conn.execute_unprepared("DROP INDEX IF EXISTS idx_translations_description_trgm")
                    .await?;
                conn.execute_unprepared("DROP INDEX IF EXISTS idx_translations_title_trgm")
                    .await?;
            }
            DatabaseBackend::MySql => {
                conn.execute_unprepared(
                    "ALTER TABLE campaign_translations DROP INDEX idx_translations_fulltext",
                )
                .await
                .ok();
            }
            _ => {}
        }

        Ok(())
    }
}
