pub use sea_orm_migration::prelude::*;

pub mod entities;
mod m20260301_000001_marketplace_schema;
mod m20260301_000002_taxonomy;
mod m20260301_000003_interactions;
mod m20260302_000001_search_index;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260301_000001_marketplace_schema::Migration),
            Box::new(m20260301_000002_taxonomy::Migration),
            Box::new(m20260301_000003_interactions::Migration),
            Box::new(m20260302_000001_search_index::Migration),
        ]
    }
}
