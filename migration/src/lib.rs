pub use sea_orm_migration::prelude::*;

mod m20251001_000001_create_accounts;
mod m20251001_000002_create_catalog;
mod m20251001_000003_create_ratings;
mod m20251001_000004_create_geographic;
mod m20251001_000005_create_petitions;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20251001_000001_create_accounts::Migration),
            Box::new(m20251001_000002_create_catalog::Migration),
            Box::new(m20251001_000003_create_ratings::Migration),
            Box::new(m20251001_000004_create_geographic::Migration),
            Box::new(m20251001_000005_create_petitions::Migration),
        ]
    }
}
