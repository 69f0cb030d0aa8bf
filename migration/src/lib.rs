//! Database migrations for the Comunica Hub service.
//!
//! This module contains all database migrations using SeaORM Migration.

pub use sea_orm_migration::prelude::*;

mod m2026_02_01_000001_create_publications;
mod m2026_02_01_000002_create_search_history;
mod m2026_02_01_000003_create_notifications;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m2026_02_01_000001_create_publications::Migration),
            Box::new(m2026_02_01_000002_create_search_history::Migration),
            Box::new(m2026_02_01_000003_create_notifications::Migration),
        ]
    }
}
