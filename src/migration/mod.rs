pub use sea_orm_migration::prelude::*;

mod m20261001_000001_create_zone_table;
mod m20261001_000002_create_complaint_table;
mod m20261001_000003_create_reopen_log_table;
mod m20261001_000004_create_setting_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20261001_000001_create_zone_table::Migration),
            Box::new(m20261001_000002_create_complaint_table::Migration),
            Box::new(m20261001_000003_create_reopen_log_table::Migration),
            Box::new(m20261001_000004_create_setting_table::Migration),
        ]
    }
}
