use sea_orm::Schema;
use sea_orm_migration::prelude::*;
use crate::entity::reopen_log::{Column, Entity};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let schema = Schema::new(manager.get_database_backend());
        manager
            .create_table(
                schema
                    .create_table_from_entity(Entity)
                    .if_not_exists()
                    .to_owned()
            )
            .await?;

        // logs are always read per complaint, oldest first
        manager
            .create_index(
                Index::create()
                    .name("idx_reopen_logs_complaint_id")
                    .table(Entity)
                    .col(Column::ComplaintId)
                    .col(Column::CreatedAt)
                    .to_owned()
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Entity).if_exists().to_owned())
            .await
    }
}
