use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tracing::{debug, instrument};

use super::{ComplaintChanges, ComplaintRepository, SettingStore, ZoneFields, ZoneRepository};
use crate::entity::complaint::{self, ComplaintStatus, Entity as ComplaintEntity};
use crate::entity::reopen_log::{self, Entity as ReopenLogEntity};
use crate::entity::setting::Entity as SettingEntity;
use crate::entity::zone::{self, Entity as ZoneEntity, Polygon};
use crate::model::complaint::ComplaintDetail;

#[derive(Clone)]
pub struct SeaOrmRepository {
    db: DatabaseConnection,
}

impl SeaOrmRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

async fn load_reopen_logs<C: ConnectionTrait>(
    conn: &C,
    complaint_id: &str,
) -> Result<Vec<reopen_log::Model>, DbErr> {
    ReopenLogEntity::find()
        .filter(reopen_log::Column::ComplaintId.eq(complaint_id))
        .order_by_asc(reopen_log::Column::CreatedAt)
        .order_by_asc(reopen_log::Column::Id)
        .all(conn)
        .await
}

#[async_trait]
impl ComplaintRepository for SeaOrmRepository {
    async fn find_complaint(&self, id: &str) -> Result<Option<ComplaintDetail>, DbErr> {
        let Some(complaint) = ComplaintEntity::find_by_id(id.to_owned()).one(&self.db).await? else {
            return Ok(None);
        };
        let reopen_logs = load_reopen_logs(&self.db, id).await?;

        Ok(Some(ComplaintDetail { complaint, reopen_logs }))
    }

    async fn create_complaint(&self, complaint: complaint::Model) -> Result<ComplaintDetail, DbErr> {
        let inserted = complaint::ActiveModel::from_new_complaint(complaint)
            .insert(&self.db)
            .await?;

        Ok(ComplaintDetail {
            complaint: inserted,
            reopen_logs: Vec::new(),
        })
    }

    #[instrument(skip(self, changes))]
    async fn update_complaint(
        &self,
        id: &str,
        expected: &[ComplaintStatus],
        changes: ComplaintChanges,
    ) -> Result<Option<ComplaintDetail>, DbErr> {
        let txn = self.db.begin().await?;

        let current = ComplaintEntity::find_by_id(id.to_owned())
            .lock_exclusive()
            .one(&txn)
            .await?;

        let Some(current) = current else {
            return Ok(None);
        };
        if !expected.contains(&current.status) {
            debug!(status = ?current.status, "status changed under us, skipping update");
            txn.rollback().await?;
            return Ok(None);
        }

        let mut active: complaint::ActiveModel = current.into();
        if let Some(status) = changes.status {
            active.status = Set(status);
        }
        if let Some(message) = changes.message {
            active.message = Set(Some(message));
        }
        if let Some(image_after) = changes.image_after {
            active.image_after = Set(image_after);
        }
        if let Some(notified_at) = changes.notified_at {
            active.notified_at = Set(Some(notified_at));
        }
        if let Some(updated_at) = changes.updated_at {
            active.updated_at = Set(updated_at);
        }
        let updated = active.update(&txn).await?;

        if let Some(log) = changes.reopen_log {
            reopen_log::ActiveModel {
                complaint_id: Set(id.to_owned()),
                reason: Set(log.reason),
                reporter_name: Set(log.reporter_name),
                created_at: Set(log.created_at),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
        }

        let reopen_logs = load_reopen_logs(&txn, id).await?;
        txn.commit().await?;

        Ok(Some(ComplaintDetail {
            complaint: updated,
            reopen_logs,
        }))
    }

    async fn delete_complaint(&self, id: &str) -> Result<bool, DbErr> {
        let txn = self.db.begin().await?;

        ReopenLogEntity::delete_many()
            .filter(reopen_log::Column::ComplaintId.eq(id))
            .exec(&txn)
            .await?;
        let result = ComplaintEntity::delete_by_id(id.to_owned()).exec(&txn).await?;

        txn.commit().await?;
        Ok(result.rows_affected > 0)
    }
}

#[async_trait]
impl ZoneRepository for SeaOrmRepository {
    async fn find_zone_by_id(&self, id: i32) -> Result<Option<zone::Model>, DbErr> {
        ZoneEntity::find_by_id(id).one(&self.db).await
    }

    async fn find_zone_by_name(&self, name: &str) -> Result<Option<zone::Model>, DbErr> {
        ZoneEntity::find()
            .filter(zone::Column::Name.eq(name))
            .one(&self.db)
            .await
    }

    async fn list_zones(&self) -> Result<Vec<zone::Model>, DbErr> {
        ZoneEntity::find()
            .order_by_asc(zone::Column::Id)
            .all(&self.db)
            .await
    }

    async fn create_zone(&self, fields: ZoneFields, now: DateTime<Utc>) -> Result<zone::Model, DbErr> {
        zone::ActiveModel {
            name: Set(fields.name),
            polygon: Set(Polygon(fields.polygon)),
            line_group_id: Set(fields.line_group_id),
            telegram_group_id: Set(fields.telegram_group_id),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.db)
        .await
    }

    async fn update_zone(
        &self,
        id: i32,
        fields: ZoneFields,
        now: DateTime<Utc>,
    ) -> Result<Option<zone::Model>, DbErr> {
        let Some(existing) = ZoneEntity::find_by_id(id).one(&self.db).await? else {
            return Ok(None);
        };

        let mut active: zone::ActiveModel = existing.into();
        active.name = Set(fields.name);
        active.polygon = Set(Polygon(fields.polygon));
        active.line_group_id = Set(fields.line_group_id);
        active.telegram_group_id = Set(fields.telegram_group_id);
        active.updated_at = Set(now);

        Ok(Some(active.update(&self.db).await?))
    }

    async fn delete_zone(&self, id: i32) -> Result<bool, DbErr> {
        let result = ZoneEntity::delete_by_id(id).exec(&self.db).await?;
        Ok(result.rows_affected > 0)
    }
}

#[async_trait]
impl SettingStore for SeaOrmRepository {
    async fn get_setting(&self, key: &str) -> Result<Option<String>, DbErr> {
        let setting = SettingEntity::find_by_id(key.to_owned()).one(&self.db).await?;
        Ok(setting
            .map(|s| s.value.trim().to_string())
            .filter(|value| !value.is_empty()))
    }
}
