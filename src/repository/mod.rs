mod sea;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::DbErr;

use crate::entity::complaint::{self, ComplaintStatus};
use crate::entity::zone;
use crate::model::complaint::ComplaintDetail;

pub use sea::SeaOrmRepository;

pub const LINE_ACCESS_TOKEN: &str = "LINE_ACCESS_TOKEN";
pub const TELEGRAM_BOT_TOKEN: &str = "TELEGRAM_BOT_TOKEN";

#[derive(Debug, Clone, PartialEq)]
pub struct NewReopenLog {
    pub reason: String,
    pub reporter_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Field changes applied by a lifecycle transition. `None` leaves a column untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComplaintChanges {
    pub status: Option<ComplaintStatus>,
    pub message: Option<String>,
    pub image_after: Option<Option<String>>,
    pub notified_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub reopen_log: Option<NewReopenLog>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ZoneFields {
    pub name: String,
    pub polygon: Vec<[f64; 2]>,
    pub line_group_id: Option<String>,
    pub telegram_group_id: Option<String>,
}

#[async_trait]
pub trait ComplaintRepository: Send + Sync {
    async fn find_complaint(&self, id: &str) -> Result<Option<ComplaintDetail>, DbErr>;

    async fn create_complaint(&self, complaint: complaint::Model) -> Result<ComplaintDetail, DbErr>;

    /// Applies `changes` only while the stored status is one of `expected`,
    /// atomically with the optional reopen log. `Ok(None)` when the row is gone
    /// or its status moved on.
    async fn update_complaint(
        &self,
        id: &str,
        expected: &[ComplaintStatus],
        changes: ComplaintChanges,
    ) -> Result<Option<ComplaintDetail>, DbErr>;

    async fn delete_complaint(&self, id: &str) -> Result<bool, DbErr>;
}

#[async_trait]
pub trait ZoneRepository: Send + Sync {
    async fn find_zone_by_id(&self, id: i32) -> Result<Option<zone::Model>, DbErr>;

    async fn find_zone_by_name(&self, name: &str) -> Result<Option<zone::Model>, DbErr>;

    /// Zones in stored order.
    async fn list_zones(&self) -> Result<Vec<zone::Model>, DbErr>;

    async fn create_zone(&self, fields: ZoneFields, now: DateTime<Utc>) -> Result<zone::Model, DbErr>;

    async fn update_zone(
        &self,
        id: i32,
        fields: ZoneFields,
        now: DateTime<Utc>,
    ) -> Result<Option<zone::Model>, DbErr>;

    async fn delete_zone(&self, id: i32) -> Result<bool, DbErr>;
}

#[async_trait]
pub trait SettingStore: Send + Sync {
    async fn get_setting(&self, key: &str) -> Result<Option<String>, DbErr>;
}
