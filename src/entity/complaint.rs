use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "complaints")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub source: Source,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub reporter_name: Option<String>,
    pub received_by: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>, // "lat,lng"
    pub status: ComplaintStatus,
    #[sea_orm(column_type = "Text", nullable)]
    pub message: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub image_before: Option<String>, // comma-joined urls
    #[sea_orm(column_type = "Text", nullable)]
    pub image_after: Option<String>,
    pub zone_id: Option<i32>,
    pub zone_name: Option<String>,
    pub line_user_id: Option<String>,
    pub notified_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, DeriveActiveEnum, ToSchema)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "complaint_source")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Source {
    #[sea_orm(string_value = "LINE")]
    Line,

    #[sea_orm(string_value = "FACEBOOK")]
    Facebook,

    #[sea_orm(string_value = "PHONE")]
    Phone,

    #[sea_orm(string_value = "COUNTER")]
    Counter,

    #[sea_orm(string_value = "OTHER")]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, DeriveActiveEnum, ToSchema)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "complaint_status")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComplaintStatus {
    #[sea_orm(string_value = "PENDING")]
    Pending,

    #[sea_orm(string_value = "DONE")]
    Done,

    #[sea_orm(string_value = "VERIFIED")]
    Verified,

    #[sea_orm(string_value = "REJECTED")]
    Rejected,

    #[sea_orm(string_value = "CANCELLED")]
    Cancelled,

    #[sea_orm(string_value = "REOPENED")]
    Reopened,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::reopen_log::Entity")]
    ReopenLog,
}

impl Related<super::reopen_log::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ReopenLog.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl ActiveModel {
    pub fn from_new_complaint(model: Model) -> Self {
        Self {
            id: Set(model.id),
            source: Set(model.source),
            description: Set(model.description),
            reporter_name: Set(model.reporter_name),
            received_by: Set(model.received_by),
            phone: Set(model.phone),
            location: Set(model.location),
            status: Set(model.status),
            message: Set(model.message),
            image_before: Set(model.image_before),
            image_after: Set(model.image_after),
            zone_id: Set(model.zone_id),
            zone_name: Set(model.zone_name),
            line_user_id: Set(model.line_user_id),
            notified_at: Set(model.notified_at),
            created_at: Set(model.created_at),
            updated_at: Set(model.updated_at),
        }
    }
}

impl Model {
    /// Every stored image url, before and after, with blanks dropped.
    pub fn image_urls(&self) -> Vec<String> {
        [self.image_before.as_deref(), self.image_after.as_deref()]
            .into_iter()
            .flatten()
            .flat_map(|list| list.split(','))
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .map(str::to_string)
            .collect()
    }
}
