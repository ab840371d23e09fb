use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entity::zone::Model as ZoneModel;

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ZoneRequest {
    pub name: String,
    #[schema(value_type = Vec<Vec<f64>>)]
    pub polygon: Vec<[f64; 2]>, // [lat, lng], open or closed
    pub line_group_id: Option<String>,
    pub telegram_group_id: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ZoneResponse {
    pub id: i32,
    pub name: String,
    #[schema(value_type = Vec<Vec<f64>>)]
    pub polygon: Vec<[f64; 2]>,
    pub line_group_id: Option<String>,
    pub telegram_group_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ZoneModel> for ZoneResponse {
    fn from(model: ZoneModel) -> Self {
        Self {
            id: model.id,
            name: model.name,
            polygon: model.polygon.0,
            line_group_id: model.line_group_id,
            telegram_group_id: model.telegram_group_id,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}
