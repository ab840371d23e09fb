use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entity::complaint::{ComplaintStatus, Model as ComplaintModel, Source};
use crate::entity::reopen_log::Model as ReopenLogModel;
use crate::util::image_store::ImageUpload;

/// A complaint together with its reopen history, oldest log first.
#[derive(Debug, Clone, PartialEq)]
pub struct ComplaintDetail {
    pub complaint: ComplaintModel,
    pub reopen_logs: Vec<ReopenLogModel>,
}

impl ComplaintDetail {
    pub fn latest_reopen_reason(&self) -> Option<&str> {
        self.reopen_logs.last().map(|log| log.reason.as_str())
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateComplaintRequest {
    pub source: Source,
    pub description: String,
    pub reporter_name: Option<String>,
    pub received_by: Option<String>, // required unless source is LINE
    pub phone: Option<String>,
    pub location: Option<String>, // "lat,lng"
    pub line_user_id: Option<String>,
    pub image_before: Option<Vec<String>>, // already uploaded urls
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CancelComplaintRequest {
    pub line_user_id: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReopenComplaintRequest {
    pub line_user_id: String,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RejectVerificationRequest {
    pub reason: String,
}

/// Staff report of the work done, with freshly uploaded "after" photos.
#[derive(Debug, Clone, Default)]
pub struct ReportInput {
    pub message: String,
    pub images: Vec<ImageUpload>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReopenLogResponse {
    pub id: i32,
    pub reason: String,
    pub reporter_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<ReopenLogModel> for ReopenLogResponse {
    fn from(model: ReopenLogModel) -> Self {
        Self {
            id: model.id,
            reason: model.reason,
            reporter_name: model.reporter_name,
            created_at: model.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ComplaintResponse {
    pub id: String,
    pub source: Source,
    pub description: String,
    pub reporter_name: Option<String>,
    pub received_by: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub status: ComplaintStatus,
    pub message: Option<String>,
    pub image_before: Vec<String>,
    pub image_after: Vec<String>,
    pub zone_id: Option<i32>,
    pub zone_name: Option<String>,
    pub line_user_id: Option<String>,
    pub notified_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub reopen_logs: Vec<ReopenLogResponse>,
}

fn split_urls(list: Option<String>) -> Vec<String> {
    list.map(|list| {
        list.split(',')
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

impl From<ComplaintDetail> for ComplaintResponse {
    fn from(detail: ComplaintDetail) -> Self {
        let model = detail.complaint;
        Self {
            id: model.id,
            source: model.source,
            description: model.description,
            reporter_name: model.reporter_name,
            received_by: model.received_by,
            phone: model.phone,
            location: model.location,
            status: model.status,
            message: model.message,
            image_before: split_urls(model.image_before),
            image_after: split_urls(model.image_after),
            zone_id: model.zone_id,
            zone_name: model.zone_name,
            line_user_id: model.line_user_id,
            notified_at: model.notified_at,
            created_at: model.created_at,
            updated_at: model.updated_at,
            reopen_logs: detail.reopen_logs.into_iter().map(ReopenLogResponse::from).collect(),
        }
    }
}
