//! In-memory stand-ins for the database, the messaging APIs and the image store.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use sea_orm::DbErr;
use serde_json::Value;
use std::collections::HashMap;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::entity::complaint::{self, ComplaintStatus, Source};
use crate::entity::reopen_log;
use crate::entity::zone::{self, Polygon};
use crate::geo::polygon::close_ring;
use crate::model::complaint::ComplaintDetail;
use crate::notify::{LinePush, NotifyError, TelegramSend};
use crate::repository::{ComplaintChanges, ComplaintRepository, SettingStore, ZoneFields, ZoneRepository};
use crate::util::image_store::{ImageStore, ImageStoreError};

fn fixed_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 1, 9, 0, 0).unwrap()
}

#[derive(Default)]
struct MemoryInner {
    complaints: Vec<complaint::Model>,
    reopen_logs: Vec<reopen_log::Model>,
    zones: Vec<zone::Model>,
    settings: HashMap<String, String>,
    next_log_id: i32,
    next_zone_id: i32,
}

impl MemoryInner {
    fn detail(&self, complaint: complaint::Model) -> ComplaintDetail {
        let reopen_logs = self
            .reopen_logs
            .iter()
            .filter(|log| log.complaint_id == complaint.id)
            .cloned()
            .collect();
        ComplaintDetail { complaint, reopen_logs }
    }

    fn add_zone(&mut self, fields: ZoneFields, now: DateTime<Utc>) -> zone::Model {
        self.next_zone_id += 1;
        let zone = zone::Model {
            id: self.next_zone_id,
            name: fields.name,
            polygon: Polygon(fields.polygon),
            line_group_id: fields.line_group_id,
            telegram_group_id: fields.telegram_group_id,
            created_at: now,
            updated_at: now,
        };
        self.zones.push(zone.clone());
        zone
    }
}

/// Repository and settings backed by vectors, with the same guarded update as the database.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryInner>,
    zone_lookup_fails: AtomicBool,
}

impl MemoryStore {
    pub fn with_setting(self, key: &str, value: &str) -> Self {
        self.inner
            .lock()
            .unwrap()
            .settings
            .insert(key.to_string(), value.to_string());
        self
    }

    pub fn insert_zone(
        &self,
        name: &str,
        ring: Vec<[f64; 2]>,
        line_group_id: Option<&str>,
        telegram_group_id: Option<&str>,
    ) -> zone::Model {
        let fields = ZoneFields {
            name: name.to_string(),
            polygon: close_ring(ring),
            line_group_id: line_group_id.map(str::to_string),
            telegram_group_id: telegram_group_id.map(str::to_string),
        };
        self.inner.lock().unwrap().add_zone(fields, fixed_time())
    }

    pub fn complaint(&self, id: &str) -> Option<complaint::Model> {
        let inner = self.inner.lock().unwrap();
        inner.complaints.iter().find(|c| c.id == id).cloned()
    }

    pub fn complaint_count(&self) -> usize {
        self.inner.lock().unwrap().complaints.len()
    }

    pub fn zone_count(&self) -> usize {
        self.inner.lock().unwrap().zones.len()
    }

    /// Makes `find_zone_by_id` fail like a dropped connection.
    pub fn fail_zone_lookups(&self) {
        self.zone_lookup_fails.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl ComplaintRepository for MemoryStore {
    async fn find_complaint(&self, id: &str) -> Result<Option<ComplaintDetail>, DbErr> {
        let inner = self.inner.lock().unwrap();
        let found = inner.complaints.iter().find(|c| c.id == id).cloned();
        Ok(found.map(|complaint| inner.detail(complaint)))
    }

    async fn create_complaint(&self, complaint: complaint::Model) -> Result<ComplaintDetail, DbErr> {
        let mut inner = self.inner.lock().unwrap();
        inner.complaints.push(complaint.clone());
        Ok(inner.detail(complaint))
    }

    async fn update_complaint(
        &self,
        id: &str,
        expected: &[ComplaintStatus],
        changes: ComplaintChanges,
    ) -> Result<Option<ComplaintDetail>, DbErr> {
        let mut inner = self.inner.lock().unwrap();
        let Some(index) = inner.complaints.iter().position(|c| c.id == id) else {
            return Ok(None);
        };
        if !expected.contains(&inner.complaints[index].status) {
            return Ok(None);
        }

        let complaint = &mut inner.complaints[index];
        if let Some(status) = changes.status {
            complaint.status = status;
        }
        if let Some(message) = changes.message {
            complaint.message = Some(message);
        }
        if let Some(image_after) = changes.image_after {
            complaint.image_after = image_after;
        }
        if let Some(notified_at) = changes.notified_at {
            complaint.notified_at = Some(notified_at);
        }
        if let Some(updated_at) = changes.updated_at {
            complaint.updated_at = updated_at;
        }
        let updated = complaint.clone();

        if let Some(log) = changes.reopen_log {
            inner.next_log_id += 1;
            let id = inner.next_log_id;
            inner.reopen_logs.push(reopen_log::Model {
                id,
                complaint_id: updated.id.clone(),
                reason: log.reason,
                reporter_name: log.reporter_name,
                created_at: log.created_at,
            });
        }

        Ok(Some(inner.detail(updated)))
    }

    async fn delete_complaint(&self, id: &str) -> Result<bool, DbErr> {
        let mut inner = self.inner.lock().unwrap();
        let before = inner.complaints.len();
        inner.complaints.retain(|c| c.id != id);
        inner.reopen_logs.retain(|log| log.complaint_id != id);
        Ok(inner.complaints.len() < before)
    }
}

#[async_trait]
impl ZoneRepository for MemoryStore {
    async fn find_zone_by_id(&self, id: i32) -> Result<Option<zone::Model>, DbErr> {
        if self.zone_lookup_fails.load(Ordering::SeqCst) {
            return Err(DbErr::Custom("zone lookup unavailable".to_string()));
        }
        let inner = self.inner.lock().unwrap();
        Ok(inner.zones.iter().find(|z| z.id == id).cloned())
    }

    async fn find_zone_by_name(&self, name: &str) -> Result<Option<zone::Model>, DbErr> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.zones.iter().find(|z| z.name == name).cloned())
    }

    async fn list_zones(&self) -> Result<Vec<zone::Model>, DbErr> {
        Ok(self.inner.lock().unwrap().zones.clone())
    }

    async fn create_zone(&self, fields: ZoneFields, now: DateTime<Utc>) -> Result<zone::Model, DbErr> {
        Ok(self.inner.lock().unwrap().add_zone(fields, now))
    }

    async fn update_zone(
        &self,
        id: i32,
        fields: ZoneFields,
        now: DateTime<Utc>,
    ) -> Result<Option<zone::Model>, DbErr> {
        let mut inner = self.inner.lock().unwrap();
        let Some(zone) = inner.zones.iter_mut().find(|z| z.id == id) else {
            return Ok(None);
        };
        zone.name = fields.name;
        zone.polygon = Polygon(fields.polygon);
        zone.line_group_id = fields.line_group_id;
        zone.telegram_group_id = fields.telegram_group_id;
        zone.updated_at = now;
        Ok(Some(zone.clone()))
    }

    async fn delete_zone(&self, id: i32) -> Result<bool, DbErr> {
        let mut inner = self.inner.lock().unwrap();
        let before = inner.zones.len();
        inner.zones.retain(|z| z.id != id);
        Ok(inner.zones.len() < before)
    }
}

#[async_trait]
impl SettingStore for MemoryStore {
    async fn get_setting(&self, key: &str) -> Result<Option<String>, DbErr> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .settings
            .get(key)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty()))
    }
}

fn rejected() -> NotifyError {
    NotifyError::Rejected {
        status: 500,
        body: "upstream unavailable".to_string(),
    }
}

/// Records every LINE push as `(token, to, messages)`.
#[derive(Default)]
pub struct RecordingLine {
    fail: bool,
    sent: Mutex<Vec<(String, String, Vec<Value>)>>,
}

impl RecordingLine {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn recipients(&self) -> Vec<String> {
        self.sent.lock().unwrap().iter().map(|(_, to, _)| to.clone()).collect()
    }

    pub fn tokens(&self) -> Vec<String> {
        self.sent.lock().unwrap().iter().map(|(token, _, _)| token.clone()).collect()
    }

    pub fn alt_texts(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter_map(|(_, _, messages)| messages.first())
            .filter_map(|message| message["altText"].as_str().map(str::to_string))
            .collect()
    }
}

#[async_trait]
impl LinePush for RecordingLine {
    async fn push(&self, token: &str, to: &str, messages: Vec<Value>) -> Result<(), NotifyError> {
        self.sent
            .lock()
            .unwrap()
            .push((token.to_string(), to.to_string(), messages));
        if self.fail { Err(rejected()) } else { Ok(()) }
    }
}

/// Records every Telegram message as `(token, chat_id, text)`.
#[derive(Default)]
pub struct RecordingTelegram {
    fail: bool,
    sent: Mutex<Vec<(String, String, String)>>,
}

impl RecordingTelegram {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn recipients(&self) -> Vec<String> {
        self.sent.lock().unwrap().iter().map(|(_, chat, _)| chat.clone()).collect()
    }

    pub fn texts(&self) -> Vec<String> {
        self.sent.lock().unwrap().iter().map(|(_, _, text)| text.clone()).collect()
    }
}

#[async_trait]
impl TelegramSend for RecordingTelegram {
    async fn send_message(
        &self,
        token: &str,
        chat_id: &str,
        text: &str,
        _reply_markup: Value,
    ) -> Result<(), NotifyError> {
        self.sent
            .lock()
            .unwrap()
            .push((token.to_string(), chat_id.to_string(), text.to_string()));
        if self.fail { Err(rejected()) } else { Ok(()) }
    }
}

/// Image store that hands out fake urls and can be told to fail.
#[derive(Default)]
pub struct FakeImages {
    uploaded: Mutex<Vec<String>>,
    deleted: Mutex<Vec<String>>,
    upload_limit: Mutex<Option<usize>>,
    fail_deletes: AtomicBool,
}

impl FakeImages {
    /// Uploads beyond the first `count` fail.
    pub fn fail_upload_after(&self, count: usize) {
        *self.upload_limit.lock().unwrap() = Some(count);
    }

    pub fn fail_deletes(&self) {
        self.fail_deletes.store(true, Ordering::SeqCst);
    }

    pub fn uploaded(&self) -> Vec<String> {
        self.uploaded.lock().unwrap().clone()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageStore for FakeImages {
    async fn upload_image(&self, _bytes: &[u8], filename: &str) -> Result<String, ImageStoreError> {
        let mut uploaded = self.uploaded.lock().unwrap();
        if let Some(limit) = *self.upload_limit.lock().unwrap() {
            if uploaded.len() >= limit {
                return Err(io::Error::other("disk full").into());
            }
        }
        let url = format!("https://img.test/{}-{}", uploaded.len(), filename);
        uploaded.push(url.clone());
        Ok(url)
    }

    async fn delete_image(&self, url: &str) -> Result<(), ImageStoreError> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(io::Error::other("permission denied").into());
        }
        self.deleted.lock().unwrap().push(url.to_string());
        Ok(())
    }
}

pub fn sample_complaint() -> ComplaintDetail {
    ComplaintDetail {
        complaint: complaint::Model {
            id: "6f1c2e9a-0b1d-4c3e-9f7a-a1b2c3d4e5ff".to_string(),
            source: Source::Line,
            description: "ถนนชำรุด".to_string(),
            reporter_name: Some("สมชาย".to_string()),
            received_by: None,
            phone: Some("081-234-5678".to_string()),
            location: Some("13.75,100.50".to_string()),
            status: ComplaintStatus::Pending,
            message: None,
            image_before: None,
            image_after: None,
            zone_id: Some(1),
            zone_name: Some("โซนเอ".to_string()),
            line_user_id: Some("U1".to_string()),
            notified_at: None,
            created_at: fixed_time(),
            updated_at: fixed_time(),
        },
        reopen_logs: Vec::new(),
    }
}

pub fn sample_reopen_log(id: i32, complaint_id: &str, reason: &str) -> reopen_log::Model {
    reopen_log::Model {
        id,
        complaint_id: complaint_id.to_string(),
        reason: reason.to_string(),
        reporter_name: Some("สมชาย".to_string()),
        created_at: fixed_time(),
    }
}
