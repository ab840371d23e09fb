pub mod dispatcher;
pub mod flex;
pub mod format;
pub mod telegram_html;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use thiserror::Error;

use crate::geo::ZoneTargets;
use crate::model::complaint::ComplaintDetail;

pub use dispatcher::Dispatcher;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Line,
    Telegram,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::Line => write!(f, "line"),
            Channel::Telegram => write!(f, "telegram"),
        }
    }
}

/// What happened to the complaint, as announced to the groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyKind {
    New,
    Cancelled,
    ReopenRequested,
    Done,
    Overdue { days: i64 },
}

impl NotifyKind {
    pub fn label(&self) -> String {
        match self {
            NotifyKind::New => "ใหม่".to_string(),
            NotifyKind::Cancelled => "ยกเลิก".to_string(),
            NotifyKind::ReopenRequested => "ขอแก้ไข".to_string(),
            NotifyKind::Done => "เสร็จสิ้น".to_string(),
            NotifyKind::Overdue { days } => format!("ค้าง {} วัน", days),
        }
    }

    /// Reminders are for staff groups only.
    pub fn addresses_reporter(&self) -> bool {
        !matches!(self, NotifyKind::Overdue { .. })
    }
}

/// Phase-two input: a committed transition waiting to be announced.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationEvent {
    pub detail: ComplaintDetail,
    pub kind: NotifyKind,
    pub targets: ZoneTargets,
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("api rejected message with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

#[async_trait]
pub trait LinePush: Send + Sync {
    async fn push(&self, token: &str, to: &str, messages: Vec<Value>) -> Result<(), NotifyError>;
}

#[async_trait]
pub trait TelegramSend: Send + Sync {
    async fn send_message(
        &self,
        token: &str,
        chat_id: &str,
        text: &str,
        reply_markup: Value,
    ) -> Result<(), NotifyError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SkipReason {
    MissingToken,
    NoTarget,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DeliveryStatus {
    Sent,
    Skipped(SkipReason),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelOutcome {
    pub channel: Channel,
    pub recipient: Option<String>,
    pub status: DeliveryStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
    pub outcomes: Vec<ChannelOutcome>,
}

impl DispatchReport {
    pub fn for_channel(&self, channel: Channel) -> impl Iterator<Item = &ChannelOutcome> {
        self.outcomes.iter().filter(move |outcome| outcome.channel == channel)
    }

    pub fn failures(&self) -> impl Iterator<Item = &ChannelOutcome> {
        self.outcomes
            .iter()
            .filter(|outcome| matches!(outcome.status, DeliveryStatus::Failed(_)))
    }

    pub fn all_sent(&self) -> bool {
        self.outcomes.iter().all(|outcome| outcome.status == DeliveryStatus::Sent)
    }
}
