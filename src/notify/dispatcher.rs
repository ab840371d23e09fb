use futures_util::future::join;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

use super::flex::build_flex_message;
use super::telegram_html::build_telegram_message;
use super::{
    Channel, ChannelOutcome, DeliveryStatus, DispatchReport, LinePush, NotificationEvent, NotifyError,
    SkipReason, TelegramSend,
};
use crate::entity::complaint::Source;
use crate::repository::{SettingStore, LINE_ACCESS_TOKEN, TELEGRAM_BOT_TOKEN};

/// Sends one event to every applicable channel. Never fails: each send is
/// isolated and its result recorded in the returned report.
#[derive(Clone)]
pub struct Dispatcher {
    settings: Arc<dyn SettingStore>,
    line: Arc<dyn LinePush>,
    telegram: Arc<dyn TelegramSend>,
}

fn outcome(channel: Channel, recipient: Option<&str>, status: DeliveryStatus) -> ChannelOutcome {
    ChannelOutcome {
        channel,
        recipient: recipient.map(str::to_string),
        status,
    }
}

fn delivered(
    complaint_id: &str,
    channel: Channel,
    recipient: &str,
    result: Result<(), NotifyError>,
) -> ChannelOutcome {
    match result {
        Ok(()) => {
            info!(complaint_id, %channel, recipient, "notification sent");
            outcome(channel, Some(recipient), DeliveryStatus::Sent)
        }
        Err(err) => {
            error!(complaint_id, %channel, recipient, error = %err, "notification failed");
            outcome(channel, Some(recipient), DeliveryStatus::Failed(err.to_string()))
        }
    }
}

impl Dispatcher {
    pub fn new(
        settings: Arc<dyn SettingStore>,
        line: Arc<dyn LinePush>,
        telegram: Arc<dyn TelegramSend>,
    ) -> Self {
        Self { settings, line, telegram }
    }

    async fn token(&self, key: &str, complaint_id: &str) -> Option<String> {
        match self.settings.get_setting(key).await {
            Ok(token) => token,
            Err(err) => {
                error!(complaint_id, key, error = %err, "could not read channel token");
                None
            }
        }
    }

    #[instrument(skip_all, fields(complaint_id = %event.detail.complaint.id, kind = ?event.kind))]
    pub async fn dispatch(&self, event: &NotificationEvent) -> DispatchReport {
        let (line, telegram) = join(self.dispatch_line(event), self.dispatch_telegram(event)).await;

        let mut report = DispatchReport::default();
        report.outcomes.extend(line);
        report.outcomes.extend(telegram);
        report
    }

    async fn dispatch_line(&self, event: &NotificationEvent) -> Vec<ChannelOutcome> {
        let complaint = &event.detail.complaint;
        let user = complaint
            .line_user_id
            .as_deref()
            .filter(|_| complaint.source == Source::Line && event.kind.addresses_reporter());

        let group = event.targets.line.as_ref().map(|target| target.group_id.as_str());
        let mut outcomes = Vec::new();

        let Some(token) = self.token(LINE_ACCESS_TOKEN, &complaint.id).await else {
            warn!(complaint_id = %complaint.id, "LINE token missing, skipping LINE");
            for recipient in [group, user].into_iter().flatten() {
                outcomes.push(outcome(
                    Channel::Line,
                    Some(recipient),
                    DeliveryStatus::Skipped(SkipReason::MissingToken),
                ));
            }
            return outcomes;
        };

        let message = build_flex_message(&event.detail, event.kind);

        match group {
            Some(group_id) => {
                let result = self.line.push(&token, group_id, vec![message.clone()]).await;
                outcomes.push(delivered(&complaint.id, Channel::Line, group_id, result));
            }
            None => {
                warn!(complaint_id = %complaint.id, "no LINE group for zone");
                outcomes.push(outcome(Channel::Line, None, DeliveryStatus::Skipped(SkipReason::NoTarget)));
            }
        }

        if let Some(user_id) = user {
            let result = self.line.push(&token, user_id, vec![message]).await;
            outcomes.push(delivered(&complaint.id, Channel::Line, user_id, result));
        }

        outcomes
    }

    async fn dispatch_telegram(&self, event: &NotificationEvent) -> Vec<ChannelOutcome> {
        let complaint = &event.detail.complaint;

        let Some(target) = event.targets.telegram.as_ref() else {
            warn!(complaint_id = %complaint.id, "no Telegram group for zone");
            return vec![outcome(Channel::Telegram, None, DeliveryStatus::Skipped(SkipReason::NoTarget))];
        };

        let Some(token) = self.token(TELEGRAM_BOT_TOKEN, &complaint.id).await else {
            warn!(complaint_id = %complaint.id, "Telegram token missing, skipping Telegram");
            return vec![outcome(
                Channel::Telegram,
                Some(&target.group_id),
                DeliveryStatus::Skipped(SkipReason::MissingToken),
            )];
        };

        let message = build_telegram_message(&event.detail, event.kind);
        let result = self
            .telegram
            .send_message(&token, &target.group_id, &message.text, message.reply_markup)
            .await;

        vec![delivered(&complaint.id, Channel::Telegram, &target.group_id, result)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::complaint::Source;
    use crate::geo::{GroupTarget, ZoneTargets};
    use crate::notify::NotifyKind;
    use crate::testing::{sample_complaint, MemoryStore, RecordingLine, RecordingTelegram};

    fn targets() -> ZoneTargets {
        ZoneTargets {
            line: Some(GroupTarget {
                channel: Channel::Line,
                zone_id: 1,
                zone_name: "A".to_string(),
                group_id: "L-A".to_string(),
            }),
            telegram: Some(GroupTarget {
                channel: Channel::Telegram,
                zone_id: 1,
                zone_name: "A".to_string(),
                group_id: "T-A".to_string(),
            }),
        }
    }

    fn event(kind: NotifyKind) -> NotificationEvent {
        NotificationEvent {
            detail: sample_complaint(),
            kind,
            targets: targets(),
        }
    }

    fn store_with_tokens() -> Arc<MemoryStore> {
        Arc::new(
            MemoryStore::default()
                .with_setting(LINE_ACCESS_TOKEN, "line-token")
                .with_setting(TELEGRAM_BOT_TOKEN, "tg-token"),
        )
    }

    #[tokio::test]
    async fn sends_to_group_user_and_telegram() {
        let line = Arc::new(RecordingLine::default());
        let telegram = Arc::new(RecordingTelegram::default());
        let dispatcher = Dispatcher::new(store_with_tokens(), line.clone(), telegram.clone());

        let report = dispatcher.dispatch(&event(NotifyKind::New)).await;

        assert!(report.all_sent());
        assert_eq!(line.recipients(), vec!["L-A".to_string(), "U1".to_string()]);
        assert_eq!(telegram.recipients(), vec!["T-A".to_string()]);
        assert_eq!(line.tokens(), vec!["line-token".to_string(), "line-token".to_string()]);
    }

    #[tokio::test]
    async fn telegram_failure_does_not_block_line() {
        let line = Arc::new(RecordingLine::default());
        let telegram = Arc::new(RecordingTelegram::failing());
        let dispatcher = Dispatcher::new(store_with_tokens(), line.clone(), telegram.clone());

        let report = dispatcher.dispatch(&event(NotifyKind::Done)).await;

        assert_eq!(line.recipients().len(), 2);
        assert!(report.for_channel(Channel::Line).all(|o| o.status == DeliveryStatus::Sent));
        let failures: Vec<_> = report.failures().collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].channel, Channel::Telegram);
    }

    #[tokio::test]
    async fn line_failure_does_not_block_telegram() {
        let line = Arc::new(RecordingLine::failing());
        let telegram = Arc::new(RecordingTelegram::default());
        let dispatcher = Dispatcher::new(store_with_tokens(), line.clone(), telegram.clone());

        let report = dispatcher.dispatch(&event(NotifyKind::Cancelled)).await;

        // the user push is still attempted after the group push failed
        assert_eq!(report.for_channel(Channel::Line).count(), 2);
        assert_eq!(report.failures().count(), 2);
        assert_eq!(telegram.recipients(), vec!["T-A".to_string()]);
    }

    #[tokio::test]
    async fn missing_tokens_are_skipped() {
        let line = Arc::new(RecordingLine::default());
        let telegram = Arc::new(RecordingTelegram::default());
        let dispatcher = Dispatcher::new(Arc::new(MemoryStore::default()), line.clone(), telegram.clone());

        let report = dispatcher.dispatch(&event(NotifyKind::New)).await;

        assert!(line.recipients().is_empty());
        assert!(telegram.recipients().is_empty());
        assert!(report
            .outcomes
            .iter()
            .all(|o| o.status == DeliveryStatus::Skipped(SkipReason::MissingToken)));
        assert_eq!(report.outcomes.len(), 3);
    }

    #[tokio::test]
    async fn non_line_sources_and_reminders_skip_the_user_push() {
        let line = Arc::new(RecordingLine::default());
        let telegram = Arc::new(RecordingTelegram::default());
        let dispatcher = Dispatcher::new(store_with_tokens(), line.clone(), telegram.clone());

        let mut phone = event(NotifyKind::Done);
        phone.detail.complaint.source = Source::Phone;
        dispatcher.dispatch(&phone).await;
        assert_eq!(line.recipients(), vec!["L-A".to_string()]);

        dispatcher.dispatch(&event(NotifyKind::Overdue { days: 3 })).await;
        assert_eq!(line.recipients(), vec!["L-A".to_string(), "L-A".to_string()]);
    }

    #[tokio::test]
    async fn missing_group_targets_are_reported() {
        let line = Arc::new(RecordingLine::default());
        let telegram = Arc::new(RecordingTelegram::default());
        let dispatcher = Dispatcher::new(store_with_tokens(), line.clone(), telegram.clone());

        let mut no_groups = event(NotifyKind::New);
        no_groups.targets = ZoneTargets::default();
        let report = dispatcher.dispatch(&no_groups).await;

        // the reporter still hears back even without a group
        assert_eq!(line.recipients(), vec!["U1".to_string()]);
        assert_eq!(
            report.for_channel(Channel::Telegram).next().map(|o| o.status.clone()),
            Some(DeliveryStatus::Skipped(SkipReason::NoTarget))
        );
    }
}
