use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::transition::{allowed_sources, transition, Action};
use super::validate::{merge_image_urls, validate_images, validate_intake};
use crate::entity::complaint::{self, ComplaintStatus, Source};
use crate::geo::{LatLng, ZoneResolver, ZoneTargets};
use crate::model::complaint::{ComplaintDetail, CreateComplaintRequest, ReportInput};
use crate::model::global_error::{AppError, ErrorCode, ValidationFieldError};
use crate::notify::{Dispatcher, NotificationEvent, NotifyKind};
use crate::repository::{ComplaintChanges, ComplaintRepository, NewReopenLog, SettingStore, LINE_ACCESS_TOKEN};
use crate::util::image_store::{ImageStore, ImageStoreError};

pub const REOPEN_WINDOW_DAYS: i64 = 3;
pub const REMINDER_INTERVAL_DAYS: i64 = 1;
const DEFAULT_REOPEN_REASON: &str = "-";

/// Result of a committed transition, before any message goes out.
#[derive(Debug, Clone)]
pub struct Transition {
    pub detail: ComplaintDetail,
    pub notification: Option<NotificationEvent>,
}

impl Transition {
    fn silent(detail: ComplaintDetail) -> Self {
        Self {
            detail,
            notification: None,
        }
    }

    fn announced(detail: ComplaintDetail, kind: NotifyKind, targets: ZoneTargets) -> Self {
        Self {
            notification: Some(NotificationEvent {
                detail: detail.clone(),
                kind,
                targets,
            }),
            detail,
        }
    }
}

/// Complaint lifecycle: guards and persistence in `apply_*`, messaging in `notify`.
/// The unprefixed operations run both.
#[derive(Clone)]
pub struct ComplaintEngine {
    complaints: Arc<dyn ComplaintRepository>,
    resolver: ZoneResolver,
    settings: Arc<dyn SettingStore>,
    images: Arc<dyn ImageStore>,
    dispatcher: Dispatcher,
}

fn ensure_line_owner(complaint: &complaint::Model, line_user_id: &str) -> Result<(), AppError> {
    if complaint.source != Source::Line {
        return Err(AppError::new(ErrorCode::SourceNotLine));
    }
    match complaint.line_user_id.as_deref() {
        Some(owner) if owner == line_user_id.trim() => Ok(()),
        _ => Err(AppError::new(ErrorCode::NotComplaintOwner)),
    }
}

fn require_line_target(targets: &ZoneTargets, location: &str) -> Result<(), AppError> {
    if targets.line.is_none() {
        return Err(AppError::with_detail(
            ErrorCode::ZoneNotConfigured,
            format!("no LINE group configured for {}", location),
        ));
    }
    Ok(())
}

impl ComplaintEngine {
    pub fn new(
        complaints: Arc<dyn ComplaintRepository>,
        resolver: ZoneResolver,
        settings: Arc<dyn SettingStore>,
        images: Arc<dyn ImageStore>,
        dispatcher: Dispatcher,
    ) -> Self {
        Self {
            complaints,
            resolver,
            settings,
            images,
            dispatcher,
        }
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub async fn find_complaint(&self, id: &str) -> Result<ComplaintDetail, AppError> {
        self.complaints
            .find_complaint(id)
            .await?
            .ok_or_else(|| AppError::new(ErrorCode::ComplaintNotFound))
    }

    async fn commit(&self, id: &str, action: Action, changes: ComplaintChanges) -> Result<ComplaintDetail, AppError> {
        let expected = allowed_sources(action);
        self.complaints
            .update_complaint(id, &expected, changes)
            .await?
            .ok_or_else(|| {
                AppError::with_detail(
                    ErrorCode::StaleComplaintState,
                    format!("complaint changed before {} could be applied", action),
                )
            })
    }

    /// Sends the transition's messages. Delivery problems are logged, never returned.
    pub async fn notify(&self, transition: Transition) -> ComplaintDetail {
        if let Some(event) = &transition.notification {
            let report = self.dispatcher.dispatch(event).await;
            let failed = report.failures().count();
            if failed > 0 {
                warn!(complaint_id = %transition.detail.complaint.id, failed, "notifications not delivered");
            }
        }
        transition.detail
    }

    #[instrument(skip(self, request), fields(source = ?request.source))]
    pub async fn apply_create(
        &self,
        request: CreateComplaintRequest,
        now: DateTime<Utc>,
    ) -> Result<Transition, AppError> {
        let intake = validate_intake(&request)?;

        let zone = self.resolver.locate(intake.point).await?;
        let targets = self.resolver.targets_for(zone.as_ref()).await?;
        require_line_target(&targets, &intake.location)?;

        if self.settings.get_setting(LINE_ACCESS_TOKEN).await?.is_none() {
            return Err(AppError::new(ErrorCode::LineTokenMissing));
        }

        let complaint = complaint::Model {
            id: Uuid::new_v4().to_string(),
            source: intake.source,
            description: intake.description,
            reporter_name: intake.reporter_name,
            received_by: intake.received_by,
            phone: intake.phone,
            location: Some(intake.location),
            status: ComplaintStatus::Pending,
            message: None,
            image_before: intake.image_before,
            image_after: None,
            zone_id: zone.as_ref().map(|z| z.id),
            zone_name: zone.as_ref().map(|z| z.name.clone()),
            line_user_id: intake.line_user_id,
            notified_at: None,
            created_at: now,
            updated_at: now,
        };

        let detail = self.complaints.create_complaint(complaint).await?;
        info!(
            complaint_id = %detail.complaint.id,
            zone_id = ?detail.complaint.zone_id,
            "complaint created"
        );

        Ok(Transition::announced(detail, NotifyKind::New, targets))
    }

    #[instrument(skip(self))]
    pub async fn apply_cancel(
        &self,
        id: &str,
        line_user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Transition, AppError> {
        let current = self.find_complaint(id).await?.complaint;
        let next = transition(current.status, Action::Cancel)?;
        ensure_line_owner(&current, line_user_id)?;

        let location = current.location.as_deref().unwrap_or_default();
        let point = LatLng::parse(location).ok_or_else(|| AppError::new(ErrorCode::InvalidLocation))?;
        let zone = self.resolver.locate(point).await?;
        let targets = self.resolver.targets_for(zone.as_ref()).await?;
        require_line_target(&targets, location)?;

        let changes = ComplaintChanges {
            status: Some(next),
            updated_at: Some(now),
            ..Default::default()
        };
        let detail = self.commit(id, Action::Cancel, changes).await?;
        info!(complaint_id = %id, "complaint cancelled by reporter");

        Ok(Transition::announced(detail, NotifyKind::Cancelled, targets))
    }

    #[instrument(skip(self))]
    pub async fn apply_reopen(
        &self,
        id: &str,
        line_user_id: &str,
        reason: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Transition, AppError> {
        let current = self.find_complaint(id).await?.complaint;
        let next = transition(current.status, Action::Reopen)?;
        ensure_line_owner(&current, line_user_id)?;

        // updated_at of a DONE complaint is its close date
        if now - current.updated_at >= Duration::days(REOPEN_WINDOW_DAYS) {
            return Err(AppError::with_detail(
                ErrorCode::ReopenWindowExpired,
                format!("closed at {}", current.updated_at.to_rfc3339()),
            ));
        }

        let reason = reason
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .unwrap_or(DEFAULT_REOPEN_REASON);

        self.reopen(current, next, reason, now).await
    }

    /// Staff decline to verify the work and send it back with a reason.
    #[instrument(skip(self))]
    pub async fn apply_reject_verification(
        &self,
        id: &str,
        reason: &str,
        now: DateTime<Utc>,
    ) -> Result<Transition, AppError> {
        let current = self.find_complaint(id).await?.complaint;
        let next = transition(current.status, Action::Reopen)?;

        let reason = reason.trim();
        if reason.is_empty() {
            return Err(AppError::ValidationError(vec![ValidationFieldError::new(
                "reason",
                "กรุณาระบุเหตุผล",
            )]));
        }

        self.reopen(current, next, reason, now).await
    }

    async fn reopen(
        &self,
        current: complaint::Model,
        next: ComplaintStatus,
        reason: &str,
        now: DateTime<Utc>,
    ) -> Result<Transition, AppError> {
        let targets = self.resolver.targets_for_zone_id(current.zone_id).await?;

        let changes = ComplaintChanges {
            status: Some(next),
            updated_at: Some(now),
            reopen_log: Some(NewReopenLog {
                reason: reason.to_string(),
                reporter_name: current.reporter_name.clone(),
                created_at: now,
            }),
            ..Default::default()
        };
        let detail = self.commit(&current.id, Action::Reopen, changes).await?;
        info!(complaint_id = %current.id, "complaint reopened");

        Ok(Transition::announced(detail, NotifyKind::ReopenRequested, targets))
    }

    #[instrument(skip(self, input), fields(images = input.images.len()))]
    pub async fn apply_report(
        &self,
        id: &str,
        input: ReportInput,
        now: DateTime<Utc>,
    ) -> Result<Transition, AppError> {
        let current = self.find_complaint(id).await?.complaint;
        let next = transition(current.status, Action::Report)?;

        let message = input.message.trim().to_string();
        if message.is_empty() {
            return Err(AppError::new(ErrorCode::EmptyResolutionMessage));
        }
        validate_images(&input.images)?;
        // resolved up front so nothing can fail once the write lands
        let targets = self.resolver.targets_for_zone_id(current.zone_id).await?;

        let mut uploaded = Vec::with_capacity(input.images.len());
        for image in &input.images {
            match self.images.upload_image(&image.bytes, &image.filename).await {
                Ok(url) => uploaded.push(url),
                Err(err) => {
                    self.discard_uploads(&uploaded).await;
                    return Err(err.into());
                }
            }
        }

        let changes = ComplaintChanges {
            status: Some(next),
            message: Some(message),
            image_after: Some(merge_image_urls(current.image_after.as_deref(), &uploaded)),
            updated_at: Some(now),
            ..Default::default()
        };
        let detail = match self.commit(id, Action::Report, changes).await {
            Ok(detail) => detail,
            Err(err) => {
                self.discard_uploads(&uploaded).await;
                return Err(err);
            }
        };
        info!(complaint_id = %id, uploaded = uploaded.len(), "complaint result reported");

        Ok(Transition::announced(detail, NotifyKind::Done, targets))
    }

    async fn discard_uploads(&self, urls: &[String]) {
        for url in urls {
            if let Err(err) = self.images.delete_image(url).await {
                warn!(url = %url, error = %err, "could not remove orphaned upload");
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn apply_verify(&self, id: &str, now: DateTime<Utc>) -> Result<Transition, AppError> {
        let current = self.find_complaint(id).await?.complaint;
        let next = transition(current.status, Action::Verify)?;

        let changes = ComplaintChanges {
            status: Some(next),
            updated_at: Some(now),
            ..Default::default()
        };
        let detail = self.commit(id, Action::Verify, changes).await?;
        info!(complaint_id = %id, "complaint verified");

        Ok(Transition::silent(detail))
    }

    #[instrument(skip(self))]
    pub async fn apply_reject(&self, id: &str, now: DateTime<Utc>) -> Result<Transition, AppError> {
        let current = self.find_complaint(id).await?.complaint;
        let next = transition(current.status, Action::Reject)?;

        let changes = ComplaintChanges {
            status: Some(next),
            updated_at: Some(now),
            ..Default::default()
        };
        let detail = self.commit(id, Action::Reject, changes).await?;
        info!(complaint_id = %id, "complaint rejected");

        Ok(Transition::silent(detail))
    }

    #[instrument(skip(self))]
    pub async fn apply_remind(&self, id: &str, now: DateTime<Utc>) -> Result<Transition, AppError> {
        let current = self.find_complaint(id).await?.complaint;
        transition(current.status, Action::Remind)?;

        if let Some(last) = current.notified_at {
            if now - last < Duration::days(REMINDER_INTERVAL_DAYS) {
                return Err(AppError::with_detail(
                    ErrorCode::ReminderTooSoon,
                    format!("last reminder at {}", last.to_rfc3339()),
                ));
            }
        }

        let days = (now - current.created_at).num_days().max(0);
        let targets = self.resolver.targets_for_zone_id(current.zone_id).await?;
        let changes = ComplaintChanges {
            notified_at: Some(now),
            ..Default::default()
        };
        let detail = self.commit(id, Action::Remind, changes).await?;
        info!(complaint_id = %id, days, "overdue reminder issued");

        Ok(Transition::announced(detail, NotifyKind::Overdue { days }, targets))
    }

    /// Removes the complaint's images first; the row stays if any stored image fails to delete.
    /// Urls the store does not own (LINE content links) are skipped.
    #[instrument(skip(self))]
    pub async fn delete_complaint(&self, id: &str) -> Result<(), AppError> {
        let current = self.find_complaint(id).await?.complaint;

        for url in current.image_urls() {
            match self.images.delete_image(&url).await {
                Ok(()) => {}
                Err(ImageStoreError::ForeignUrl(url)) => {
                    warn!(complaint_id = %id, url = %url, "image not held by this store, left in place");
                }
                Err(err) => return Err(err.into()),
            }
        }

        if !self.complaints.delete_complaint(id).await? {
            return Err(AppError::new(ErrorCode::ComplaintNotFound));
        }
        info!(complaint_id = %id, "complaint deleted");
        Ok(())
    }

    pub async fn create_complaint(
        &self,
        request: CreateComplaintRequest,
        now: DateTime<Utc>,
    ) -> Result<ComplaintDetail, AppError> {
        let transition = self.apply_create(request, now).await?;
        Ok(self.notify(transition).await)
    }

    pub async fn cancel_complaint(
        &self,
        id: &str,
        line_user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<ComplaintDetail, AppError> {
        let transition = self.apply_cancel(id, line_user_id, now).await?;
        Ok(self.notify(transition).await)
    }

    pub async fn reopen_complaint(
        &self,
        id: &str,
        line_user_id: &str,
        reason: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<ComplaintDetail, AppError> {
        let transition = self.apply_reopen(id, line_user_id, reason, now).await?;
        Ok(self.notify(transition).await)
    }

    pub async fn reject_verification(
        &self,
        id: &str,
        reason: &str,
        now: DateTime<Utc>,
    ) -> Result<ComplaintDetail, AppError> {
        let transition = self.apply_reject_verification(id, reason, now).await?;
        Ok(self.notify(transition).await)
    }

    pub async fn report_result(
        &self,
        id: &str,
        input: ReportInput,
        now: DateTime<Utc>,
    ) -> Result<ComplaintDetail, AppError> {
        let transition = self.apply_report(id, input, now).await?;
        Ok(self.notify(transition).await)
    }

    pub async fn verify_complaint(&self, id: &str, now: DateTime<Utc>) -> Result<ComplaintDetail, AppError> {
        let transition = self.apply_verify(id, now).await?;
        Ok(self.notify(transition).await)
    }

    pub async fn reject_complaint(&self, id: &str, now: DateTime<Utc>) -> Result<ComplaintDetail, AppError> {
        let transition = self.apply_reject(id, now).await?;
        Ok(self.notify(transition).await)
    }

    pub async fn remind_complaint(&self, id: &str, now: DateTime<Utc>) -> Result<ComplaintDetail, AppError> {
        let transition = self.apply_remind(id, now).await?;
        Ok(self.notify(transition).await)
    }
}
