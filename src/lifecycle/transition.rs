use sea_orm::Iterable;
use std::fmt;

use crate::entity::complaint::ComplaintStatus;
use crate::model::global_error::{AppError, ErrorCode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Cancel,
    Reopen,
    Report,
    Verify,
    Reject,
    Remind,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Action::Cancel => "cancel",
            Action::Reopen => "reopen",
            Action::Report => "report",
            Action::Verify => "verify",
            Action::Reject => "reject",
            Action::Remind => "remind",
        };
        f.write_str(name)
    }
}

impl ComplaintStatus {
    /// The single source of truth for which actions each status accepts.
    pub fn next(self, action: Action) -> Option<ComplaintStatus> {
        use Action::*;
        use ComplaintStatus::*;

        match (self, action) {
            (Pending, Cancel) => Some(Cancelled),
            (Done, Reopen) => Some(Reopened),
            (Pending | Reopened, Report) => Some(Done),
            (Done, Verify) => Some(Verified),
            (Done, Reject) => Some(Rejected),
            (Pending | Reopened, Remind) => Some(self),
            _ => None,
        }
    }
}

pub fn transition(current: ComplaintStatus, action: Action) -> Result<ComplaintStatus, AppError> {
    current.next(action).ok_or_else(|| {
        AppError::with_detail(
            ErrorCode::InvalidStatusTransition,
            format!("cannot {} a complaint in status {:?}", action, current),
        )
    })
}

/// Statuses an action may start from; used to re-check inside the write.
pub fn allowed_sources(action: Action) -> Vec<ComplaintStatus> {
    ComplaintStatus::iter()
        .filter(|status| status.next(action).is_some())
        .collect()
}
