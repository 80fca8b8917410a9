//! Notification policy: what, if anything, the current viewer should see
//! for a server event.
//!
//! The decision is a pure function of `(event, viewer)`. De-duplication is
//! delegated to the sink via `dedupe_key`: a repeated delivery of the same
//! event (reconnect redelivery, for instance) carries the same key, and the
//! latest banner replaces the earlier one instead of stacking.

use std::time::Duration;

use crate::credentials::Viewer;
use crate::types::{EventKind, NotificationEvent, Role};

/// Severity/visual category of a transient notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Info,
    Success,
    Warning,
}

/// A transient banner for the host UI to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    /// Banners sharing a key replace each other rather than stacking.
    pub dedupe_key: String,
    pub duration: Duration,
}

impl Notification {
    fn info(title: &str, body: impl Into<String>, key: String, secs: u64) -> Self {
        Self {
            kind: NotificationKind::Info,
            title: title.into(),
            body: body.into(),
            dedupe_key: key,
            duration: Duration::from_secs(secs),
        }
    }

    fn success(title: &str, body: impl Into<String>, key: String, secs: u64) -> Self {
        Self {
            kind: NotificationKind::Success,
            title: title.into(),
            body: body.into(),
            dedupe_key: key,
            duration: Duration::from_secs(secs),
        }
    }
}

/// Display sink implemented by the host UI.
pub trait NotificationSink: Send + Sync {
    /// Best-effort: failures must stay inside the implementation.
    fn show(&self, notification: Notification);
}

/// Decide whether `viewer` should see a banner for `event`, and which one.
///
/// Returns `None` for events the viewer has no stake in, for
/// `consultation_deleted` (cache-only), and for unknown event kinds.
pub fn notification_for(event: &NotificationEvent, viewer: &Viewer) -> Option<Notification> {
    let id = &event.consultation_id;
    let patient_match = viewer.is_user(&event.patient_id);
    let expert_match = event
        .expert_id
        .as_deref()
        .is_some_and(|expert| !expert.is_empty() && viewer.is_user(expert));
    let mine = patient_match || expert_match;
    let reviewer = matches!(viewer.role, Some(Role::Expert | Role::Admin));

    match event.event_type {
        EventKind::ConsultationCreated if reviewer => Some(Notification::info(
            "New consultation available",
            "A new imaging study has been submitted and is ready for review.",
            format!("new-consultation-{id}"),
            6,
        )),
        EventKind::ConsultationCreated => None,

        EventKind::ConsultationAssigned => match viewer.role {
            Some(Role::Patient) if mine => Some(Notification::success(
                "Expert assigned",
                "An expert has been assigned to review your imaging study.",
                format!("assigned-patient-{id}"),
                6,
            )),
            Some(Role::Expert | Role::Admin) if expert_match => Some(Notification::success(
                "Consultation assigned to you",
                "You have successfully been assigned to this consultation.",
                format!("assigned-expert-{id}"),
                6,
            )),
            Some(Role::Expert | Role::Admin) if !mine => Some(Notification::info(
                "Consultation assigned",
                "A consultation has been assigned to another expert.",
                format!("assigned-other-{id}"),
                4,
            )),
            _ => None,
        },

        EventKind::ConsultationCompleted => match viewer.role {
            Some(Role::Patient) if mine => Some(Notification::success(
                "Report ready!",
                "Your consultation review is complete. You can now view your diagnostic report.",
                format!("completed-patient-{id}"),
                8,
            )),
            Some(Role::Expert | Role::Admin) if expert_match => Some(Notification::success(
                "Report submitted",
                "Your consultation report has been successfully submitted.",
                format!("completed-expert-{id}"),
                6,
            )),
            Some(Role::Expert | Role::Admin) => Some(Notification::info(
                "Consultation completed",
                "A consultation review has been completed.",
                format!("completed-other-{id}"),
                4,
            )),
            _ => None,
        },

        EventKind::ConsultationStatusChanged if mine => Some(Notification::info(
            "Status updated",
            status_change_body(event.old_status.as_deref(), event.new_status.as_deref()),
            format!("status-change-{id}"),
            5,
        )),
        EventKind::ConsultationStatusChanged => None,

        // Cache-only: deletion carries no user-facing banner.
        EventKind::ConsultationDeleted => None,

        EventKind::Unknown => None,
    }
}

fn status_change_body(old: Option<&str>, new: Option<&str>) -> String {
    match (old, new) {
        (Some("PENDING"), Some("IN_REVIEW")) => {
            "Your consultation is now under review by an expert.".into()
        }
        (Some("IN_REVIEW"), Some("COMPLETED")) => {
            "Your consultation review is complete!".into()
        }
        (old, new) => format!(
            "Status changed from {} to {}",
            old.unwrap_or("unknown"),
            new.unwrap_or("unknown")
        ),
    }
}
