//! Domain types matching the VistaScan server models (snake_case field names).

use serde::{Deserialize, Serialize};

/// Account roles on the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Patient,
    Expert,
    Admin,
}

/// The notification event kinds the server emits.
///
/// Decoding is forward-compatible: an event kind this client does not know
/// about lands in [`EventKind::Unknown`] instead of failing the parse, and is
/// dropped downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    ConsultationCreated,
    ConsultationAssigned,
    ConsultationStatusChanged,
    ConsultationCompleted,
    ConsultationDeleted,
    #[serde(other)]
    Unknown,
}

/// A server-pushed notification event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationEvent {
    pub event_type: EventKind,
    pub consultation_id: String,
    pub patient_id: String,
    /// Present once an expert has been assigned. The server sends `""` for
    /// events with no expert, which we keep as-is; it never matches a real
    /// user id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expert_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_status: Option<String>,
    /// ISO-8601. The server emits naive local timestamps, so this stays a
    /// string rather than a typed UTC datetime.
    #[serde(default)]
    pub timestamp: String,
    /// Server-side description. Informational only; the client derives its
    /// own notification text.
    #[serde(default)]
    pub message: String,
}
