//! Cache invalidation dispatch.
//!
//! Each server event maps to a set of query-cache regions whose displayed
//! data could now be stale. Invalidation is declarative and fire-and-forget:
//! the host's cache decides when (or whether) a refetch actually happens.

use std::fmt;

use crate::types::{EventKind, NotificationEvent};

/// A label addressing a region of the host's query cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheTag {
    /// The viewer-scoped consultation list.
    Consultations,
    /// The admin/global consultation list.
    AllConsultations,
    /// One consultation's detail view.
    Consultation(String),
    /// The admin user list.
    Users,
}

impl fmt::Display for CacheTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Consultations => write!(f, "consultations"),
            Self::AllConsultations => write!(f, "all-consultations"),
            Self::Consultation(id) => write!(f, "consultation:{id}"),
            Self::Users => write!(f, "users"),
        }
    }
}

/// Invalidation side of the host's query cache.
pub trait CacheStore: Send + Sync {
    /// Mark the given regions stale. Must not block; failures stay inside
    /// the implementation.
    fn invalidate(&self, tags: &[CacheTag]);
}

/// Tags whose data could be stale after `event`.
///
/// Deletion also touches the admin user list because deleting a
/// consultation cascades into per-user counts shown there.
pub fn invalidation_tags(event: &NotificationEvent) -> Vec<CacheTag> {
    let id = event.consultation_id.clone();
    match event.event_type {
        EventKind::ConsultationCreated => {
            vec![CacheTag::Consultations, CacheTag::AllConsultations]
        }
        EventKind::ConsultationAssigned
        | EventKind::ConsultationStatusChanged
        | EventKind::ConsultationCompleted => vec![
            CacheTag::Consultation(id),
            CacheTag::Consultations,
            CacheTag::AllConsultations,
        ],
        EventKind::ConsultationDeleted => vec![
            CacheTag::Consultation(id),
            CacheTag::Consultations,
            CacheTag::AllConsultations,
            CacheTag::Users,
        ],
        EventKind::Unknown => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(kind: EventKind) -> NotificationEvent {
        NotificationEvent {
            event_type: kind,
            consultation_id: "c1".into(),
            patient_id: "p1".into(),
            expert_id: None,
            old_status: None,
            new_status: None,
            timestamp: "2024-01-01T00:00:00Z".into(),
            message: String::new(),
        }
    }

    #[test]
    fn test_created_invalidates_lists_only() {
        assert_eq!(
            invalidation_tags(&event(EventKind::ConsultationCreated)),
            vec![CacheTag::Consultations, CacheTag::AllConsultations]
        );
    }

    #[test]
    fn test_lifecycle_events_invalidate_detail_and_lists() {
        for kind in [
            EventKind::ConsultationAssigned,
            EventKind::ConsultationStatusChanged,
            EventKind::ConsultationCompleted,
        ] {
            assert_eq!(
                invalidation_tags(&event(kind)),
                vec![
                    CacheTag::Consultation("c1".into()),
                    CacheTag::Consultations,
                    CacheTag::AllConsultations,
                ],
                "wrong tag set for {kind:?}"
            );
        }
    }

    #[test]
    fn test_deleted_also_invalidates_users() {
        assert_eq!(
            invalidation_tags(&event(EventKind::ConsultationDeleted)),
            vec![
                CacheTag::Consultation("c1".into()),
                CacheTag::Consultations,
                CacheTag::AllConsultations,
                CacheTag::Users,
            ]
        );
    }

    #[test]
    fn test_unknown_invalidates_nothing() {
        assert!(invalidation_tags(&event(EventKind::Unknown)).is_empty());
    }

    #[test]
    fn test_tag_display() {
        assert_eq!(CacheTag::Consultation("c9".into()).to_string(), "consultation:c9");
        assert_eq!(CacheTag::AllConsultations.to_string(), "all-consultations");
    }
}
