//! Inbound frame classification.
//!
//! The notification channel carries three kinds of text traffic: heartbeat
//! acknowledgements, a one-time connection greeting, and JSON-encoded
//! notification events. Anything else is protocol drift and gets dropped
//! without disturbing the connection.

use tracing::warn;

use crate::types::NotificationEvent;

/// Outbound keep-alive frame.
pub const KEEPALIVE: &str = "ping";
/// Inbound keep-alive acknowledgement.
pub const KEEPALIVE_ACK: &str = "pong";
/// Substring identifying the server's connect-time greeting.
pub const GREETING: &str = "Connected to notifications";

/// What a raw inbound text frame turned out to be.
#[derive(Debug, Clone)]
pub enum Frame {
    /// Heartbeat acknowledgement; recognized and discarded.
    KeepAliveAck,
    /// One-time connection greeting; recognized and discarded.
    Greeting,
    /// A structured notification event.
    Event(NotificationEvent),
    /// Unparseable or unrecognized traffic; logged and dropped.
    Malformed,
}

/// Classify a raw text frame.
///
/// Never fails: malformed input becomes [`Frame::Malformed`] so protocol
/// drift can't break the socket or leak into the UI layer.
pub fn decode(raw: &str) -> Frame {
    if raw == KEEPALIVE_ACK {
        return Frame::KeepAliveAck;
    }
    if raw.contains(GREETING) {
        return Frame::Greeting;
    }

    match serde_json::from_str::<NotificationEvent>(raw) {
        Ok(event) => Frame::Event(event),
        Err(e) => {
            warn!("Dropping malformed frame: {e}");
            Frame::Malformed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EventKind;

    #[test]
    fn test_keepalive_ack_is_not_an_event() {
        assert!(matches!(decode("pong"), Frame::KeepAliveAck));
    }

    #[test]
    fn test_greeting_is_recognized() {
        assert!(matches!(
            decode("Connected to notifications"),
            Frame::Greeting
        ));
    }

    #[test]
    fn test_event_frame_decodes() {
        let raw = r#"{"event_type":"consultation_completed","consultation_id":"c1","patient_id":"p1","expert_id":"e1","timestamp":"2024-01-01T00:00:00Z","message":"x"}"#;
        match decode(raw) {
            Frame::Event(event) => {
                assert_eq!(event.event_type, EventKind::ConsultationCompleted);
                assert_eq!(event.consultation_id, "c1");
            }
            other => panic!("expected event frame, got {other:?}"),
        }
    }

    #[test]
    fn test_garbage_is_malformed_not_panic() {
        assert!(matches!(decode("{not json"), Frame::Malformed));
        assert!(matches!(decode(""), Frame::Malformed));
        assert!(matches!(decode("[1,2,3]"), Frame::Malformed));
    }
}
