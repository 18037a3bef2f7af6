//! WebSocket frame types: inbound client frame and outbound envelope.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{HandshakeState, MatchId, Outbound, RelayEvent};
use crate::error::RelayError;
use crate::service::Dispatch;

/// Frame sent by a client: a named event plus an optional correlation id.
///
/// ```json
/// {"id": "7", "event": "join-match", "matchId": "M1"}
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct ClientFrame {
    /// Correlation id echoed in the acknowledgement or error.
    #[serde(default)]
    pub id: Option<String>,
    /// The named event.
    #[serde(flatten)]
    pub event: RelayEvent,
}

impl ClientFrame {
    /// Decodes a text message.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::MalformedFrame`] when the text is not a valid
    /// frame (bad JSON, unknown event, missing field, invalid match id).
    pub fn parse(text: &str) -> Result<Self, RelayError> {
        serde_json::from_str(text).map_err(|e| RelayError::MalformedFrame(e.to_string()))
    }
}

/// Top-level server → client envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerFrame {
    /// Echoed correlation id for acks and errors; server-generated for events.
    pub id: String,
    /// Frame type discriminator.
    #[serde(rename = "type")]
    pub frame_type: FrameType,
    /// ISO-8601 timestamp.
    pub timestamp: DateTime<Utc>,
    /// Variant-specific payload.
    pub payload: serde_json::Value,
}

/// Discriminator for server frames.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FrameType {
    /// Event forwarded from the peer or emitted by the relay.
    Event,
    /// Completion signal for the sender's own event.
    Ack,
    /// Failure signal for the sender's own event.
    Error,
}

/// Acknowledgement payload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct AckPayload<'a> {
    ok: bool,
    event: &'static str,
    match_id: &'a MatchId,
    state: HandshakeState,
    delivered: usize,
}

impl ServerFrame {
    /// Wraps an outbound event for delivery.
    #[must_use]
    pub fn event(outbound: &Outbound) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            frame_type: FrameType::Event,
            timestamp: Utc::now(),
            payload: serde_json::to_value(outbound).unwrap_or_default(),
        }
    }

    /// Builds the acknowledgement for a dispatched event.
    #[must_use]
    pub fn ack(id: Option<String>, dispatch: &Dispatch) -> Self {
        let payload = AckPayload {
            ok: true,
            event: dispatch.event,
            match_id: &dispatch.match_id,
            state: dispatch.state,
            delivered: dispatch.delivered,
        };
        Self {
            id: id.unwrap_or_default(),
            frame_type: FrameType::Ack,
            timestamp: Utc::now(),
            payload: serde_json::to_value(payload).unwrap_or_default(),
        }
    }

    /// Builds an error frame for a failed event.
    #[must_use]
    pub fn error(id: Option<String>, err: &RelayError) -> Self {
        Self {
            id: id.unwrap_or_default(),
            frame_type: FrameType::Error,
            timestamp: Utc::now(),
            payload: serde_json::to_value(err.body()).unwrap_or_default(),
        }
    }

    /// Serializes the frame to JSON text.
    #[must_use]
    pub fn to_json(&self) -> Option<String> {
        serde_json::to_string(self).ok()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use serde_json::json;

    fn mid(raw: &str) -> MatchId {
        let Ok(id) = MatchId::parse(raw) else {
            panic!("valid match id");
        };
        id
    }

    #[test]
    fn parses_frame_with_correlation_id() {
        let Ok(frame) = ClientFrame::parse(r#"{"id":"7","event":"join-match","matchId":"M1"}"#)
        else {
            panic!("frame should parse");
        };
        assert_eq!(frame.id.as_deref(), Some("7"));
        assert_eq!(frame.event, RelayEvent::JoinMatch { match_id: mid("M1") });
    }

    #[test]
    fn parses_frame_without_id() {
        let text = r#"{"event":"chess-piece-moved","matchId":"M1","moveData":{"from":"e2","to":"e4"}}"#;
        let Ok(frame) = ClientFrame::parse(text) else {
            panic!("frame should parse");
        };
        assert!(frame.id.is_none());
        assert_eq!(
            frame.event,
            RelayEvent::ChessPieceMoved {
                match_id: mid("M1"),
                move_data: json!({"from": "e2", "to": "e4"}),
            }
        );
    }

    #[test]
    fn malformed_inputs_are_reported() {
        for text in [
            "not json",
            r#"{"event":"join-match"}"#,
            r#"{"event":"join-match","matchId":""}"#,
            r#"{"event":"teleport","matchId":"M1"}"#,
        ] {
            assert!(
                matches!(ClientFrame::parse(text), Err(RelayError::MalformedFrame(_))),
                "{text} should be malformed"
            );
        }
    }

    #[test]
    fn ack_echoes_id_and_reports_state() {
        let dispatch = Dispatch {
            event: "connection-req-accepted",
            match_id: mid("M1"),
            state: HandshakeState::Connected,
            delivered: 1,
        };
        let frame = ServerFrame::ack(Some("42".to_string()), &dispatch);
        assert_eq!(frame.id, "42");
        assert_eq!(frame.frame_type, FrameType::Ack);
        assert_eq!(
            frame.payload,
            json!({
                "ok": true,
                "event": "connection-req-accepted",
                "matchId": "M1",
                "state": "connected",
                "delivered": 1
            })
        );
    }

    #[test]
    fn error_frame_carries_code() {
        let frame = ServerFrame::error(None, &RelayError::RoomFull(mid("M1")));
        assert_eq!(frame.id, "");
        assert_eq!(frame.frame_type, FrameType::Error);
        assert_eq!(
            frame.payload,
            json!({"code": 2003, "message": "match room M1 is full"})
        );
    }

    #[test]
    fn event_frame_wraps_payload() {
        let outbound = Outbound::Relayed(RelayEvent::ConnectionReqFromPlayer {
            match_id: mid("M2"),
            address: json!("addrA"),
        });
        let frame = ServerFrame::event(&outbound);
        assert_eq!(frame.frame_type, FrameType::Event);
        assert_eq!(
            frame.payload,
            json!({"event": "connection-req-from-player", "matchId": "M2", "address": "addrA"})
        );
        let Some(text) = frame.to_json() else {
            panic!("frame should serialize");
        };
        assert!(text.contains(r#""type":"event""#));
    }
}
