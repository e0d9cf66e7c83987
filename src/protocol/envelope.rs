//! Signaling message envelope
//!
//! The relay treats negotiation payloads as opaque. The only fields it
//! reads or writes are the routing fields defined here; everything else
//! round-trips untouched through the flattened extras map.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::registry::ConnectionId;

/// A single signaling frame as it appears on the wire.
///
/// Known fields:
/// - `type`: application-level label ("join", "offer", "answer",
///   "candidate", ...). The relay never branches on it; the only message
///   it synthesizes itself is the `"leave"` notice.
/// - `to`: unicast target. Present means "deliver to this peer only",
///   absent means "broadcast to the rest of the room".
/// - `id`: sender identity. Always overwritten by the relay before
///   forwarding, so clients cannot spoof each other.
///
/// Any other fields (SDP blobs, ICE candidates, labels) are carried in
/// `extra` and serialized back out unchanged.
///
/// A frame that is not a JSON object, or whose `to` is not an unsigned
/// integer, fails to parse and is dropped by the router.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalMessage {
    /// Message label, opaque to the relay
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    /// Unicast target connection id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<ConnectionId>,

    /// Sender connection id, stamped by the relay
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ConnectionId>,

    /// Everything else, passed through untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SignalMessage {
    /// Create an empty message with the given label
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: Some(kind.into()),
            to: None,
            id: None,
            extra: Map::new(),
        }
    }

    /// The `{"type":"leave","id":N}` notice broadcast when a peer's
    /// transport closes
    pub fn leave_notice(id: ConnectionId) -> Self {
        let mut msg = Self::new("leave");
        msg.id = Some(id);
        msg
    }

    /// Parse a raw text frame
    pub fn parse(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Serialize back to wire text
    pub fn to_text(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Overwrite the sender identity field. Called by the router on every
    /// inbound frame; whatever `id` the client sent is discarded.
    pub fn stamp_sender(&mut self, sender: ConnectionId) {
        self.id = Some(sender);
    }

    /// Unicast target, if the message is addressed
    pub fn recipient(&self) -> Option<ConnectionId> {
        self.to
    }

    /// Attach an extra payload field (builder style, mainly for clients)
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_routing_fields() {
        let msg = SignalMessage::parse(r#"{"type":"offer","to":7,"sdp":"v=0"}"#).unwrap();

        assert_eq!(msg.kind.as_deref(), Some("offer"));
        assert_eq!(msg.recipient(), Some(7));
        assert_eq!(msg.id, None);
        assert_eq!(msg.extra.get("sdp"), Some(&Value::from("v=0")));
    }

    #[test]
    fn test_stamp_overwrites_spoofed_id() {
        let mut msg = SignalMessage::parse(r#"{"type":"offer","id":999}"#).unwrap();
        msg.stamp_sender(3);

        assert_eq!(msg.id, Some(3));
    }

    #[test]
    fn test_payload_round_trips_unchanged() {
        let raw = r#"{"type":"candidate","candidate":"cand:1 udp","label":0,"nested":{"a":[1,2]}}"#;
        let mut msg = SignalMessage::parse(raw).unwrap();
        msg.stamp_sender(5);

        let out: Value = serde_json::from_str(&msg.to_text().unwrap()).unwrap();
        assert_eq!(out["id"], 5);
        assert_eq!(out["candidate"], "cand:1 udp");
        assert_eq!(out["label"], 0);
        assert_eq!(out["nested"]["a"][1], 2);
    }

    #[test]
    fn test_absent_fields_not_serialized() {
        let msg = SignalMessage::new("join");
        let out: Value = serde_json::from_str(&msg.to_text().unwrap()).unwrap();

        let obj = out.as_object().unwrap();
        assert!(!obj.contains_key("to"));
        assert!(!obj.contains_key("id"));
    }

    #[test]
    fn test_leave_notice_shape() {
        let out: Value =
            serde_json::from_str(&SignalMessage::leave_notice(4).to_text().unwrap()).unwrap();

        assert_eq!(out, serde_json::json!({"type": "leave", "id": 4}));
    }

    #[test]
    fn test_non_object_frame_rejected() {
        assert!(SignalMessage::parse("[1,2,3]").is_err());
        assert!(SignalMessage::parse("\"offer\"").is_err());
        assert!(SignalMessage::parse("{not json").is_err());
    }

    #[test]
    fn test_non_integer_to_rejected() {
        assert!(SignalMessage::parse(r#"{"type":"offer","to":"abc"}"#).is_err());
        assert!(SignalMessage::parse(r#"{"type":"offer","to":1.5}"#).is_err());
    }

    #[test]
    fn test_type_is_optional() {
        // The relay is protocol-agnostic; a frame without a label still routes.
        let msg = SignalMessage::parse(r#"{"data":42}"#).unwrap();
        assert_eq!(msg.kind, None);
        assert_eq!(msg.extra.get("data"), Some(&Value::from(42)));
    }
}
