//! Wire types shared by the bridge (sandboxed side) and the host router.
//!
//! Every message crossing the boundary is an [`Envelope`]. Request/response pairs
//! share a correlation id; a reply to type `X` carries type `X-response`.
//! Payloads are plain JSON values so they are always structurally cloneable.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Suffix appended to a request type to form its reply type.
pub const RESPONSE_SUFFIX: &str = "-response";

// ─── Message vocabulary ──────────────────────────────────────────────────────

/// Known message types. Unknown wire types are kept as strings on the
/// [`Envelope`] and dropped by whichever side does not understand them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    EmitEvent,
    UpdateState,
    GetState,
    Subscribe,
    Unsubscribe,
    SubscriptionPush,
    Ready,
    MinimizeChat,
    ShowChat,
    EnterFullscreen,
    ExitFullscreen,
    PostToChat,
    ShowScript,
    ShowSnack,
    HideSnack,
    SaveInstanceData,
    QueryInstanceData,
    SaveProgress,
    QueryProgress,
    MarkComplete,
    IncrementProgress,
    FetchPublicProfile,
}

impl MessageType {
    pub const ALL: [MessageType; 22] = [
        MessageType::EmitEvent,
        MessageType::UpdateState,
        MessageType::GetState,
        MessageType::Subscribe,
        MessageType::Unsubscribe,
        MessageType::SubscriptionPush,
        MessageType::Ready,
        MessageType::MinimizeChat,
        MessageType::ShowChat,
        MessageType::EnterFullscreen,
        MessageType::ExitFullscreen,
        MessageType::PostToChat,
        MessageType::ShowScript,
        MessageType::ShowSnack,
        MessageType::HideSnack,
        MessageType::SaveInstanceData,
        MessageType::QueryInstanceData,
        MessageType::SaveProgress,
        MessageType::QueryProgress,
        MessageType::MarkComplete,
        MessageType::IncrementProgress,
        MessageType::FetchPublicProfile,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::EmitEvent => "emit-event",
            MessageType::UpdateState => "update-state",
            MessageType::GetState => "get-state",
            MessageType::Subscribe => "subscribe",
            MessageType::Unsubscribe => "unsubscribe",
            MessageType::SubscriptionPush => "subscription-push",
            MessageType::Ready => "ready",
            MessageType::MinimizeChat => "minimize-chat",
            MessageType::ShowChat => "show-chat",
            MessageType::EnterFullscreen => "enter-fullscreen",
            MessageType::ExitFullscreen => "exit-fullscreen",
            MessageType::PostToChat => "post-to-chat",
            MessageType::ShowScript => "show-script",
            MessageType::ShowSnack => "show-snack",
            MessageType::HideSnack => "hide-snack",
            MessageType::SaveInstanceData => "save-instance-data",
            MessageType::QueryInstanceData => "query-instance-data",
            MessageType::SaveProgress => "save-progress",
            MessageType::QueryProgress => "query-progress",
            MessageType::MarkComplete => "mark-complete",
            MessageType::IncrementProgress => "increment-progress",
            MessageType::FetchPublicProfile => "fetch-public-profile",
        }
    }

    pub fn from_wire(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.as_str() == s)
    }

    /// Whether the host answers this type with a correlated `-response`.
    ///
    /// `subscribe` is acknowledged too, but its ack is routed to the
    /// subscription channel instead of the pending-call map.
    pub fn expects_reply(&self) -> bool {
        matches!(
            self,
            MessageType::GetState
                | MessageType::PostToChat
                | MessageType::ShowSnack
                | MessageType::SaveInstanceData
                | MessageType::QueryInstanceData
                | MessageType::SaveProgress
                | MessageType::QueryProgress
                | MessageType::MarkComplete
                | MessageType::IncrementProgress
                | MessageType::FetchPublicProfile
        )
    }

    pub fn response_type(&self) -> String {
        format!("{}{}", self.as_str(), RESPONSE_SUFFIX)
    }
}

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Envelope ────────────────────────────────────────────────────────────────

/// One message on the wire: `{type, correlationId, payload}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    #[serde(rename = "type")]
    pub message_type: String,
    pub correlation_id: String,
    #[serde(default)]
    pub payload: Map<String, Value>,
}

impl Envelope {
    pub fn new(kind: MessageType, correlation_id: impl Into<String>, payload: Map<String, Value>) -> Self {
        Self {
            message_type: kind.as_str().to_string(),
            correlation_id: correlation_id.into(),
            payload,
        }
    }

    /// Parsed message type, `None` for vocabulary this build does not know.
    pub fn kind(&self) -> Option<MessageType> {
        MessageType::from_wire(&self.message_type)
    }

    /// If this is a reply, the request type it answers.
    pub fn replied_kind(&self) -> Option<MessageType> {
        self.message_type
            .strip_suffix(RESPONSE_SUFFIX)
            .and_then(MessageType::from_wire)
    }

    pub fn is_reply(&self) -> bool {
        self.message_type.ends_with(RESPONSE_SUFFIX)
    }

    /// Build the correlated reply to this envelope.
    pub fn reply(&self, reply: &RpcReply) -> Envelope {
        Envelope {
            message_type: format!("{}{}", self.message_type, RESPONSE_SUFFIX),
            correlation_id: self.correlation_id.clone(),
            payload: reply.to_payload(),
        }
    }

    /// String field from the payload, if present.
    pub fn payload_str(&self, key: &str) -> Option<&str> {
        self.payload.get(key).and_then(|v| v.as_str())
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }
}

// ─── Replies ─────────────────────────────────────────────────────────────────

/// Outcome of one request/response call.
///
/// `result` and `error` are independent: a host may return a partial result
/// together with an error, so callers must inspect both.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RpcReply {
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<String>,
}

impl RpcReply {
    pub fn ok(result: Value) -> Self {
        Self {
            result: Some(result),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            result: None,
            error: Some(message.into()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn from_payload(payload: &Map<String, Value>) -> Self {
        let result = payload.get("result").filter(|v| !v.is_null()).cloned();
        let error = payload.get("error").and_then(|v| match v {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        });
        Self { result, error }
    }

    pub fn to_payload(&self) -> Map<String, Value> {
        let mut payload = Map::new();
        payload.insert(
            "result".to_string(),
            self.result.clone().unwrap_or(Value::Null),
        );
        payload.insert(
            "error".to_string(),
            self.error.clone().map(Value::String).unwrap_or(Value::Null),
        );
        payload
    }
}

/// Build a payload map from a JSON value; non-objects are wrapped under `"value"`.
pub fn payload_from(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        other => {
            let mut map = Map::new();
            map.insert("value".to_string(), other);
            map
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wire_names_round_trip() {
        for kind in MessageType::ALL {
            assert_eq!(MessageType::from_wire(kind.as_str()), Some(kind));
        }
        assert_eq!(MessageType::from_wire("launch-rockets"), None);
    }

    #[test]
    fn test_envelope_uses_camel_case_wire_shape() {
        let env = Envelope::new(
            MessageType::GetState,
            "rpc-1-1",
            payload_from(json!({"scope": "lesson"})),
        );
        let value: Value = serde_json::from_str(&env.to_json().unwrap()).unwrap();
        assert_eq!(value["type"], "get-state");
        assert_eq!(value["correlationId"], "rpc-1-1");
        assert_eq!(value["payload"]["scope"], "lesson");
    }

    #[test]
    fn test_missing_payload_defaults_to_empty() {
        let env = Envelope::from_json(r#"{"type":"ready","correlationId":"x"}"#).unwrap();
        assert!(env.payload.is_empty());
        assert_eq!(env.kind(), Some(MessageType::Ready));
    }

    #[test]
    fn test_reply_keeps_correlation_and_suffixes_type() {
        let env = Envelope::new(MessageType::QueryProgress, "rpc-9-3", Map::new());
        let reply = env.reply(&RpcReply::ok(json!({"progress": 0.5})));
        assert_eq!(reply.message_type, "query-progress-response");
        assert_eq!(reply.correlation_id, "rpc-9-3");
        assert!(reply.is_reply());
        assert_eq!(reply.replied_kind(), Some(MessageType::QueryProgress));
    }

    #[test]
    fn test_reply_fields_are_independent() {
        let payload = payload_from(json!({"result": {"partial": true}, "error": "quota"}));
        let reply = RpcReply::from_payload(&payload);
        assert_eq!(reply.result, Some(json!({"partial": true})));
        assert_eq!(reply.error.as_deref(), Some("quota"));

        let empty = RpcReply::from_payload(&Map::new());
        assert_eq!(empty, RpcReply::default());
    }

    #[test]
    fn test_only_requests_expect_replies() {
        assert!(MessageType::GetState.expects_reply());
        assert!(MessageType::ShowSnack.expects_reply());
        assert!(!MessageType::EmitEvent.expects_reply());
        assert!(!MessageType::Subscribe.expects_reply());
        assert!(!MessageType::HideSnack.expects_reply());
    }
}
