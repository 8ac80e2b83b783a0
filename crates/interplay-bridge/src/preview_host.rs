//! In-memory host used for disconnected preview and tests.
//!
//! Keeps everything a real host would persist or display in plain fields so
//! callers can inspect what the widget did.

use crate::host::HostCapabilities;
use interplay_core::envelope::{MessageType, RpcReply};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

const DEFAULT_SNACK_MS: u64 = 4_000;

#[derive(Debug, Clone, PartialEq)]
pub struct Snack {
    pub message: String,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmittedEvent {
    pub name: String,
    pub data: Value,
}

#[derive(Debug, Default)]
pub struct PreviewHost {
    pub state: Value,
    pub instance_data: Vec<Value>,
    pub progress: Value,
    pub progress_count: f64,
    pub completed: bool,
    pub chat_log: Vec<String>,
    pub snack: Option<Snack>,
    pub events: Vec<EmittedEvent>,
    pub fullscreen: bool,
    pub chat_minimized: bool,
    pub script: Option<Value>,
    pub ready: bool,
    pub profiles: BTreeMap<String, Value>,
}

impl PreviewHost {
    pub fn new() -> Self {
        Self {
            state: json!({}),
            progress: Value::Null,
            ..Default::default()
        }
    }

    pub fn with_profile(mut self, user_id: impl Into<String>, profile: Value) -> Self {
        self.profiles.insert(user_id.into(), profile);
        self
    }

    fn query_instance_data(&self, query: Option<&Value>) -> Value {
        let Some(Value::Object(filter)) = query else {
            return Value::Array(self.instance_data.clone());
        };
        let matches = self
            .instance_data
            .iter()
            .filter(|record| {
                filter
                    .iter()
                    .all(|(key, expected)| record.get(key) == Some(expected))
            })
            .cloned()
            .collect();
        Value::Array(matches)
    }
}

impl HostCapabilities for PreviewHost {
    fn handle_request(&mut self, kind: MessageType, payload: &Map<String, Value>) -> RpcReply {
        match kind {
            MessageType::GetState => RpcReply::ok(self.state.clone()),
            MessageType::SaveInstanceData => match payload.get("data") {
                Some(data) => {
                    self.instance_data.push(data.clone());
                    RpcReply::ok(json!({ "saved": true, "count": self.instance_data.len() }))
                }
                None => RpcReply::error("save-instance-data requires `data`"),
            },
            MessageType::QueryInstanceData => {
                RpcReply::ok(self.query_instance_data(payload.get("query")))
            }
            MessageType::SaveProgress => {
                self.progress = payload.get("progress").cloned().unwrap_or(Value::Null);
                RpcReply::ok(json!({ "saved": true }))
            }
            MessageType::QueryProgress => RpcReply::ok(json!({
                "progress": self.progress,
                "count": self.progress_count,
                "completed": self.completed,
            })),
            MessageType::MarkComplete => {
                self.completed = true;
                RpcReply::ok(json!({ "completed": true }))
            }
            MessageType::IncrementProgress => {
                let amount = payload.get("amount").and_then(Value::as_f64).unwrap_or(1.0);
                self.progress_count += amount;
                RpcReply::ok(json!({ "count": self.progress_count }))
            }
            MessageType::FetchPublicProfile => {
                let user_id = payload
                    .get("userId")
                    .and_then(Value::as_str)
                    .unwrap_or("preview-user");
                match self.profiles.get(user_id) {
                    Some(profile) => RpcReply::ok(profile.clone()),
                    None => RpcReply::ok(json!({ "id": user_id, "displayName": "Preview Learner" })),
                }
            }
            MessageType::PostToChat => {
                let message = payload
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                if message.is_empty() {
                    return RpcReply::error("post-to-chat requires a non-empty `message`");
                }
                self.chat_log.push(message);
                RpcReply::ok(json!({ "posted": true }))
            }
            MessageType::ShowSnack => {
                let message = payload
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                let duration_ms = payload
                    .get("durationMs")
                    .and_then(Value::as_u64)
                    .unwrap_or(DEFAULT_SNACK_MS);
                self.snack = Some(Snack {
                    message,
                    duration_ms,
                });
                RpcReply::ok(json!({ "shown": true, "durationMs": duration_ms }))
            }
            other => RpcReply::error(format!("Not a request type: {}", other)),
        }
    }

    fn handle_notification(&mut self, kind: MessageType, payload: &Map<String, Value>) {
        match kind {
            MessageType::EmitEvent => self.events.push(EmittedEvent {
                name: payload
                    .get("name")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                data: payload.get("data").cloned().unwrap_or(Value::Null),
            }),
            MessageType::UpdateState => {
                if let Some(state) = payload.get("state") {
                    merge_state(&mut self.state, state.clone());
                }
            }
            MessageType::Ready => self.ready = true,
            MessageType::MinimizeChat => self.chat_minimized = true,
            MessageType::ShowChat => self.chat_minimized = false,
            MessageType::EnterFullscreen => self.fullscreen = true,
            MessageType::ExitFullscreen => self.fullscreen = false,
            MessageType::ShowScript => self.script = payload.get("script").cloned(),
            MessageType::HideSnack => self.snack = None,
            other => tracing::debug!(%other, "preview host ignoring notification"),
        }
    }
}

/// Shallow merge for object states; anything else replaces.
fn merge_state(current: &mut Value, update: Value) {
    match (current, update) {
        (Value::Object(current), Value::Object(update)) => {
            for (key, value) in update {
                current.insert(key, value);
            }
        }
        (current, update) => *current = update,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use interplay_core::envelope::payload_from;

    #[test]
    fn test_state_merges_shallowly() {
        let mut host = PreviewHost::new();
        host.handle_notification(
            MessageType::UpdateState,
            &payload_from(json!({"state": {"a": 1, "b": 1}})),
        );
        host.handle_notification(
            MessageType::UpdateState,
            &payload_from(json!({"state": {"b": 2}})),
        );
        let reply = host.handle_request(MessageType::GetState, &Map::new());
        assert_eq!(reply.result, Some(json!({"a": 1, "b": 2})));
    }

    #[test]
    fn test_instance_data_query_filters() {
        let mut host = PreviewHost::new();
        for who in ["ana", "ben", "ana"] {
            host.handle_request(
                MessageType::SaveInstanceData,
                &payload_from(json!({"data": {"who": who}})),
            );
        }
        let reply = host.handle_request(
            MessageType::QueryInstanceData,
            &payload_from(json!({"query": {"who": "ana"}})),
        );
        assert_eq!(reply.result.unwrap().as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_snack_default_duration_and_hide() {
        let mut host = PreviewHost::new();
        host.handle_request(MessageType::ShowSnack, &payload_from(json!({"message": "hi"})));
        assert_eq!(host.snack.as_ref().unwrap().duration_ms, DEFAULT_SNACK_MS);
        host.handle_notification(MessageType::HideSnack, &Map::new());
        assert!(host.snack.is_none());
    }

    #[test]
    fn test_empty_chat_message_is_error() {
        let mut host = PreviewHost::new();
        let reply = host.handle_request(MessageType::PostToChat, &Map::new());
        assert!(reply.is_error());
        assert!(host.chat_log.is_empty());
    }

    #[test]
    fn test_progress_accumulates() {
        let mut host = PreviewHost::new();
        host.handle_request(MessageType::IncrementProgress, &Map::new());
        host.handle_request(
            MessageType::IncrementProgress,
            &payload_from(json!({"amount": 2.5})),
        );
        host.handle_request(MessageType::MarkComplete, &Map::new());
        let reply = host.handle_request(MessageType::QueryProgress, &Map::new());
        let result = reply.result.unwrap();
        assert_eq!(result["count"], json!(3.5));
        assert_eq!(result["completed"], json!(true));
    }
}
