//! Wire frame: `{type, data}` JSON object (spec §4.1, §6).

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio_tungstenite::tungstenite::Message;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: Value,
}

impl Frame {
    pub fn new(kind: impl Into<String>, data: Value) -> Self {
        Self { kind: kind.into(), data }
    }

    pub fn auth(token: &str) -> Self {
        Self::new("auth", serde_json::json!({ "token": token }))
    }

    pub fn resume(token: &str) -> Self {
        Self::new("resume", serde_json::json!({ "token": token }))
    }

    pub fn subscribe(event: &str) -> Self {
        Self::new("subscribe", serde_json::json!({ "event": event }))
    }

    pub fn join_chat_channel(name: &str) -> Self {
        Self::new("join_chat_channel", serde_json::json!({ "name": name }))
    }

    pub fn chat_message(target: &str, message: &str) -> Self {
        Self::new("chat_message", serde_json::json!({ "target": target, "message": message }))
    }

    pub fn pong() -> Self {
        Self::new("pong", Value::Object(Default::default()))
    }

    /// Decoding failure produces a logged error, not a disconnect — callers
    /// should `tracing::warn!` on `Err` and keep the connection alive.
    pub fn decode(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    pub fn encode(&self) -> String {
        serde_json::to_string(self).expect("Frame serialization cannot fail")
    }
}

impl From<&Frame> for Message {
    fn from(frame: &Frame) -> Self {
        Message::Text(frame.encode().into())
    }
}

impl TryFrom<&Message> for Frame {
    type Error = serde_json::Error;

    fn try_from(msg: &Message) -> Result<Self, Self::Error> {
        match msg {
            Message::Text(text) => Frame::decode(text.as_str()),
            Message::Binary(bytes) => serde_json::from_slice(bytes),
            _ => Err(serde::de::Error::custom("non-data websocket message")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_decode_is_identity() {
        let frame = Frame::chat_message("#osu", "alice rolls 12 points!");
        let round_tripped = Frame::decode(&frame.encode()).unwrap();
        assert_eq!(frame, round_tripped);
    }

    #[test]
    fn decode_malformed_json_is_an_error_not_a_panic() {
        assert!(Frame::decode("{not json").is_err());
    }

    #[test]
    fn auth_frame_shape() {
        let frame = Frame::auth("tok123");
        assert_eq!(frame.kind, "auth");
        assert_eq!(frame.data["token"], "tok123");
    }

    #[test]
    fn message_round_trip_via_tungstenite() {
        let frame = Frame::join_chat_channel("#osu");
        let msg: Message = (&frame).into();
        let back = Frame::try_from(&msg).unwrap();
        assert_eq!(frame, back);
    }
}
