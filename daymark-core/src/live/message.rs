//! Push channel wire messages.

use serde::{Deserialize, Serialize};

use crate::constants::SUBSCRIBED_TOPICS;
use crate::sync_status::SyncSnapshot;

/// Client → server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Subscribe { topics: Vec<String> },
}

impl ClientMessage {
    /// The one-time handshake sent after every successful connect.
    pub fn subscribe() -> Self {
        ClientMessage::Subscribe {
            topics: SUBSCRIBED_TOPICS.iter().map(|t| t.to_string()).collect(),
        }
    }
}

/// Server → client envelope.
#[derive(Debug, Deserialize)]
struct ServerMessage {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: serde_json::Value,
}

/// What a server message means for us.
#[derive(Debug, Clone, PartialEq)]
pub enum LiveEvent {
    /// A full sync snapshot.
    Snapshot(SyncSnapshot),
    /// Progress moved but the message carries no full snapshot.
    ProgressChanged,
    /// A message type we don't act on.
    Ignored(String),
}

/// Decode a server message. Only text that isn't a `{type, data}` envelope
/// is an error; unknown types are [`LiveEvent::Ignored`].
pub fn interpret(text: &str) -> Result<LiveEvent, serde_json::Error> {
    let message: ServerMessage = serde_json::from_str(text)?;

    if !SUBSCRIBED_TOPICS.contains(&message.kind.as_str()) {
        return Ok(LiveEvent::Ignored(message.kind));
    }

    Ok(match serde_json::from_value::<SyncSnapshot>(message.data) {
        Ok(snapshot) => LiveEvent::Snapshot(snapshot),
        Err(_) => LiveEvent::ProgressChanged,
    })
}
