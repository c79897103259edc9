//! Real-time channel wire protocol
//!
//! JSON frames in both directions. Client frames are a closed tagged enum;
//! server frames cover the control replies plus the broadcast envelopes
//! built from domain events.

use chrono::Utc;
use fraudwatch_core::DomainEvent;
use serde::{Deserialize, Serialize};

/// Client -> server frames
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientFrame {
    Ping,
    Subscribe {
        #[serde(default)]
        channels: Vec<String>,
    },
    Unsubscribe {
        #[serde(default)]
        channels: Vec<String>,
    },
    JoinRoom { room: String },
    LeaveRoom { room: String },
}

/// Server -> client control frames
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ServerFrame {
    Connection {
        status: &'static str,
        client_id: String,
        timestamp: String,
    },
    Pong { timestamp: String },
    Subscribed {
        channels: Vec<String>,
        timestamp: String,
    },
    Unsubscribed {
        channels: Vec<String>,
        timestamp: String,
    },
    RoomJoined { room: String, timestamp: String },
    RoomLeft { room: String, timestamp: String },
    Error { message: String, timestamp: String },
}

impl ServerFrame {
    pub fn error(message: impl Into<String>) -> Self {
        ServerFrame::Error {
            message: message.into(),
            timestamp: now(),
        }
    }

    /// Serialize to the wire representation
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Build the broadcast envelope for a domain event
pub fn broadcast_frame(event: &DomainEvent) -> String {
    serde_json::json!({
        "type": event.stream_type(),
        "payload": event.payload(),
        "timestamp": now(),
    })
    .to_string()
}

pub(super) fn now() -> String {
    Utc::now().to_rfc3339()
}
