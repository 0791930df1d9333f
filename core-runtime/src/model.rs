//! Caller-facing playback and session descriptions.
//!
//! These are the values handed to the host application. They are built by
//! `core-cast` and never mutated afterwards: a change produces a new value.

use bridge_traits::cast::{
    IdleReason, MediaInfo, PlayerState, QueueItem, ReceiverInfo, RepeatMode, Volume,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

/// Point-in-time description of playback on the receiver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaSnapshot {
    pub session_id: String,
    pub media_session_id: i64,
    pub player_state: PlayerState,
    pub idle_reason: Option<IdleReason>,
    pub current_item_id: Option<i32>,
    /// Stream position in seconds.
    pub current_time: f64,
    pub playback_rate: f64,
    pub volume: Volume,
    pub repeat_mode: RepeatMode,
    pub media: Option<MediaInfo>,
    /// Resolved queue window around the current item, in index order.
    pub items: Vec<QueueItemSnapshot>,
    pub is_alive: bool,
    pub custom_data: Option<Value>,
    pub captured_at_ms: i64,
}

impl MediaSnapshot {
    /// Copy of this snapshot reporting an idle player.
    pub fn as_idle(&self, reason: IdleReason) -> Self {
        Self {
            player_state: PlayerState::Idle,
            idle_reason: Some(reason),
            ..self.clone()
        }
    }
}

/// Queue item together with the index it was resolved at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueItemSnapshot {
    pub index: usize,
    #[serde(flatten)]
    pub item: QueueItem,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Connected,
    Stopped,
}

/// Session as reported to the host (`chrome.cast.Session` shape).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDescription {
    pub session_id: String,
    pub app_id: String,
    pub display_name: Option<String>,
    pub status_text: Option<String>,
    pub status: SessionStatus,
    pub receiver: ReceiverInfo,
    pub media: Option<MediaSnapshot>,
}

/// Serialize for the host bridge, degrading to `{}` on failure.
pub fn to_json_value<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or_else(|err| {
        warn!(error = %err, "Failed to serialize value for host, sending empty object");
        Value::Object(Default::default())
    })
}
