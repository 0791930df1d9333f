//! Media snapshot and session description construction.

use std::sync::Arc;

use bridge_traits::cast::{CastSession, IdleReason, MediaStatus, PlayerState};
use bridge_traits::Clock;
use core_runtime::model::{
    MediaSnapshot, QueueItemSnapshot, SessionDescription, SessionStatus,
};

/// Builds [`MediaSnapshot`]s and remembers the last one handed out.
///
/// The retained snapshot is only ever replaced, so earlier `Arc`s held by
/// listeners stay valid and unchanged.
pub struct SnapshotBuilder {
    clock: Arc<dyn Clock>,
    last: Option<Arc<MediaSnapshot>>,
}

impl SnapshotBuilder {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock, last: None }
    }

    pub fn last(&self) -> Option<Arc<MediaSnapshot>> {
        self.last.clone()
    }

    /// Fresh snapshot from the live status and the last settled queue items.
    pub fn build(
        &mut self,
        session_id: &str,
        status: Option<&MediaStatus>,
        items: &[QueueItemSnapshot],
    ) -> Arc<MediaSnapshot> {
        let snapshot = Arc::new(fresh(
            session_id,
            status,
            items,
            self.clock.unix_timestamp_millis(),
        ));
        self.last = Some(snapshot.clone());
        snapshot
    }

    /// Snapshot reporting the player idle for `reason`.
    ///
    /// Derived from the previous snapshot so it still describes the item that
    /// just ended. Without a previous snapshot a fresh one is built instead.
    pub fn build_idle(
        &mut self,
        reason: IdleReason,
        session_id: &str,
        status: Option<&MediaStatus>,
        items: &[QueueItemSnapshot],
    ) -> Arc<MediaSnapshot> {
        match &self.last {
            Some(previous) => {
                let snapshot = Arc::new(previous.as_idle(reason));
                self.last = Some(snapshot.clone());
                snapshot
            }
            None => self.build(session_id, status, items),
        }
    }
}

fn fresh(
    session_id: &str,
    status: Option<&MediaStatus>,
    items: &[QueueItemSnapshot],
    captured_at_ms: i64,
) -> MediaSnapshot {
    let Some(status) = status else {
        return MediaSnapshot {
            session_id: session_id.to_string(),
            media_session_id: 0,
            player_state: PlayerState::Unknown,
            idle_reason: None,
            current_item_id: None,
            current_time: 0.0,
            playback_rate: 1.0,
            volume: Default::default(),
            repeat_mode: Default::default(),
            media: None,
            items: items.to_vec(),
            is_alive: false,
            custom_data: None,
            captured_at_ms,
        };
    };

    MediaSnapshot {
        session_id: session_id.to_string(),
        media_session_id: status.media_session_id,
        player_state: status.player_state,
        idle_reason: status.idle_reason,
        current_item_id: status.current_item_id,
        current_time: status.stream_position_ms as f64 / 1000.0,
        playback_rate: status.playback_rate,
        volume: status.volume,
        repeat_mode: status.repeat_mode,
        media: status.media.clone(),
        items: items.to_vec(),
        is_alive: status.player_state != PlayerState::Idle,
        custom_data: status.custom_data.clone(),
        captured_at_ms,
    }
}

/// Describe `session` for the host.
pub fn describe_session(
    session: &dyn CastSession,
    status: SessionStatus,
    media: Option<&MediaSnapshot>,
) -> SessionDescription {
    let info = session.info();
    SessionDescription {
        session_id: info.session_id,
        app_id: info.app_id,
        display_name: info.display_name,
        status_text: info.status_text,
        status,
        receiver: info.receiver,
        media: media.cloned(),
    }
}
