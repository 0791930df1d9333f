//! End-to-end synchronization against the loopback receiver.

use std::sync::Arc;

use bridge_desktop::{LoopbackSession, ManualExecutor};
use bridge_traits::cast::{
    CastSession, ClientEvent, IdleReason, MediaInfo, MediaStatus, PlayerState, QueueItem,
};
use bridge_traits::time::FixedClock;
use core_cast::{CastListener, EventBusListener, SessionController};
use core_runtime::events::{CoreEvent, EventBus, MediaEvent};
use core_runtime::model::{MediaSnapshot, SessionDescription};
use parking_lot::Mutex;

#[derive(Default)]
struct Snapshots {
    loaded: Mutex<Vec<Arc<MediaSnapshot>>>,
    updates: Mutex<Vec<Arc<MediaSnapshot>>>,
}

impl CastListener for Snapshots {
    fn on_media_loaded(&self, snapshot: Arc<MediaSnapshot>) {
        self.loaded.lock().push(snapshot);
    }

    fn on_media_update(&self, snapshot: Arc<MediaSnapshot>) {
        self.updates.lock().push(snapshot);
    }

    fn on_session_update(&self, _description: SessionDescription) {}

    fn on_session_end(&self, _description: SessionDescription) {}

    fn on_message_received(&self, _device_id: &str, _namespace: &str, _message: &str) {}
}

fn item(id: i32, name: &str) -> QueueItem {
    QueueItem {
        item_id: id,
        media: Some(MediaInfo {
            content_id: format!("https://cdn.example.com/{name}.mp4"),
            content_type: "video/mp4".to_string(),
            ..Default::default()
        }),
        autoplay: true,
        start_time: 0.0,
        custom_data: None,
    }
}

fn indexes(snapshot: &MediaSnapshot) -> Vec<usize> {
    snapshot.items.iter().map(|item| item.index).collect()
}

struct Fixture {
    executor: ManualExecutor,
    listener: Arc<Snapshots>,
    session: Arc<LoopbackSession>,
    _controller: SessionController,
}

/// Session playing B out of [A, B, C], with the queue window settled.
fn playing_b() -> Fixture {
    let executor = ManualExecutor::new();
    let listener = Arc::new(Snapshots::default());
    let controller = SessionController::new(
        Arc::new(executor.clone()),
        Arc::new(FixedClock::from_millis(0)),
        listener.clone(),
    );
    let session = Arc::new(LoopbackSession::new("CC1AD845", "Living Room", true));
    controller.set_session(Some(session.clone())).unwrap();
    executor.run_until_idle();

    let client = session.client().unwrap();
    let queue = client.queue();
    client.set_status(Some(MediaStatus {
        media_session_id: 1,
        player_state: PlayerState::Playing,
        current_item_id: Some(11),
        playback_rate: 1.0,
        ..Default::default()
    }));
    queue.reload(vec![item(10, "a"), item(11, "b"), item(12, "c")]);
    executor.run_until_idle();
    assert_eq!(queue.pending_fetches(), vec![0, 1, 2]);

    queue.deliver_pending();
    client.emit(ClientEvent::StatusUpdated);
    executor.run_until_idle();

    Fixture {
        executor,
        listener,
        session,
        _controller: controller,
    }
}

#[test]
fn test_external_load_settles_full_window() {
    let fixture = playing_b();

    let loaded = fixture.listener.loaded.lock();
    assert_eq!(loaded.len(), 1);
    assert_eq!(indexes(&loaded[0]), vec![0, 1, 2]);

    let updates = fixture.listener.updates.lock();
    // Settle, then the status update that seeds the tracked item.
    assert_eq!(updates.len(), 2);
    assert!(Arc::ptr_eq(&updates[0], &loaded[0]));
    assert_eq!(updates[1].current_item_id, Some(11));
}

#[test]
fn test_advance_emits_finished_then_single_settled_window() {
    let fixture = playing_b();
    fixture.listener.updates.lock().clear();
    let client = fixture.session.client().unwrap();

    client.update_status(|status| {
        status.player_state = PlayerState::Loading;
        status.current_item_id = Some(12);
    });
    fixture.executor.run_until_idle();
    client.update_status(|status| status.player_state = PlayerState::Playing);
    fixture.executor.run_until_idle();

    let updates = fixture.listener.updates.lock();
    assert_eq!(updates.len(), 2);

    assert_eq!(updates[0].player_state, PlayerState::Idle);
    assert_eq!(updates[0].idle_reason, Some(IdleReason::Finished));
    assert_eq!(updates[0].current_item_id, Some(11));

    assert_eq!(updates[1].player_state, PlayerState::Playing);
    assert_eq!(updates[1].current_item_id, Some(12));
    assert_eq!(indexes(&updates[1]), vec![1, 2]);
}

#[test]
fn test_settle_waits_for_every_index_in_any_order() {
    let executor = ManualExecutor::new();
    let listener = Arc::new(Snapshots::default());
    let controller = SessionController::new(
        Arc::new(executor.clone()),
        Arc::new(FixedClock::from_millis(0)),
        listener.clone(),
    );
    let session = Arc::new(LoopbackSession::new("CC1AD845", "Living Room", true));
    controller.set_session(Some(session.clone())).unwrap();
    executor.run_until_idle();

    let client = session.client().unwrap();
    let queue = client.queue();
    client.set_status(Some(MediaStatus {
        player_state: PlayerState::Playing,
        current_item_id: Some(11),
        ..Default::default()
    }));
    queue.reload(vec![item(10, "a"), item(11, "b"), item(12, "c")]);
    executor.run_until_idle();

    for index in [2, 0] {
        queue.deliver(vec![index]);
        executor.run_until_idle();
        assert!(listener.updates.lock().is_empty());
    }

    queue.deliver(vec![1]);
    executor.run_until_idle();

    assert_eq!(listener.loaded.lock().len(), 1);
    let updates = listener.updates.lock();
    assert_eq!(updates.len(), 1);
    assert_eq!(indexes(&updates[0]), vec![0, 1, 2]);
}

#[test]
fn test_single_item_queue_window() {
    let executor = ManualExecutor::new();
    let listener = Arc::new(Snapshots::default());
    let controller = SessionController::new(
        Arc::new(executor.clone()),
        Arc::new(FixedClock::from_millis(0)),
        listener.clone(),
    );
    let session = Arc::new(LoopbackSession::new("CC1AD845", "Kitchen", true));
    controller.set_session(Some(session.clone())).unwrap();
    executor.run_until_idle();

    let client = session.client().unwrap();
    let queue = client.queue();
    client.set_status(Some(MediaStatus {
        player_state: PlayerState::Paused,
        current_item_id: Some(1),
        ..Default::default()
    }));
    queue.reload(vec![item(1, "only")]);
    executor.run_until_idle();

    assert_eq!(queue.pending_fetches(), vec![0]);
}

#[tokio::test]
async fn test_event_bus_listener_publishes_media_updates() {
    let executor = ManualExecutor::new();
    let bus = EventBus::new(16);
    let mut events = bus.subscribe();
    let controller = SessionController::new(
        Arc::new(executor.clone()),
        Arc::new(FixedClock::from_millis(0)),
        Arc::new(EventBusListener::new(bus.clone())),
    );
    let session = Arc::new(LoopbackSession::new("CC1AD845", "Kitchen", true));
    controller.set_session(Some(session.clone())).unwrap();
    executor.run_until_idle();

    let client = session.client().unwrap();
    client.update_status(|status| {
        status.player_state = PlayerState::Buffering;
        status.current_item_id = None;
    });
    executor.run_until_idle();

    match events.recv().await.unwrap() {
        CoreEvent::Media(MediaEvent::Updated { snapshot }) => {
            assert_eq!(snapshot.player_state, PlayerState::Buffering);
            assert_eq!(snapshot.session_id, session.session_id());
        }
        other => panic!("unexpected event: {:?}", other),
    }
}
