//! Playback commands against the session's remote media client.

use std::sync::Arc;

use bridge_traits::cast::{LoadRequest, MediaStatus, RemoteMediaClient, StatusCallback};
use tracing::debug;

use crate::error::{CastError, Result};

/// Thin wrapper over a possibly absent [`RemoteMediaClient`].
///
/// Every command fails with [`CastError::NoActiveSession`] when detached.
/// Callers decide whether that is worth reporting.
#[derive(Clone, Default)]
pub struct MediaClientAdapter {
    client: Option<Arc<dyn RemoteMediaClient>>,
}

impl MediaClientAdapter {
    pub fn new(client: Option<Arc<dyn RemoteMediaClient>>) -> Self {
        Self { client }
    }

    pub fn is_attached(&self) -> bool {
        self.client.is_some()
    }

    pub fn client(&self) -> Result<&Arc<dyn RemoteMediaClient>> {
        self.client.as_ref().ok_or(CastError::NoActiveSession)
    }

    pub fn media_status(&self) -> Option<MediaStatus> {
        self.client.as_ref().and_then(|client| client.media_status())
    }

    pub fn play(&self) -> Result<()> {
        self.client()?.play();
        debug!("play issued");
        Ok(())
    }

    pub fn pause(&self) -> Result<()> {
        self.client()?.pause();
        debug!("pause issued");
        Ok(())
    }

    /// Seek to `position_ms` milliseconds from the start of the item.
    pub fn seek(&self, position_ms: i64) -> Result<()> {
        if position_ms < 0 {
            return Err(CastError::InvalidArgument(format!(
                "seek position must not be negative, got {position_ms}"
            )));
        }
        self.client()?.seek(position_ms);
        debug!(position_ms, "seek issued");
        Ok(())
    }

    pub fn queue_next(&self) -> Result<()> {
        self.client()?.queue_next();
        debug!("queue next issued");
        Ok(())
    }

    /// Start a load. `done` receives the provider's result.
    pub fn load(&self, request: LoadRequest, done: StatusCallback) -> Result<()> {
        self.client()?.load(request, done);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::cast::{ClientListener, MediaQueue, Registration};
    use mockall::mock;

    mock! {
        Client {}

        impl RemoteMediaClient for Client {
            fn media_status(&self) -> Option<MediaStatus>;
            fn media_queue(&self) -> Arc<dyn MediaQueue>;
            fn register_callback(&self, listener: ClientListener) -> Registration;
            fn load(&self, request: LoadRequest, done: StatusCallback);
            fn play(&self);
            fn pause(&self);
            fn seek(&self, position_ms: i64);
            fn queue_next(&self);
        }
    }

    #[test]
    fn test_detached_adapter_reports_no_session() {
        let adapter = MediaClientAdapter::default();

        assert!(!adapter.is_attached());
        assert_eq!(adapter.play(), Err(CastError::NoActiveSession));
        assert_eq!(adapter.pause(), Err(CastError::NoActiveSession));
        assert_eq!(adapter.queue_next(), Err(CastError::NoActiveSession));
        assert_eq!(adapter.seek(1_000), Err(CastError::NoActiveSession));
        assert!(adapter.media_status().is_none());
    }

    #[test]
    fn test_commands_reach_client() {
        let mut client = MockClient::new();
        client.expect_play().times(1).return_const(());
        client.expect_pause().times(1).return_const(());
        client
            .expect_seek()
            .withf(|position| *position == 42_000)
            .times(1)
            .return_const(());
        client.expect_queue_next().times(1).return_const(());

        let adapter = MediaClientAdapter::new(Some(Arc::new(client)));

        adapter.play().unwrap();
        adapter.pause().unwrap();
        adapter.seek(42_000).unwrap();
        adapter.queue_next().unwrap();
    }

    #[test]
    fn test_negative_seek_is_rejected() {
        let mut client = MockClient::new();
        client.expect_seek().never();

        let adapter = MediaClientAdapter::new(Some(Arc::new(client)));

        assert!(matches!(
            adapter.seek(-1),
            Err(CastError::InvalidArgument(_))
        ));
    }
}
