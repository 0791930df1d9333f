//! Custom-namespace message channel over the active session.

use std::sync::Arc;

use bridge_traits::cast::{CastSession, MessageListener, Registration};
use tracing::{debug, warn};

use crate::error::{CastError, Result};

/// Stateless pass-through keyed by namespace.
#[derive(Clone, Default)]
pub struct MessageChannel {
    session: Option<Arc<dyn CastSession>>,
}

impl MessageChannel {
    pub fn new(session: Option<Arc<dyn CastSession>>) -> Self {
        Self { session }
    }

    fn session(&self) -> Result<&Arc<dyn CastSession>> {
        self.session.as_ref().ok_or(CastError::NoActiveSession)
    }

    /// Send `message` on `namespace`.
    ///
    /// `done` is invoked exactly once: immediately when there is no session
    /// or the namespace is empty, otherwise with the provider's result.
    pub fn send<F>(&self, namespace: &str, message: &str, done: F)
    where
        F: FnOnce(Result<()>) + Send + 'static,
    {
        let session = match validate_namespace(namespace).and_then(|_| self.session()) {
            Ok(session) => session,
            Err(err) => return done(Err(err)),
        };

        debug!(namespace, bytes = message.len(), "Sending receiver message");
        session.send_message(
            namespace,
            message,
            Box::new(move |status| {
                if status.is_success() {
                    done(Ok(()))
                } else {
                    warn!(code = status.code, "Receiver message rejected");
                    done(Err(CastError::provider(status)))
                }
            }),
        );
    }

    /// Route inbound traffic on `namespace` to `listener`.
    pub fn listen(&self, namespace: &str, listener: MessageListener) -> Result<Registration> {
        validate_namespace(namespace)?;
        let registration = self
            .session()?
            .set_message_received_callback(namespace, listener)?;
        debug!(namespace, "Listening for receiver messages");
        Ok(registration)
    }
}

fn validate_namespace(namespace: &str) -> Result<()> {
    if namespace.trim().is_empty() {
        return Err(CastError::InvalidArgument(
            "namespace is required".to_string(),
        ));
    }
    Ok(())
}
