use crate::browser::RenderingSession;
use tracing::{debug, warn};

/// Owns a rendering session for one task and guarantees it is closed.
///
/// The normal path calls [`SessionGuard::release`]. If the guard is dropped
/// without that (task aborted by the batch deadline, or a panic unwinding
/// through the worker) the close is handed to the runtime instead.
pub struct SessionGuard {
    session: Option<Box<dyn RenderingSession>>,
}

impl SessionGuard {
    pub fn new(session: Box<dyn RenderingSession>) -> Self {
        Self {
            session: Some(session),
        }
    }

    pub fn session(&mut self) -> &mut dyn RenderingSession {
        // Only `release` and `drop` take the session, and both consume the guard.
        self.session
            .as_deref_mut()
            .expect("session is held until the guard is released")
    }

    pub async fn release(mut self) {
        if let Some(mut session) = self.session.take() {
            session.close().await;
        }
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        let Some(mut session) = self.session.take() else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                debug!("Session dropped without release, closing in background");
                handle.spawn(async move {
                    session.close().await;
                });
            }
            Err(_) => warn!("Session dropped outside the runtime, it could not be closed"),
        }
    }
}
