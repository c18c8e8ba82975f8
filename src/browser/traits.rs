use crate::model::SessionError;

/// Condition an element has to satisfy before its text is taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitCondition {
    /// Attached to the DOM.
    Present,
    /// Attached and rendered with a non-empty box.
    Visible,
}

/// One live page, owned by a single worker for the duration of one task.
#[async_trait::async_trait]
pub trait RenderingSession: Send {
    async fn navigate(&mut self, url: &str) -> Result<(), SessionError>;

    /// Looks once for the first element matching `selector` under
    /// `condition`. `Ok(None)` means "not there yet".
    async fn probe(
        &mut self,
        selector: &str,
        condition: WaitCondition,
    ) -> Result<Option<String>, SessionError>;

    /// Releases the underlying resources. Must be safe to call twice.
    async fn close(&mut self);

    /// Whether the DOM can still change after navigation. Static backends
    /// return false so that a miss is final.
    fn is_live(&self) -> bool {
        true
    }
}

#[async_trait::async_trait]
pub trait SessionFactory: Send + Sync {
    async fn open(&self) -> Result<Box<dyn RenderingSession>, SessionError>;
}
