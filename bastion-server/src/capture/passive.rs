use super::{AckWaiterSupplier, CaptureCallbacks, CaptureCore, ResultCapture};
use crate::error::{CaptureError, ServerError};
use async_trait::async_trait;

/// Capture for replicas with nothing downstream to wait on.
///
/// Completion is delivered immediately and the capture counts as retired from
/// the start.
pub struct PassiveResultCapture {
    core: CaptureCore,
}

impl PassiveResultCapture {
    pub fn new(callbacks: CaptureCallbacks) -> Self {
        Self {
            core: CaptureCore::new(callbacks),
        }
    }

    pub fn is_received(&self) -> bool {
        self.core.is_received()
    }

    pub fn is_terminated(&self) -> bool {
        self.core.is_terminated()
    }
}

#[async_trait]
impl ResultCapture for PassiveResultCapture {
    fn set_wait_for(&self, _supplier: AckWaiterSupplier) {}

    async fn wait_for_received(&self) {}

    fn received(&self) {
        self.core.received();
    }

    async fn complete(&self) -> Result<(), CaptureError> {
        self.core.begin_terminal()?;
        self.core.deliver_result(None);
        Ok(())
    }

    async fn complete_with(&self, value: Vec<u8>) -> Result<(), CaptureError> {
        self.core.begin_terminal()?;
        self.core.deliver_result(Some(value));
        Ok(())
    }

    async fn failure(&self, error: ServerError) -> Result<(), CaptureError> {
        self.core.begin_terminal()?;
        self.core.deliver_error(error);
        Ok(())
    }

    fn message(&self, chunk: Vec<u8>) {
        self.core.message(chunk);
    }

    async fn retired(&self) {}
}
