use super::{
    AckWaiterSupplier, ActivePassiveAckWaiter, CaptureCallbacks, CaptureCore, ResultCapture,
};
use crate::config::CaptureConfig;
use crate::error::{CaptureError, ServerError};
use async_trait::async_trait;
use std::sync::{Arc, OnceLock};
use tokio::sync::watch;
use tracing::{debug, warn};

/// Capture hosted on the active replica.
///
/// The terminal callback does not fire until every passive replica tracked by
/// the ack waiter has durably applied the invocation, so a caller is never
/// told an invocation succeeded while no passive copy holds it. If
/// [`CaptureConfig::passive_ack_timeout_ms`] elapses first, the caller gets
/// [`ServerError::PassiveAckTimeout`] instead of the result.
///
/// If the future of a terminal call is dropped while it waits on passives,
/// the caller gets [`ServerError::Internal`] and the capture retires, so
/// the invocation still ends with exactly one terminal callback.
pub struct ActiveResultCapture {
    core: CaptureCore,
    config: CaptureConfig,
    wait_for: OnceLock<AckWaiterSupplier>,
    retired: watch::Sender<bool>,
}

impl ActiveResultCapture {
    pub fn new(callbacks: CaptureCallbacks, config: CaptureConfig) -> Self {
        let (retired, _) = watch::channel(false);
        Self {
            core: CaptureCore::new(callbacks),
            config,
            wait_for: OnceLock::new(),
            retired,
        }
    }

    pub fn is_received(&self) -> bool {
        self.core.is_received()
    }

    pub fn is_terminated(&self) -> bool {
        self.core.is_terminated()
    }

    pub fn is_retired(&self) -> bool {
        *self.retired.borrow()
    }

    fn waiter(&self) -> Option<Arc<ActivePassiveAckWaiter>> {
        self.wait_for.get().map(|supplier| supplier())
    }

    /// Waits for passive completion, bounded by the configured timeout.
    async fn await_passives(&self) -> Result<(), ServerError> {
        let Some(waiter) = self.waiter() else {
            debug!("no ack waiter supplied; nothing downstream to wait on");
            return Ok(());
        };
        let Some(timeout) = self.config.passive_ack_timeout() else {
            waiter.wait_for_completed().await;
            return Ok(());
        };
        tokio::time::timeout(timeout, waiter.wait_for_completed())
            .await
            .map_err(|_| {
                warn!(
                    pending = ?waiter.pending_passives(),
                    timeout_ms = timeout.as_millis() as u64,
                    "passive acknowledgment timed out"
                );
                ServerError::PassiveAckTimeout {
                    timeout_ms: timeout.as_millis() as u64,
                }
            })
    }

    fn retire(&self) {
        self.retired.send_replace(true);
    }
}

#[async_trait]
impl ResultCapture for ActiveResultCapture {
    fn set_wait_for(&self, supplier: AckWaiterSupplier) {
        if self.wait_for.set(supplier).is_err() {
            warn!("ack waiter supplier already set; keeping the first");
        }
    }

    async fn wait_for_received(&self) {
        if let Some(waiter) = self.waiter() {
            waiter.wait_for_received().await;
        }
    }

    fn received(&self) {
        self.core.received();
    }

    async fn complete(&self) -> Result<(), CaptureError> {
        self.finish(Ok(None)).await
    }

    async fn complete_with(&self, value: Vec<u8>) -> Result<(), CaptureError> {
        self.finish(Ok(Some(value))).await
    }

    async fn failure(&self, error: ServerError) -> Result<(), CaptureError> {
        self.finish(Err(error)).await
    }

    fn message(&self, chunk: Vec<u8>) {
        self.core.message(chunk);
    }

    async fn retired(&self) {
        let mut rx = self.retired.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        let _ = rx.wait_for(|retired| *retired).await;
    }
}

impl ActiveResultCapture {
    async fn finish(&self, outcome: Result<Option<Vec<u8>>, ServerError>) -> Result<(), CaptureError> {
        self.core.begin_terminal()?;
        self.core.received();
        let mut abandoned = AbandonedDelivery { capture: self, armed: true };
        let acked = self.await_passives().await;
        abandoned.armed = false;
        match (outcome, acked) {
            (Ok(value), Ok(())) => self.core.deliver_result(value),
            (Ok(_), Err(timeout)) => self.core.deliver_error(timeout),
            (Err(error), _) => self.core.deliver_error(error),
        }
        self.retire();
        Ok(())
    }
}

/// Finishes a terminal transition whose future was dropped mid-wait.
struct AbandonedDelivery<'a> {
    capture: &'a ActiveResultCapture,
    armed: bool,
}

impl Drop for AbandonedDelivery<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        warn!("terminal signal abandoned while waiting on passive replicas");
        self.capture.core.deliver_error(ServerError::Internal {
            message: "terminal signal abandoned before passive acknowledgment".into(),
        });
        self.capture.retire();
    }
}
