//! Per-invocation acknowledgment state machine.
//!
//! A capture moves through `PENDING → RECEIVED → {COMPLETED | FAILED} →
//! RETIRED`. Whatever order dispatch signals arrive in, the caller sees:
//!
//! - the received callback exactly once, and always before the terminal one;
//! - exactly one of the result or error callbacks.
//!
//! A second terminal signal is rejected with
//! [`CaptureError::AlreadyTerminated`] and delivers nothing.
//!
//! Callbacks run on whichever task delivers the signal. They must not call
//! back into the capture that invoked them.

mod ack_waiter;
mod active;
mod passive;

pub use ack_waiter::ActivePassiveAckWaiter;
pub use active::ActiveResultCapture;
pub use passive::PassiveResultCapture;

use crate::config::CaptureConfig;
use crate::error::{CaptureError, ServerError};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::trace;

/// Late-bound source of the ack waiter for an invocation.
pub type AckWaiterSupplier = Box<dyn Fn() -> Arc<ActivePassiveAckWaiter> + Send + Sync>;

type ReceivedCallback = Box<dyn FnOnce() + Send>;
type ResultCallback = Box<dyn FnOnce(Option<Vec<u8>>) + Send>;
type ErrorCallback = Box<dyn FnOnce(ServerError) + Send>;
type MessageCallback = Box<dyn Fn(Vec<u8>) + Send + Sync>;

/// The surface server-side dispatch drives for one invocation.
#[async_trait]
pub trait ResultCapture: Send + Sync {
    /// Supplies the passive ack waiter once replication has been dispatched.
    fn set_wait_for(&self, supplier: AckWaiterSupplier);

    /// Waits until every passive replica has received the invocation.
    async fn wait_for_received(&self);

    /// Signals that the server received the invocation. Idempotent.
    fn received(&self);

    /// Completes the invocation without a value.
    async fn complete(&self) -> Result<(), CaptureError>;

    /// Completes the invocation with a value.
    async fn complete_with(&self, value: Vec<u8>) -> Result<(), CaptureError>;

    /// Fails the invocation.
    async fn failure(&self, error: ServerError) -> Result<(), CaptureError>;

    /// Delivers an intermediate chunk. Does not change receipt or terminal
    /// state. Chunks keep flowing while a terminal signal waits on passive
    /// replicas and are dropped once the terminal callback has been
    /// delivered.
    fn message(&self, chunk: Vec<u8>);

    /// Resolves once no further messages for this invocation will arrive.
    async fn retired(&self);
}

/// Which replica hosts a capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplicaRole {
    Active,
    Passive,
}

impl ReplicaRole {
    /// Builds the capture variant for this role.
    pub fn new_capture(
        self,
        callbacks: CaptureCallbacks,
        config: &CaptureConfig,
    ) -> Arc<dyn ResultCapture> {
        match self {
            Self::Active => Arc::new(ActiveResultCapture::new(callbacks, config.clone())),
            Self::Passive => Arc::new(PassiveResultCapture::new(callbacks)),
        }
    }
}

/// Caller callbacks for one invocation. Every callback is optional.
#[derive(Default)]
pub struct CaptureCallbacks {
    received: Option<ReceivedCallback>,
    result: Option<ResultCallback>,
    error: Option<ErrorCallback>,
    message: Option<MessageCallback>,
}

impl CaptureCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_received(mut self, f: impl FnOnce() + Send + 'static) -> Self {
        self.received = Some(Box::new(f));
        self
    }

    pub fn on_result(mut self, f: impl FnOnce(Option<Vec<u8>>) + Send + 'static) -> Self {
        self.result = Some(Box::new(f));
        self
    }

    pub fn on_error(mut self, f: impl FnOnce(ServerError) + Send + 'static) -> Self {
        self.error = Some(Box::new(f));
        self
    }

    pub fn on_message(mut self, f: impl Fn(Vec<u8>) + Send + Sync + 'static) -> Self {
        self.message = Some(Box::new(f));
        self
    }
}

/// State shared by both capture variants.
struct CaptureCore {
    // Guards the received callback and doubles as the set-once flag. Held
    // while the callback runs so a concurrent terminal delivery waits for it.
    received: Mutex<(bool, Option<ReceivedCallback>)>,
    terminated: AtomicBool,
    delivered: AtomicBool,
    result: Mutex<Option<ResultCallback>>,
    error: Mutex<Option<ErrorCallback>>,
    message: Option<MessageCallback>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl CaptureCore {
    fn new(callbacks: CaptureCallbacks) -> Self {
        Self {
            received: Mutex::new((false, callbacks.received)),
            terminated: AtomicBool::new(false),
            delivered: AtomicBool::new(false),
            result: Mutex::new(callbacks.result),
            error: Mutex::new(callbacks.error),
            message: callbacks.message,
        }
    }

    /// Fires the received callback if it has not fired yet.
    fn received(&self) {
        let mut slot = lock(&self.received);
        if slot.0 {
            return;
        }
        slot.0 = true;
        trace!("invocation received");
        if let Some(callback) = slot.1.take() {
            callback();
        }
    }

    fn is_received(&self) -> bool {
        lock(&self.received).0
    }

    /// Claims the single terminal transition.
    fn begin_terminal(&self) -> Result<(), CaptureError> {
        self.terminated
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map(|_| ())
            .map_err(|_| CaptureError::AlreadyTerminated)
    }

    fn is_terminated(&self) -> bool {
        self.terminated.load(Ordering::SeqCst)
    }

    fn deliver_result(&self, value: Option<Vec<u8>>) {
        self.received();
        self.delivered.store(true, Ordering::SeqCst);
        trace!(has_value = value.is_some(), "invocation completed");
        let callback = lock(&self.result).take();
        if let Some(callback) = callback {
            callback(value);
        }
    }

    fn deliver_error(&self, error: ServerError) {
        self.received();
        self.delivered.store(true, Ordering::SeqCst);
        trace!(error = %error, "invocation failed");
        let callback = lock(&self.error).take();
        if let Some(callback) = callback {
            callback(error);
        }
    }

    fn message(&self, chunk: Vec<u8>) {
        if self.delivered.load(Ordering::SeqCst) {
            trace!(len = chunk.len(), "dropping message after terminal result");
            return;
        }
        if let Some(callback) = &self.message {
            callback(chunk);
        }
    }
}
