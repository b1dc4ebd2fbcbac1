//! Transport layer abstraction.
//!
//! The transport locates and attaches to a server-side entity instance. It
//! never sees the maintenance gate directly; it only receives the
//! [`ReleaseHook`] for the lock the reference took, and must either hand it
//! back on failure, release it on not-found, or embed it in the endpoint it
//! returns.

use crate::error::{ClientError, ClientResult, TransportError};
use crate::release::ReleaseHook;
use async_trait::async_trait;
use bastion_types::EntityDescriptor;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

/// A failed fetch. Carries the unused release hook back to the caller, who is
/// responsible for releasing it.
#[derive(Debug)]
pub struct TransportFailure {
    pub error: TransportError,
    pub release: ReleaseHook,
}

impl TransportFailure {
    pub fn new(error: TransportError, release: ReleaseHook) -> Self {
        Self { error, release }
    }
}

/// Locates and attaches to server-side entities.
#[async_trait]
pub trait EntityTransport: Send + Sync {
    /// Attaches to the entity described by `descriptor`.
    ///
    /// - `Ok(Some(endpoint))`: the endpoint owns `release` and releases it
    ///   when closed.
    /// - `Ok(None)`: the entity does not exist. The transport must have
    ///   released `release` itself before returning.
    /// - `Err(failure)`: `release` has not run and is returned inside the
    ///   failure.
    async fn fetch_entity(
        &self,
        descriptor: EntityDescriptor,
        release: ReleaseHook,
    ) -> Result<Option<EntityClientEndpoint>, TransportFailure>;
}

/// Request channel to one attached server-side entity instance.
#[async_trait]
pub trait EndpointChannel: Send + Sync {
    /// Sends an invocation and waits for its response bytes.
    async fn invoke(
        &self,
        descriptor: &EntityDescriptor,
        payload: Vec<u8>,
    ) -> Result<Vec<u8>, TransportError>;
}

/// Client-side end of one fetch session.
///
/// Owns the maintenance release hook for the session; [`close`](Self::close)
/// releases it exactly once.
pub struct EntityClientEndpoint {
    descriptor: EntityDescriptor,
    channel: Arc<dyn EndpointChannel>,
    release: Mutex<Option<ReleaseHook>>,
}

impl EntityClientEndpoint {
    pub fn new(
        descriptor: EntityDescriptor,
        channel: Arc<dyn EndpointChannel>,
        release: ReleaseHook,
    ) -> Self {
        Self {
            descriptor,
            channel,
            release: Mutex::new(Some(release)),
        }
    }

    /// The session this endpoint belongs to.
    pub fn descriptor(&self) -> &EntityDescriptor {
        &self.descriptor
    }

    pub fn is_closed(&self) -> bool {
        self.release
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }

    /// Sends an invocation to the server-side entity.
    pub async fn invoke(&self, payload: Vec<u8>) -> ClientResult<Vec<u8>> {
        if self.is_closed() {
            return Err(ClientError::EndpointClosed {
                descriptor: self.descriptor.clone(),
            });
        }
        self.channel
            .invoke(&self.descriptor, payload)
            .await
            .map_err(|source| ClientError::Transport {
                entity: self.descriptor.entity_id().clone(),
                source,
            })
    }

    /// Closes the endpoint and releases its maintenance lock.
    ///
    /// Returns `true` for the call that actually closed it; later calls are
    /// no-ops and return `false`.
    pub fn close(&self) -> bool {
        let hook = self
            .release
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match hook {
            Some(hook) => {
                debug!(descriptor = %self.descriptor, "closing entity endpoint");
                hook.release();
                true
            }
            None => false,
        }
    }
}

impl fmt::Debug for EntityClientEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityClientEndpoint")
            .field("descriptor", &self.descriptor)
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// A mock transport for testing.
pub mod mock {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// What the next fetch should do.
    #[derive(Debug, Clone)]
    pub enum MockOutcome {
        Attach,
        NotFound,
        Fail(TransportError),
    }

    /// Channel that answers every invocation with its own payload.
    #[derive(Debug, Default)]
    pub struct EchoChannel;

    #[async_trait]
    impl EndpointChannel for EchoChannel {
        async fn invoke(
            &self,
            _descriptor: &EntityDescriptor,
            payload: Vec<u8>,
        ) -> Result<Vec<u8>, TransportError> {
            Ok(payload)
        }
    }

    /// Transport that follows a scripted list of outcomes, attaching by
    /// default once the script runs out.
    #[derive(Debug, Default)]
    pub struct MockTransport {
        script: Mutex<VecDeque<MockOutcome>>,
        seen: Mutex<Vec<EntityDescriptor>>,
        latency: Option<Duration>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl MockTransport {
        pub fn new() -> Self {
            Self::default()
        }

        /// Delays every fetch by `latency`.
        pub fn with_latency(mut self, latency: Duration) -> Self {
            self.latency = Some(latency);
            self
        }

        /// Queues an outcome for a future fetch.
        pub fn push_outcome(&self, outcome: MockOutcome) {
            self.script.lock().unwrap_or_else(PoisonError::into_inner).push_back(outcome);
        }

        /// Descriptors of every fetch so far, in arrival order.
        pub fn descriptors(&self) -> Vec<EntityDescriptor> {
            self.seen.lock().unwrap_or_else(PoisonError::into_inner).clone()
        }

        /// Highest number of fetches that were in progress at once.
        pub fn max_in_flight(&self) -> usize {
            self.max_in_flight.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl EntityTransport for MockTransport {
        async fn fetch_entity(
            &self,
            descriptor: EntityDescriptor,
            release: ReleaseHook,
        ) -> Result<Option<EntityClientEndpoint>, TransportFailure> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            self.seen.lock().unwrap_or_else(PoisonError::into_inner).push(descriptor.clone());
            if let Some(latency) = self.latency {
                tokio::time::sleep(latency).await;
            }
            let outcome = self
                .script
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .pop_front()
                .unwrap_or(MockOutcome::Attach);
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            match outcome {
                MockOutcome::Attach => Ok(Some(EntityClientEndpoint::new(
                    descriptor,
                    Arc::new(EchoChannel),
                    release,
                ))),
                MockOutcome::NotFound => {
                    release.release();
                    Ok(None)
                }
                MockOutcome::Fail(error) => Err(TransportFailure::new(error, release)),
            }
        }
    }
}
