//! Entity references and the fetch protocol.

use crate::error::{ClientError, ClientResult};
use crate::gate::MaintenanceGate;
use crate::release::ReleaseHook;
use crate::error::TransportError;
use crate::transport::{EntityClientEndpoint, EntityTransport, TransportFailure};
use bastion_types::{ClientInstanceIdAllocator, EntityDescriptor, EntityId, EntityVersion};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard, oneshot};
use tracing::{debug, error, info, warn};

type AttachOutcome = Result<Option<EntityClientEndpoint>, TransportFailure>;

/// Turns a raw endpoint into the typed proxy callers work with.
pub trait EntityClientService<T>: Send + Sync {
    fn create(&self, endpoint: EntityClientEndpoint) -> T;
}

impl<T, F> EntityClientService<T> for F
where
    F: Fn(EntityClientEndpoint) -> T + Send + Sync,
{
    fn create(&self, endpoint: EntityClientEndpoint) -> T {
        self(endpoint)
    }
}

/// Handle to one named, versioned entity, producing typed proxies of `T`.
///
/// Every fetched proxy gets its own client instance id so the server can
/// address it individually. Fetches on one reference are serialized, transport
/// round-trip included, even when a caller gives up on a fetch midway.
pub struct EntityReference<T> {
    entity_id: EntityId,
    version: EntityVersion,
    transport: Arc<dyn EntityTransport>,
    gate: Arc<dyn MaintenanceGate>,
    client_service: Arc<dyn EntityClientService<T>>,
    client_instance_ids: ClientInstanceIdAllocator,
    fetch_lock: Arc<Mutex<()>>,
}

impl<T: Send + 'static> EntityReference<T> {
    /// Creates a reference whose entity type name is the Rust type name of `T`.
    pub fn new(
        transport: Arc<dyn EntityTransport>,
        gate: Arc<dyn MaintenanceGate>,
        name: impl Into<String>,
        version: EntityVersion,
        client_service: Arc<dyn EntityClientService<T>>,
    ) -> Self {
        Self::with_entity_id(
            transport,
            gate,
            EntityId::of::<T>(name),
            version,
            client_service,
        )
    }

    /// Creates a reference for an explicitly named entity type.
    pub fn with_entity_id(
        transport: Arc<dyn EntityTransport>,
        gate: Arc<dyn MaintenanceGate>,
        entity_id: EntityId,
        version: EntityVersion,
        client_service: Arc<dyn EntityClientService<T>>,
    ) -> Self {
        Self {
            entity_id,
            version,
            transport,
            gate,
            client_service,
            client_instance_ids: ClientInstanceIdAllocator::new(),
            fetch_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn name(&self) -> &str {
        self.entity_id.name()
    }

    pub fn entity_id(&self) -> &EntityId {
        &self.entity_id
    }

    pub fn version(&self) -> EntityVersion {
        self.version
    }

    /// Fetches a new typed proxy attached to the server-side entity.
    ///
    /// Waits without bound while a maintenance holder owns the entity. On
    /// success the maintenance read lock stays held until the proxy's
    /// endpoint is closed.
    ///
    /// Safe to cancel. If the returned future is dropped while the transport
    /// is still attaching, the attach runs to completion in the background
    /// and its result is given back: an attached endpoint is closed and an
    /// unused release hook is released.
    pub async fn fetch(&self) -> ClientResult<T> {
        let serial = Arc::clone(&self.fetch_lock).lock_owned().await;

        self.gate
            .read_lock(&self.entity_id)
            .await
            .map_err(|source| {
                error!(entity = %self.entity_id, error = %source, "maintenance read lock failed");
                ClientError::LockAcquisition {
                    entity: self.entity_id.clone(),
                    source,
                }
            })?;
        let release = self.release_hook();

        let descriptor = EntityDescriptor::new(
            self.entity_id.clone(),
            self.client_instance_ids.allocate(),
            self.version,
        );
        debug!(descriptor = %descriptor, "fetching entity");

        match self.attach(descriptor.clone(), release, serial).await {
            Ok(Some(endpoint)) => {
                info!(descriptor = %descriptor, "entity fetched");
                Ok(self.client_service.create(endpoint))
            }
            Ok(None) => {
                warn!(descriptor = %descriptor, "entity does not exist");
                Err(ClientError::EntityNotFound {
                    entity: self.entity_id.clone(),
                    version: self.version,
                })
            }
            Err(TransportFailure { error, release }) => {
                release.release();
                error!(descriptor = %descriptor, error = %error, "entity fetch failed");
                Err(ClientError::Transport {
                    entity: self.entity_id.clone(),
                    source: error,
                })
            }
        }
    }

    /// Runs the transport round-trip on its own task so that it survives the
    /// caller dropping `fetch`. The serial guard is held until the
    /// round-trip ends.
    async fn attach(
        &self,
        descriptor: EntityDescriptor,
        release: ReleaseHook,
        serial: OwnedMutexGuard<()>,
    ) -> AttachOutcome {
        let transport = Arc::clone(&self.transport);
        let entity = self.entity_id.clone();
        let (tx, rx) = oneshot::channel();
        tokio::spawn(async move {
            let outcome = transport.fetch_entity(descriptor, release).await;
            if let Err(outcome) = tx.send(outcome) {
                abandon(outcome);
            }
            drop(serial);
        });

        let mut pending = PendingAttach { rx };
        match (&mut pending.rx).await {
            Ok(outcome) => outcome,
            // The attach task panicked; whatever hook it held is gone with it.
            Err(_) => Err(TransportFailure::new(
                TransportError::Disconnected,
                ReleaseHook::new(entity, || {}),
            )),
        }
    }

    fn release_hook(&self) -> ReleaseHook {
        let gate = Arc::clone(&self.gate);
        let entity = self.entity_id.clone();
        ReleaseHook::new(self.entity_id.clone(), move || gate.read_unlock(&entity))
    }
}

/// Receiving end of an in-flight attach. Dropping it before the outcome
/// arrives hands the outcome to [`abandon`] instead.
struct PendingAttach {
    rx: oneshot::Receiver<AttachOutcome>,
}

impl Drop for PendingAttach {
    fn drop(&mut self) {
        self.rx.close();
        if let Ok(outcome) = self.rx.try_recv() {
            abandon(outcome);
        }
    }
}

/// Gives back everything an attach produced for a caller that left.
fn abandon(outcome: AttachOutcome) {
    match outcome {
        Ok(Some(endpoint)) => {
            warn!(descriptor = %endpoint.descriptor(), "fetch abandoned after attach; closing endpoint");
            endpoint.close();
        }
        Ok(None) => {}
        Err(TransportFailure { error, release }) => {
            warn!(entity = %release.entity(), error = %error, "fetch abandoned after transport failure");
            release.release();
        }
    }
}
