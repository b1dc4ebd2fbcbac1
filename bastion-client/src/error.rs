//! Error types for the client layer.

use bastion_types::{EntityDescriptor, EntityId, EntityVersion};
use thiserror::Error;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors surfaced to callers of the client API.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The maintenance gate refused the shared lock. Nothing is held.
    #[error("failed to acquire maintenance read lock for {entity}: {source}")]
    LockAcquisition {
        entity: EntityId,
        #[source]
        source: GateError,
    },

    /// The transport reported that no such entity exists.
    #[error("entity {entity} ({version}) does not exist")]
    EntityNotFound {
        entity: EntityId,
        version: EntityVersion,
    },

    /// The transport failed while fetching or invoking.
    #[error("transport error for {entity}: {source}")]
    Transport {
        entity: EntityId,
        #[source]
        source: TransportError,
    },

    /// The endpoint was already closed.
    #[error("endpoint {descriptor} is closed")]
    EndpointClosed { descriptor: EntityDescriptor },
}

impl ClientError {
    /// The entity this error concerns.
    pub fn entity(&self) -> &EntityId {
        match self {
            Self::LockAcquisition { entity, .. }
            | Self::EntityNotFound { entity, .. }
            | Self::Transport { entity, .. } => entity,
            Self::EndpointClosed { descriptor } => descriptor.entity_id(),
        }
    }
}

/// Errors from a [`MaintenanceGate`](crate::MaintenanceGate).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GateError {
    /// The gate was shut down; no further locks are granted.
    #[error("maintenance gate is closed")]
    Closed,

    /// The backing lock service could not be reached.
    #[error("maintenance lock service unavailable: {0}")]
    Unavailable(String),
}

/// Errors from an [`EntityTransport`](crate::EntityTransport) or
/// [`EndpointChannel`](crate::EndpointChannel).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// No server could be reached.
    #[error("server unreachable: {0}")]
    Unreachable(String),

    /// The server refused the request.
    #[error("server rejected request: {0}")]
    Rejected(String),

    /// The connection dropped mid-request.
    #[error("connection lost")]
    Disconnected,
}
