//! Error types for the server layer.

use crate::services::ServiceType;
use bastion_types::{ConsumerId, EntityId};
use std::path::PathBuf;
use thiserror::Error;

/// Failure delivered to a caller through a result capture's error callback.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ServerError {
    #[error("entity {entity} not found on server")]
    EntityNotFound { entity: EntityId },

    #[error("entity {entity} is busy")]
    EntityBusy { entity: EntityId },

    #[error("invocation rejected: {reason}")]
    Rejected { reason: String },

    /// Passive replicas did not confirm the change in time. The change may
    /// still be applied; the caller is not told it succeeded.
    #[error("passive replicas did not acknowledge within {timeout_ms}ms")]
    PassiveAckTimeout { timeout_ms: u64 },

    #[error("internal server error: {message}")]
    Internal { message: String },
}

/// Misuse of a result capture by the dispatching layer.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum CaptureError {
    /// A terminal signal was already delivered; this one was dropped.
    #[error("result capture already delivered its terminal result")]
    AlreadyTerminated,
}

/// Result type for service registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Errors from service resolution.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// More than one provider produced the requested service.
    #[error("service {service_type} for consumer {consumer_id} resolved by several providers: {providers:?}")]
    Conflict {
        service_type: ServiceType,
        consumer_id: ConsumerId,
        providers: Vec<String>,
    },

    /// The owning entity was already bound.
    #[error("registry for consumer {consumer_id} is already bound to {bound}")]
    AlreadyBound {
        consumer_id: ConsumerId,
        bound: EntityId,
    },

    /// A provider returned a value that is not the requested service type.
    #[error("provider '{provider}' returned the wrong type for service {service_type}")]
    ServiceTypeMismatch {
        service_type: ServiceType,
        provider: String,
    },
}

/// Errors loading a [`ServerConfig`](crate::ServerConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}
