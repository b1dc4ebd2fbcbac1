//! Core type definitions for Bastion.
//!
//! This crate defines the identity types shared by the client and server
//! halves of the coordination core:
//! - Entity identity (type name + instance name) and requested version
//! - Per-reference client instance identifiers
//! - Fetch-session descriptors
//! - Service consumer and cluster node identifiers

mod descriptor;
mod ids;

pub use descriptor::EntityDescriptor;
pub use ids::{
    ClientInstanceId, ClientInstanceIdAllocator, ConsumerId, EntityId, EntityVersion, NodeId,
};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    #[error("invalid entity id '{0}': expected '<type>:<name>'")]
    InvalidEntityId(String),

    #[error("client instance ids start at 1, got 0")]
    ZeroClientInstanceId,
}
