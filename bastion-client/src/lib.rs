//! Client-side entity resolution for Bastion.
//!
//! A client attaches to a server-managed entity through an
//! [`EntityReference`]. Fetching through a reference:
//!
//! 1. takes a shared maintenance lock on the entity ([`MaintenanceGate`]),
//! 2. allocates the next client instance id for the reference,
//! 3. asks the [`EntityTransport`] to attach, handing it a [`ReleaseHook`]
//!    that gives the maintenance lock back,
//! 4. wraps the resulting [`EntityClientEndpoint`] in a typed proxy via the
//!    entity's [`EntityClientService`].
//!
//! The release hook is a move-only token. Whoever holds it is responsible for
//! releasing it exactly once: the reference on a transport failure, the
//! transport on not-found, and the endpoint when it is closed.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use bastion_client::{EntityReference, LocalMaintenanceGate};
//! use bastion_client::transport::mock::MockTransport;
//! use bastion_client::EntityClientEndpoint;
//! use bastion_types::EntityVersion;
//!
//! struct OrderBook(EntityClientEndpoint);
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let reference = EntityReference::<OrderBook>::new(
//!     Arc::new(MockTransport::new()),
//!     Arc::new(LocalMaintenanceGate::new()),
//!     "book-7",
//!     EntityVersion::new(1),
//!     Arc::new(OrderBook),
//! );
//! let book = reference.fetch().await.unwrap();
//! assert_eq!(book.0.descriptor().client_instance_id().get(), 1);
//! book.0.close();
//! # });
//! ```

mod error;
pub mod gate;
mod reference;
mod release;
pub mod transport;

pub use error::{ClientError, ClientResult, GateError, TransportError};
pub use gate::{LocalMaintenanceGate, MaintenanceGate};
pub use reference::{EntityClientService, EntityReference};
pub use release::ReleaseHook;
pub use transport::{EndpointChannel, EntityClientEndpoint, EntityTransport, TransportFailure};
