//! Server-side coordination core for Bastion.
//!
//! Two mechanisms live here:
//!
//! - **Result capture**: every state-changing invocation gets a
//!   [`ResultCapture`] that turns raw receipt, completion and failure signals
//!   from dispatch into ordered, exactly-once caller callbacks. On the active
//!   replica the terminal callback additionally waits until every passive
//!   replica has applied the change ([`ActivePassiveAckWaiter`]).
//! - **Service resolution**: each consumer owns a [`ServiceRegistry`] built
//!   once from built-in and external providers. A request must resolve to at
//!   most one provider; anything else is a typed [`RegistryError`].

pub mod capture;
pub mod config;
mod error;
pub mod services;

pub use capture::{
    AckWaiterSupplier, ActivePassiveAckWaiter, ActiveResultCapture, CaptureCallbacks,
    PassiveResultCapture, ReplicaRole, ResultCapture,
};
pub use config::{CaptureConfig, ServerConfig};
pub use error::{CaptureError, ConfigError, RegistryError, RegistryResult, ServerError};
pub use services::{
    BuiltInServiceProvider, ManagedEntity, ServiceConfiguration, ServiceProvider,
    ServiceRegistry, ServiceRequest, ServiceType,
};
