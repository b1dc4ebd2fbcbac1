//! Service providers and per-consumer service resolution.
//!
//! A service is identified by a [`ServiceType`] tag derived from its Rust
//! type. Consumers ask for a service with a [`ServiceConfiguration`];
//! providers see the request type-erased as a [`ServiceRequest`] and may
//! downcast it to the concrete configuration they understand.

mod registry;

pub use registry::ServiceRegistry;

use bastion_types::{ConsumerId, EntityId};
use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

/// A resolved service, type-erased.
pub type AnyService = Arc<dyn Any + Send + Sync>;

/// Tag naming a service type.
#[derive(Clone, Copy)]
pub struct ServiceType {
    id: TypeId,
    name: &'static str,
}

impl ServiceType {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for ServiceType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ServiceType {}

impl std::hash::Hash for ServiceType {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ServiceType({})", self.name)
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// A typed request for a service.
pub trait ServiceConfiguration: Send + Sync + 'static {
    /// The service this configuration asks for.
    type Service: Send + Sync + 'static;

    fn service_type(&self) -> ServiceType {
        ServiceType::of::<Self::Service>()
    }
}

/// A service request as providers see it.
pub trait ServiceRequest: Send + Sync {
    fn requested_type(&self) -> ServiceType;

    fn as_any(&self) -> &dyn Any;
}

impl<C: ServiceConfiguration> ServiceRequest for C {
    fn requested_type(&self) -> ServiceType {
        ServiceConfiguration::service_type(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Server-side entity instance that owns a service registry.
pub trait ManagedEntity: Send + Sync {
    fn entity_id(&self) -> &EntityId;

    fn consumer_id(&self) -> ConsumerId;
}

/// Externally registered provider, independent of any entity.
pub trait ServiceProvider: Send + Sync {
    fn name(&self) -> &str;

    fn provided_service_types(&self) -> Vec<ServiceType>;

    /// Returns the service for `consumer_id`, or `None` if this provider
    /// does not serve the request.
    fn get_service(
        &self,
        consumer_id: ConsumerId,
        request: &dyn ServiceRequest,
    ) -> Option<AnyService>;
}

/// Provider supplied by the platform itself, bound to the owning entity.
pub trait BuiltInServiceProvider: Send + Sync {
    fn name(&self) -> &str;

    fn provided_service_types(&self) -> Vec<ServiceType>;

    fn get_service(
        &self,
        consumer_id: ConsumerId,
        owner: &Arc<dyn ManagedEntity>,
        request: &dyn ServiceRequest,
    ) -> Option<AnyService>;
}
