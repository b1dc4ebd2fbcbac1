//! Build-once service registry for one consumer.

use super::{
    AnyService, BuiltInServiceProvider, ManagedEntity, ServiceConfiguration, ServiceProvider,
    ServiceRequest, ServiceType,
};
use crate::error::{RegistryError, RegistryResult};
use bastion_types::ConsumerId;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use tracing::{debug, error};

type ProviderMap<P> = HashMap<ServiceType, Vec<Arc<P>>>;

/// Resolves services for one consumer from built-in and external providers.
///
/// The provider indices are built at construction and never change. The only
/// later mutation is a single bind of the owning entity; until it happens
/// (and forever, for synthetic consumers) built-in providers are not
/// consulted.
pub struct ServiceRegistry {
    consumer_id: ConsumerId,
    providers: ProviderMap<dyn ServiceProvider>,
    built_in_providers: ProviderMap<dyn BuiltInServiceProvider>,
    owning_entity: OnceLock<Arc<dyn ManagedEntity>>,
}

impl ServiceRegistry {
    pub fn new(
        consumer_id: ConsumerId,
        providers: Vec<Arc<dyn ServiceProvider>>,
        built_in_providers: Vec<Arc<dyn BuiltInServiceProvider>>,
    ) -> Self {
        Self {
            consumer_id,
            providers: index(providers, |p| p.provided_service_types()),
            built_in_providers: index(built_in_providers, |p| p.provided_service_types()),
            owning_entity: OnceLock::new(),
        }
    }

    pub fn consumer_id(&self) -> ConsumerId {
        self.consumer_id
    }

    pub fn owning_entity(&self) -> Option<&Arc<dyn ManagedEntity>> {
        self.owning_entity.get()
    }

    /// Binds the entity that owns this registry. Allowed once.
    pub fn set_owning_entity(&self, entity: Arc<dyn ManagedEntity>) -> RegistryResult<()> {
        let entity_id = entity.entity_id().clone();
        self.owning_entity.set(entity).map_err(|_| {
            let bound = self
                .owning_entity
                .get()
                .map(|e| e.entity_id().clone())
                .unwrap_or(entity_id);
            RegistryError::AlreadyBound {
                consumer_id: self.consumer_id,
                bound,
            }
        })?;
        debug!(consumer = %self.consumer_id, "service registry bound to owning entity");
        Ok(())
    }

    /// Resolves the service `config` asks for.
    ///
    /// Returns `Ok(None)` when no provider serves it and
    /// [`RegistryError::Conflict`] when more than one does, whether within
    /// one provider group or across the built-in and external groups.
    pub fn get_service<C: ServiceConfiguration>(
        &self,
        config: &C,
    ) -> RegistryResult<Option<Arc<C::Service>>> {
        let service_type = ServiceConfiguration::service_type(config);
        let built_in = match self.owning_entity.get() {
            Some(owner) => self.built_in_service(service_type, owner, config)?,
            None => None,
        };
        let external = self.external_service(service_type, config)?;

        let resolved = match (built_in, external) {
            (Some((a, _)), Some((b, _))) => return Err(self.conflict(service_type, vec![a, b])),
            (Some(found), None) | (None, Some(found)) => found,
            (None, None) => {
                debug!(consumer = %self.consumer_id, service = %service_type, "no provider for service");
                return Ok(None);
            }
        };

        let (provider, service) = resolved;
        service
            .downcast::<C::Service>()
            .map(Some)
            .map_err(|_| RegistryError::ServiceTypeMismatch {
                service_type,
                provider,
            })
    }

    fn built_in_service(
        &self,
        service_type: ServiceType,
        owner: &Arc<dyn ManagedEntity>,
        request: &dyn ServiceRequest,
    ) -> RegistryResult<Option<(String, AnyService)>> {
        let Some(providers) = self.built_in_providers.get(&service_type) else {
            return Ok(None);
        };
        let found = providers.iter().filter_map(|p| {
            p.get_service(self.consumer_id, owner, request)
                .map(|s| (p.name().to_string(), s))
        });
        self.single(service_type, found)
    }

    fn external_service(
        &self,
        service_type: ServiceType,
        request: &dyn ServiceRequest,
    ) -> RegistryResult<Option<(String, AnyService)>> {
        let Some(providers) = self.providers.get(&service_type) else {
            return Ok(None);
        };
        let found = providers.iter().filter_map(|p| {
            p.get_service(self.consumer_id, request)
                .map(|s| (p.name().to_string(), s))
        });
        self.single(service_type, found)
    }

    /// Enforces the at-most-one-match rule within a provider group. Every
    /// provider is still invoked so the conflict names all of them.
    fn single(
        &self,
        service_type: ServiceType,
        found: impl Iterator<Item = (String, AnyService)>,
    ) -> RegistryResult<Option<(String, AnyService)>> {
        let mut found: Vec<_> = found.collect();
        if found.len() > 1 {
            let names = found.into_iter().map(|(name, _)| name).collect();
            return Err(self.conflict(service_type, names));
        }
        Ok(found.pop())
    }

    fn conflict(&self, service_type: ServiceType, providers: Vec<String>) -> RegistryError {
        error!(
            consumer = %self.consumer_id,
            service = %service_type,
            providers = ?providers,
            "service resolved by more than one provider"
        );
        RegistryError::Conflict {
            service_type,
            consumer_id: self.consumer_id,
            providers,
        }
    }
}

/// Indexes providers by every service type they declare. A provider that
/// declares the same type twice is indexed once.
fn index<P: ?Sized>(
    providers: Vec<Arc<P>>,
    declared: impl Fn(&P) -> Vec<ServiceType>,
) -> ProviderMap<P> {
    let mut map: ProviderMap<P> = HashMap::new();
    for provider in providers {
        for service_type in declared(provider.as_ref()) {
            let list = map.entry(service_type).or_default();
            if !list.iter().any(|p| Arc::ptr_eq(p, &provider)) {
                list.push(Arc::clone(&provider));
            }
        }
    }
    map
}
