//! Fetch-session descriptors.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{ClientInstanceId, EntityId, EntityVersion};

/// Identifies exactly one fetch session against a server-side entity.
///
/// The server routes every later message for the attachment by this value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityDescriptor {
    entity_id: EntityId,
    client_instance_id: ClientInstanceId,
    version: EntityVersion,
}

impl EntityDescriptor {
    #[must_use]
    pub fn new(
        entity_id: EntityId,
        client_instance_id: ClientInstanceId,
        version: EntityVersion,
    ) -> Self {
        Self {
            entity_id,
            client_instance_id,
            version,
        }
    }

    #[must_use]
    pub fn entity_id(&self) -> &EntityId {
        &self.entity_id
    }

    #[must_use]
    pub fn client_instance_id(&self) -> ClientInstanceId {
        self.client_instance_id
    }

    #[must_use]
    pub fn version(&self) -> EntityVersion {
        self.version
    }
}

impl fmt::Display for EntityDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}#{} ({})",
            self.entity_id, self.client_instance_id, self.version
        )
    }
}
