//! Move-only release token for maintenance read locks.

use bastion_types::EntityId;
use std::fmt;
use tracing::{debug, warn};

/// Gives a maintenance read lock back when released.
///
/// The hook is consumed by [`release`](Self::release), so it can run at most
/// once. Dropping an unreleased hook does not release the lock; it logs a
/// warning instead, because the lock is now leaked.
pub struct ReleaseHook {
    entity: EntityId,
    action: Option<Box<dyn FnOnce() + Send>>,
}

impl ReleaseHook {
    /// Creates a hook that runs `action` when released.
    pub fn new(entity: EntityId, action: impl FnOnce() + Send + 'static) -> Self {
        Self {
            entity,
            action: Some(Box::new(action)),
        }
    }

    /// The entity whose lock this hook releases.
    pub fn entity(&self) -> &EntityId {
        &self.entity
    }

    /// Runs the release action.
    pub fn release(mut self) {
        if let Some(action) = self.action.take() {
            debug!(entity = %self.entity, "releasing maintenance read lock");
            action();
        }
    }
}

impl fmt::Debug for ReleaseHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReleaseHook")
            .field("entity", &self.entity)
            .field("pending", &self.action.is_some())
            .finish()
    }
}

impl Drop for ReleaseHook {
    fn drop(&mut self) {
        if self.action.is_some() {
            warn!(
                entity = %self.entity,
                "release hook dropped without being released; maintenance read lock leaked"
            );
        }
    }
}
