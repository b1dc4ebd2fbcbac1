//! Maintenance-mode gating for entity fetches.
//!
//! Client fetches hold a shared lock on the entity for as long as the fetched
//! endpoint is open. A maintenance operation holds the exclusive lock and
//! keeps new fetches of that entity waiting until it finishes.

use crate::error::GateError;
use async_trait::async_trait;
use bastion_types::EntityId;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::Notify;
use tracing::{debug, warn};

/// Shared/exclusive lock service keyed by entity identity.
#[async_trait]
pub trait MaintenanceGate: Send + Sync {
    /// Takes a shared lock on `entity`, waiting while an exclusive holder is
    /// active. There is no timeout. On error, nothing is held.
    async fn read_lock(&self, entity: &EntityId) -> Result<(), GateError>;

    /// Gives back one shared lock on `entity`.
    fn read_unlock(&self, entity: &EntityId);
}

#[derive(Debug, Default)]
struct KeyState {
    readers: usize,
    exclusive: bool,
}

impl KeyState {
    fn is_idle(&self) -> bool {
        self.readers == 0 && !self.exclusive
    }
}

/// In-process maintenance gate.
#[derive(Debug, Default)]
pub struct LocalMaintenanceGate {
    keys: Mutex<HashMap<EntityId, KeyState>>,
    changed: Notify,
    closed: AtomicBool,
}

impl LocalMaintenanceGate {
    /// Creates an open gate with no locks held.
    pub fn new() -> Self {
        Self::default()
    }

    fn keys(&self) -> MutexGuard<'_, HashMap<EntityId, KeyState>> {
        self.keys.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Takes the exclusive maintenance lock on `entity`, waiting for current
    /// readers and any other maintenance holder to finish.
    pub async fn lock_exclusive(&self, entity: &EntityId) -> Result<(), GateError> {
        loop {
            let notified = self.changed.notified();
            {
                if self.closed.load(Ordering::SeqCst) {
                    return Err(GateError::Closed);
                }
                let mut keys = self.keys();
                let state = keys.entry(entity.clone()).or_default();
                if state.is_idle() {
                    state.exclusive = true;
                    debug!(entity = %entity, "maintenance exclusive lock taken");
                    return Ok(());
                }
            }
            notified.await;
        }
    }

    /// Gives back the exclusive maintenance lock on `entity`.
    pub fn unlock_exclusive(&self, entity: &EntityId) {
        {
            let mut keys = self.keys();
            match keys.get_mut(entity) {
                Some(state) if state.exclusive => {
                    state.exclusive = false;
                    if state.is_idle() {
                        keys.remove(entity);
                    }
                    debug!(entity = %entity, "maintenance exclusive lock released");
                }
                _ => warn!(entity = %entity, "exclusive unlock without a matching lock"),
            }
        }
        self.changed.notify_waiters();
    }

    /// Number of shared locks currently held on `entity`.
    pub fn readers(&self, entity: &EntityId) -> usize {
        self.keys().get(entity).map_or(0, |s| s.readers)
    }

    /// Whether a maintenance holder currently owns `entity`.
    pub fn is_exclusive(&self, entity: &EntityId) -> bool {
        self.keys().get(entity).is_some_and(|s| s.exclusive)
    }

    /// Shuts the gate. Pending and future acquisitions fail with
    /// [`GateError::Closed`]; held locks can still be released.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.changed.notify_waiters();
    }
}

#[async_trait]
impl MaintenanceGate for LocalMaintenanceGate {
    async fn read_lock(&self, entity: &EntityId) -> Result<(), GateError> {
        loop {
            let notified = self.changed.notified();
            {
                if self.closed.load(Ordering::SeqCst) {
                    return Err(GateError::Closed);
                }
                let mut keys = self.keys();
                let state = keys.entry(entity.clone()).or_default();
                if !state.exclusive {
                    state.readers += 1;
                    return Ok(());
                }
            }
            debug!(entity = %entity, "fetch waiting on maintenance holder");
            notified.await;
        }
    }

    fn read_unlock(&self, entity: &EntityId) {
        {
            let mut keys = self.keys();
            match keys.get_mut(entity) {
                Some(state) if state.readers > 0 => {
                    state.readers -= 1;
                    if state.is_idle() {
                        keys.remove(entity);
                    }
                }
                _ => warn!(entity = %entity, "read unlock without a matching lock"),
            }
        }
        self.changed.notify_waiters();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    fn book() -> EntityId {
        EntityId::new("OrderBook", "book-7")
    }

    #[tokio::test]
    async fn readers_share_the_lock() {
        let gate = LocalMaintenanceGate::new();
        gate.read_lock(&book()).await.unwrap();
        gate.read_lock(&book()).await.unwrap();
        assert_eq!(gate.readers(&book()), 2);
        gate.read_unlock(&book());
        gate.read_unlock(&book());
        assert_eq!(gate.readers(&book()), 0);
    }

    #[tokio::test]
    async fn keys_are_independent() {
        let gate = LocalMaintenanceGate::new();
        let other = EntityId::new("OrderBook", "book-8");
        gate.lock_exclusive(&book()).await.unwrap();
        gate.read_lock(&other).await.unwrap();
        assert_eq!(gate.readers(&other), 1);
        assert!(gate.is_exclusive(&book()));
    }

    #[tokio::test(start_paused = true)]
    async fn exclusive_waits_for_readers() {
        let gate = Arc::new(LocalMaintenanceGate::new());
        gate.read_lock(&book()).await.unwrap();

        let g = gate.clone();
        let holder = tokio::spawn(async move { g.lock_exclusive(&book()).await });
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!holder.is_finished());

        gate.read_unlock(&book());
        holder.await.unwrap().unwrap();
        assert!(gate.is_exclusive(&book()));
    }

    #[tokio::test(start_paused = true)]
    async fn close_fails_pending_readers() {
        let gate = Arc::new(LocalMaintenanceGate::new());
        gate.lock_exclusive(&book()).await.unwrap();

        let g = gate.clone();
        let waiter = tokio::spawn(async move { g.read_lock(&book()).await });
        tokio::time::sleep(Duration::from_millis(10)).await;
        gate.close();
        assert_eq!(waiter.await.unwrap(), Err(GateError::Closed));
    }

    #[test]
    fn unbalanced_unlock_is_ignored() {
        let gate = LocalMaintenanceGate::new();
        gate.read_unlock(&book());
        gate.unlock_exclusive(&book());
        assert_eq!(gate.readers(&book()), 0);
        assert!(!gate.is_exclusive(&book()));
    }
}
