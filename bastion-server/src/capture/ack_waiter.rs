//! Tracks passive replica acknowledgment for one invocation.

use bastion_types::NodeId;
use std::collections::BTreeSet;
use tokio::sync::watch;
use tracing::debug;

#[derive(Debug, Clone, Default)]
struct AckState {
    pending_receive: BTreeSet<NodeId>,
    pending_complete: BTreeSet<NodeId>,
}

/// Waits for a set of passive replicas to receive and then durably apply one
/// replicated invocation.
///
/// A passive that leaves the cluster is failed out with
/// [`fail_passive`](Self::fail_passive) and no longer holds anyone up. A
/// waiter created with no passives is complete from the start.
#[derive(Debug)]
pub struct ActivePassiveAckWaiter {
    state: watch::Sender<AckState>,
}

impl ActivePassiveAckWaiter {
    pub fn new(passives: impl IntoIterator<Item = NodeId>) -> Self {
        let pending: BTreeSet<NodeId> = passives.into_iter().collect();
        let (state, _) = watch::channel(AckState {
            pending_receive: pending.clone(),
            pending_complete: pending,
        });
        Self { state }
    }

    /// A waiter for an active with no passive replicas.
    pub fn without_passives() -> Self {
        Self::new(std::iter::empty())
    }

    pub fn did_receive_on_passive(&self, node: &NodeId) {
        self.state.send_modify(|s| {
            if !s.pending_receive.remove(node) {
                debug!(node = %node, "receive ack from untracked or already-acked passive");
            }
        });
    }

    /// Records durable completion on `node`. Completion implies receipt.
    pub fn did_complete_on_passive(&self, node: &NodeId) {
        self.state.send_modify(|s| {
            s.pending_receive.remove(node);
            if !s.pending_complete.remove(node) {
                debug!(node = %node, "complete ack from untracked or already-acked passive");
            }
        });
    }

    /// Stops waiting on a passive that left the cluster.
    pub fn fail_passive(&self, node: &NodeId) {
        self.state.send_modify(|s| {
            s.pending_receive.remove(node);
            s.pending_complete.remove(node);
        });
        debug!(node = %node, "passive dropped from ack wait");
    }

    pub fn is_received(&self) -> bool {
        self.state.borrow().pending_receive.is_empty()
    }

    pub fn is_completed(&self) -> bool {
        self.state.borrow().pending_complete.is_empty()
    }

    /// Passives that have not yet completed.
    pub fn pending_passives(&self) -> Vec<NodeId> {
        self.state.borrow().pending_complete.iter().cloned().collect()
    }

    /// Resolves once every passive has received the invocation.
    pub async fn wait_for_received(&self) {
        let mut rx = self.state.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        let _ = rx.wait_for(|s| s.pending_receive.is_empty()).await;
    }

    /// Resolves once every passive has durably completed the invocation.
    pub async fn wait_for_completed(&self) {
        let mut rx = self.state.subscribe();
        let _ = rx.wait_for(|s| s.pending_complete.is_empty()).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    fn node(name: &str) -> NodeId {
        NodeId::new(name)
    }

    #[test]
    fn empty_waiter_is_complete() {
        let waiter = ActivePassiveAckWaiter::without_passives();
        assert!(waiter.is_received());
        assert!(waiter.is_completed());
        assert!(waiter.pending_passives().is_empty());
    }

    #[test]
    fn completion_implies_receipt() {
        let waiter = ActivePassiveAckWaiter::new([node("p1")]);
        assert!(!waiter.is_received());
        waiter.did_complete_on_passive(&node("p1"));
        assert!(waiter.is_received());
        assert!(waiter.is_completed());
    }

    #[test]
    fn receipt_alone_does_not_complete() {
        let waiter = ActivePassiveAckWaiter::new([node("p1"), node("p2")]);
        waiter.did_receive_on_passive(&node("p1"));
        waiter.did_receive_on_passive(&node("p2"));
        assert!(waiter.is_received());
        assert!(!waiter.is_completed());
        assert_eq!(waiter.pending_passives(), vec![node("p1"), node("p2")]);
    }

    #[test]
    fn failed_passive_stops_blocking() {
        let waiter = ActivePassiveAckWaiter::new([node("p1"), node("p2")]);
        waiter.did_complete_on_passive(&node("p1"));
        waiter.fail_passive(&node("p2"));
        assert!(waiter.is_completed());
    }

    #[tokio::test(start_paused = true)]
    async fn wait_for_completed_resolves_after_last_ack() {
        let waiter = Arc::new(ActivePassiveAckWaiter::new([node("p1")]));
        let w = waiter.clone();
        let task = tokio::spawn(async move { w.wait_for_completed().await });

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!task.is_finished());

        waiter.did_complete_on_passive(&node("p1"));
        task.await.unwrap();
    }

    #[tokio::test]
    async fn wait_for_received_returns_immediately_when_acked() {
        let waiter = ActivePassiveAckWaiter::new([node("p1")]);
        waiter.did_receive_on_passive(&node("p1"));
        waiter.wait_for_received().await;
        assert!(!waiter.is_completed());
    }
}
