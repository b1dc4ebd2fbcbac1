//! Constructors for every operator event the server raises.
//!
//! Each function fixes the level, type and collapse key for its event and
//! formats the message from typed arguments.

use crate::{EventLevel, EventType, OperatorEvent};
use bastion_types::NodeId;
use std::time::Duration;

// ── Memory manager ──────────────────────────────────────────────

pub fn long_gc(collector: &str, pause: Duration) -> OperatorEvent {
    OperatorEvent::new(
        EventLevel::Warn,
        EventType::MemoryLongGc,
        format!(
            "Detected long GC: {collector} paused for {} ms",
            pause.as_millis()
        ),
        "",
    )
}

// ── Cluster topology ────────────────────────────────────────────

pub fn node_connected(node: &NodeId) -> OperatorEvent {
    node_availability(node, "joined", EventLevel::Info, EventType::TopologyNodeJoined)
}

pub fn node_disconnected(node: &NodeId) -> OperatorEvent {
    node_availability(node, "left", EventLevel::Warn, EventType::TopologyNodeLeft)
}

fn node_availability(
    node: &NodeId,
    action: &str,
    level: EventLevel,
    event_type: EventType,
) -> OperatorEvent {
    OperatorEvent::new(
        level,
        event_type,
        format!("Node {node} {action} the cluster"),
        format!("{node}{action}"),
    )
}

pub fn node_state_changed(new_state: &str) -> OperatorEvent {
    OperatorEvent::new(
        EventLevel::Info,
        EventType::TopologyNodeState,
        format!("Moved to state {new_state}"),
        "",
    )
}

pub fn handshake_rejected(client_version: &str, remote: &NodeId, server_version: &str) -> OperatorEvent {
    OperatorEvent::new(
        EventLevel::Error,
        EventType::TopologyHandshakeReject,
        format!(
            "Handshake rejected: client {remote} runs version {client_version}, \
             server runs version {server_version}"
        ),
        "handshake rejected",
    )
}

pub fn active_disconnected(server: &str) -> OperatorEvent {
    OperatorEvent::new(
        EventLevel::Warn,
        EventType::TopologyActiveLeft,
        format!("Active server {server} left the cluster"),
        "",
    )
}

pub fn passive_disconnected(server: &str) -> OperatorEvent {
    OperatorEvent::new(
        EventLevel::Warn,
        EventType::TopologyMirrorLeft,
        format!("Passive server {server} left the cluster"),
        "",
    )
}

/// A request to shut this server down was received from `from`.
pub fn zap_received(from: &NodeId, reason: &str) -> OperatorEvent {
    OperatorEvent::new(
        EventLevel::Warn,
        EventType::TopologyZapReceived,
        format!("Shutdown request received from {from}: {reason}"),
        "",
    )
}

pub fn zap_accepted(from: &NodeId, reason: &str) -> OperatorEvent {
    OperatorEvent::new(
        EventLevel::Warn,
        EventType::TopologyZapAccepted,
        format!("Shutdown request from {from} accepted: {reason}"),
        "",
    )
}

/// The local database was left dirty by an earlier run. Only an error when
/// the operator has to clean it up by hand.
pub fn dirty_db(auto_delete: bool) -> OperatorEvent {
    let (level, restart) = if auto_delete {
        (EventLevel::Info, "enabled")
    } else {
        (EventLevel::Error, "disabled")
    };
    OperatorEvent::new(
        level,
        EventType::TopologyDbDirty,
        format!("Server database is dirty; automatic cleanup on restart is {restart}"),
        "",
    )
}

pub fn config_reloaded(description: &str) -> OperatorEvent {
    OperatorEvent::new(
        EventLevel::Info,
        EventType::TopologyConfigReloaded,
        format!("Configuration reloaded: {description}"),
        "config reload",
    )
}

// ── Data ────────────────────────────────────────────────────────

pub fn server_map_eviction(map: &str, evicted: u64) -> OperatorEvent {
    OperatorEvent::new(
        EventLevel::Info,
        EventType::Dcv2ServerMapEviction,
        format!("Evicted {evicted} entries from server map {map}"),
        "",
    )
}

// ── System setup ────────────────────────────────────────────────

pub fn system_time_different(
    remote: &NodeId,
    description: &str,
    server: &str,
    difference: Duration,
) -> OperatorEvent {
    OperatorEvent::new(
        EventLevel::Warn,
        EventType::SystemTimeDifferent,
        format!(
            "System clock of {remote} ({description}) differs from {server} by {} ms",
            difference.as_millis()
        ),
        "time difference",
    )
}

// ── Resources ───────────────────────────────────────────────────

pub fn near_resource_capacity(resource: &str, percent: u8) -> OperatorEvent {
    OperatorEvent::new(
        EventLevel::Warn,
        EventType::ResourceCapacityNear,
        format!("{resource} is near capacity: {percent}% used"),
        "near capacity",
    )
}

pub fn full_resource_capacity(resource: &str, percent: u8) -> OperatorEvent {
    OperatorEvent::new(
        EventLevel::Error,
        EventType::ResourceCapacityFull,
        format!("{resource} is at full capacity: {percent}% used"),
        "full capacity",
    )
}

pub fn normal_resource_capacity(resource: &str, percent: u8) -> OperatorEvent {
    OperatorEvent::new(
        EventLevel::Info,
        EventType::ResourceCapacityRestored,
        format!("{resource} back to normal capacity: {percent}% used"),
        "normal capacity restored",
    )
}
