use bastion_events::factory;
use bastion_events::{EventLevel, EventSubsystem, EventType, OperatorEvent};
use bastion_types::NodeId;
use pretty_assertions::assert_eq;
use std::time::Duration;

fn shape(event: &OperatorEvent) -> (EventLevel, EventSubsystem, EventType, &str) {
    (
        event.level(),
        event.subsystem(),
        event.event_type(),
        event.collapse_key(),
    )
}

// ── Levels, types and collapse keys ─────────────────────────────

#[test]
fn topology_events() {
    let node = NodeId::new("client-3");
    assert_eq!(
        shape(&factory::node_connected(&node)),
        (EventLevel::Info, EventSubsystem::ClusterTopology, EventType::TopologyNodeJoined, "client-3joined")
    );
    assert_eq!(
        shape(&factory::node_disconnected(&node)),
        (EventLevel::Warn, EventSubsystem::ClusterTopology, EventType::TopologyNodeLeft, "client-3left")
    );
    assert_eq!(
        shape(&factory::node_state_changed("PASSIVE-STANDBY")),
        (EventLevel::Info, EventSubsystem::ClusterTopology, EventType::TopologyNodeState, "")
    );
    assert_eq!(
        shape(&factory::handshake_rejected("1.0", &node, "2.0")),
        (EventLevel::Error, EventSubsystem::ClusterTopology, EventType::TopologyHandshakeReject, "handshake rejected")
    );
    assert_eq!(
        shape(&factory::active_disconnected("server-1")).2,
        EventType::TopologyActiveLeft
    );
    assert_eq!(
        shape(&factory::passive_disconnected("server-2")).2,
        EventType::TopologyMirrorLeft
    );
    assert_eq!(factory::zap_received(&node, "split brain").level(), EventLevel::Warn);
    assert_eq!(factory::zap_accepted(&node, "split brain").level(), EventLevel::Warn);
    assert_eq!(
        shape(&factory::config_reloaded("added server-3")),
        (EventLevel::Info, EventSubsystem::ClusterTopology, EventType::TopologyConfigReloaded, "config reload")
    );
}

#[test]
fn dirty_db_level_depends_on_auto_delete() {
    let cleaned = factory::dirty_db(true);
    assert_eq!(cleaned.level(), EventLevel::Info);
    assert!(cleaned.message().contains("enabled"));

    let manual = factory::dirty_db(false);
    assert_eq!(manual.level(), EventLevel::Error);
    assert!(manual.message().contains("disabled"));
}

#[test]
fn other_subsystems() {
    assert_eq!(
        shape(&factory::long_gc("G1 Old", Duration::from_secs(9))),
        (EventLevel::Warn, EventSubsystem::MemoryManager, EventType::MemoryLongGc, "")
    );
    assert_eq!(
        shape(&factory::server_map_eviction("sessions", 120)),
        (EventLevel::Info, EventSubsystem::Dcv2, EventType::Dcv2ServerMapEviction, "")
    );
    assert_eq!(
        shape(&factory::system_time_different(
            &NodeId::new("client-1"),
            "client",
            "server-1",
            Duration::from_millis(4500)
        )),
        (EventLevel::Warn, EventSubsystem::SystemSetup, EventType::SystemTimeDifferent, "time difference")
    );
}

#[test]
fn resource_capacity_events() {
    assert_eq!(
        shape(&factory::near_resource_capacity("offheap", 85)),
        (EventLevel::Warn, EventSubsystem::Resource, EventType::ResourceCapacityNear, "near capacity")
    );
    assert_eq!(
        shape(&factory::full_resource_capacity("offheap", 100)),
        (EventLevel::Error, EventSubsystem::Resource, EventType::ResourceCapacityFull, "full capacity")
    );
    assert_eq!(
        shape(&factory::normal_resource_capacity("offheap", 40)),
        (EventLevel::Info, EventSubsystem::Resource, EventType::ResourceCapacityRestored, "normal capacity restored")
    );
}

// ── Messages ────────────────────────────────────────────────────

#[test]
fn messages_carry_arguments() {
    let node = NodeId::new("client-3");
    let rejected = factory::handshake_rejected("1.0", &node, "2.0");
    for part in ["client-3", "1.0", "2.0"] {
        assert!(rejected.message().contains(part), "{}", rejected.message());
    }
    assert!(factory::long_gc("G1 Old", Duration::from_millis(9000)).message().contains("9000 ms"));
    assert!(factory::near_resource_capacity("offheap", 85).message().contains("85%"));
}

// ── Collapsing ──────────────────────────────────────────────────

#[test]
fn repeated_joins_collapse() {
    let node = NodeId::new("client-3");
    let first = factory::node_connected(&node);
    let second = factory::node_connected(&node);
    assert!(first.collapses_with(&second));
    assert_ne!(first.id(), second.id());

    assert!(!first.collapses_with(&factory::node_connected(&NodeId::new("client-4"))));
    assert!(!first.collapses_with(&factory::node_disconnected(&node)));
}

// ── Serialization and emission ──────────────────────────────────

#[test]
fn serde_round_trip() {
    let event = factory::full_resource_capacity("offheap", 100);
    let json = serde_json::to_string(&event).unwrap();
    assert!(json.contains("\"level\":\"error\""), "{json}");
    assert!(json.contains("\"event_type\":\"resource_capacity_full\""), "{json}");
    let back: OperatorEvent = serde_json::from_str(&json).unwrap();
    assert_eq!(back, event);
    assert_eq!(back.timestamp_ms(), event.timestamp_ms());
}

#[test]
fn timestamps_are_current() {
    let before = now_ms();
    let event = factory::node_state_changed("ACTIVE-COORDINATOR");
    let after = now_ms();
    assert!(event.timestamp_ms() >= before && event.timestamp_ms() <= after);
}

fn now_ms() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_millis() as i64
}

#[test]
fn emit_at_every_level() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("bastion::operator=info")
        .with_test_writer()
        .try_init();
    factory::node_connected(&NodeId::new("client-1")).emit();
    factory::node_disconnected(&NodeId::new("client-1")).emit();
    factory::dirty_db(false).emit();
}
