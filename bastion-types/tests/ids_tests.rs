use bastion_types::{
    ClientInstanceId, ClientInstanceIdAllocator, ConsumerId, EntityDescriptor, EntityId,
    EntityVersion, Error, NodeId,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::collections::HashSet;
use std::str::FromStr;

struct OrderBook;

// ── EntityId ──────────────────────────────────────────────────────

#[test]
fn entity_id_accessors() {
    let id = EntityId::new("com.example.OrderBook", "book-7");
    assert_eq!(id.type_name(), "com.example.OrderBook");
    assert_eq!(id.name(), "book-7");
}

#[test]
fn entity_id_of_uses_rust_type_name() {
    let id = EntityId::of::<OrderBook>("book-7");
    assert!(id.type_name().ends_with("OrderBook"));
    assert_eq!(id.name(), "book-7");
}

#[test]
fn entity_id_equality_needs_type_and_name() {
    let a = EntityId::new("OrderBook", "book-7");
    let b = EntityId::new("OrderBook", "book-8");
    let c = EntityId::new("Ledger", "book-7");
    assert_ne!(a, b);
    assert_ne!(a, c);
    assert_eq!(a, EntityId::new("OrderBook", "book-7"));
}

#[test]
fn entity_id_display_and_parse() {
    let id = EntityId::new("OrderBook", "book-7");
    assert_eq!(id.to_string(), "OrderBook:book-7");
    assert_eq!(EntityId::parse("OrderBook:book-7").unwrap(), id);
}

#[test]
fn entity_id_parse_keeps_path_separators_in_type() {
    let id = EntityId::of::<OrderBook>("book-7");
    let parsed = EntityId::from_str(&id.to_string()).unwrap();
    assert_eq!(parsed, id);
}

#[test]
fn entity_id_parse_keeps_colons_in_name() {
    assert_eq!(
        EntityId::parse("OrderBook:region:eu-1").unwrap(),
        EntityId::new("OrderBook", "region:eu-1")
    );
    let id = EntityId::of::<OrderBook>("shard::7");
    assert_eq!(EntityId::parse(&id.to_string()).unwrap(), id);
}

#[test]
fn entity_id_parse_invalid() {
    for bad in ["nocolon", ":name", "type:", "a::b", ""] {
        assert_eq!(
            EntityId::parse(bad),
            Err(Error::InvalidEntityId(bad.to_string())),
            "input {bad:?}"
        );
    }
}

#[test]
fn entity_id_hash_and_eq() {
    let id = EntityId::new("OrderBook", "book-7");
    let mut set = HashSet::new();
    set.insert(id.clone());
    set.insert(id); // duplicate
    assert_eq!(set.len(), 1);
}

#[test]
fn entity_id_serde_roundtrip() {
    let id = EntityId::new("OrderBook", "book-7");
    let json = serde_json::to_string(&id).unwrap();
    let back: EntityId = serde_json::from_str(&json).unwrap();
    assert_eq!(back, id);
}

// ── ClientInstanceId ──────────────────────────────────────────────

#[test]
fn client_instance_id_rejects_zero() {
    assert_eq!(ClientInstanceId::new(0), Err(Error::ZeroClientInstanceId));
}

#[test]
fn client_instance_id_first_is_one() {
    assert_eq!(ClientInstanceId::FIRST.get(), 1);
    assert_eq!(ClientInstanceId::new(1).unwrap(), ClientInstanceId::FIRST);
}

#[test]
fn client_instance_id_orders_by_value() {
    let a = ClientInstanceId::new(3).unwrap();
    let b = ClientInstanceId::new(10).unwrap();
    assert!(a < b);
}

#[test]
fn client_instance_id_serializes_transparently() {
    let id = ClientInstanceId::new(42).unwrap();
    assert_eq!(serde_json::to_string(&id).unwrap(), "42");
}

// ── Small newtypes ───────────────────────────────────────────────

#[test]
fn entity_version_display() {
    assert_eq!(EntityVersion::new(3).to_string(), "v3");
    assert_eq!(EntityVersion::from(3), EntityVersion::new(3));
}

#[test]
fn consumer_id_platform_is_zero() {
    assert_eq!(ConsumerId::PLATFORM.get(), 0);
    assert_eq!(ConsumerId::new(9).to_string(), "9");
}

#[test]
fn node_id_from_str() {
    let node: NodeId = "passive-1".into();
    assert_eq!(node.as_str(), "passive-1");
    assert_eq!(node.to_string(), "passive-1");
}

// ── EntityDescriptor ─────────────────────────────────────────────

#[test]
fn descriptor_carries_all_parts() {
    let id = EntityId::new("OrderBook", "book-7");
    let cid = ClientInstanceId::new(2).unwrap();
    let desc = EntityDescriptor::new(id.clone(), cid, EntityVersion::new(1));
    assert_eq!(desc.entity_id(), &id);
    assert_eq!(desc.client_instance_id(), cid);
    assert_eq!(desc.version(), EntityVersion::new(1));
    assert_eq!(desc.to_string(), "OrderBook:book-7#2 (v1)");
}

#[test]
fn descriptors_differ_by_client_instance() {
    let id = EntityId::new("OrderBook", "book-7");
    let a = EntityDescriptor::new(id.clone(), ClientInstanceId::FIRST, EntityVersion::new(1));
    let b = EntityDescriptor::new(
        id,
        ClientInstanceId::new(2).unwrap(),
        EntityVersion::new(1),
    );
    assert_ne!(a, b);
}

proptest! {
    #[test]
    fn entity_id_display_parse_roundtrip(
        type_name in "[A-Za-z][A-Za-z0-9_]{0,10}(::[A-Za-z][A-Za-z0-9_]{0,10}){0,3}",
        name in "[A-Za-z0-9_.-][A-Za-z0-9_.:-]{0,30}",
    ) {
        let id = EntityId::new(type_name, name);
        prop_assert_eq!(EntityId::parse(&id.to_string()).unwrap(), id);
    }
}

// ── ClientInstanceIdAllocator ────────────────────────────────────

#[test]
fn allocator_starts_at_one_and_increments() {
    let alloc = ClientInstanceIdAllocator::new();
    assert_eq!(alloc.peek(), ClientInstanceId::FIRST);
    let ids: Vec<u64> = (0..5).map(|_| alloc.allocate().get()).collect();
    assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    assert_eq!(alloc.peek().get(), 6);
}

#[test]
fn allocator_is_unique_across_threads() {
    let alloc = std::sync::Arc::new(ClientInstanceIdAllocator::default());
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let alloc = alloc.clone();
            std::thread::spawn(move || (0..250).map(|_| alloc.allocate().get()).collect::<Vec<_>>())
        })
        .collect();
    let mut all: Vec<u64> = handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();
    all.sort_unstable();
    assert_eq!(all, (1..=1000).collect::<Vec<_>>());
}
