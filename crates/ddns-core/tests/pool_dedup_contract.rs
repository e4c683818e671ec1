//! Contract Test: IP Pool Deduplication
//!
//! Verifies that the engine only talks to the provider for addresses outside
//! the pool window.
//!
//! Constraints verified:
//! - Rotating between known egress addresses issues no remote calls
//! - Updates are issued in observation order, one per new address
//! - The same address twice in a row never triggers a second update or write
//! - A persisted pool survives a restart
//!
//! If this test fails, multi-egress hosts will hammer the provider API.

mod common;

use common::*;
use ddns_core::config::{CURRENT_IP, IP_COUNT, IP_POOL};
use ddns_core::{DdnsEngine, EngineEvent, MemoryStateStore, PollOutcome};

#[tokio::test]
async fn rotating_egress_updates_each_new_address_once() {
    let resolver = ScriptedResolver::sequence(&["198.51.100.1", "198.51.100.2", "198.51.100.1", "198.51.100.3"]);
    let provider = MockDnsProvider::new();
    let store = MemoryStateStore::new();

    let (mut engine, _events) = DdnsEngine::new(
        Box::new(resolver.clone()),
        Box::new(provider.clone()),
        Box::new(store.clone()),
        valid_state(2, 5),
    )
    .expect("engine construction succeeds");

    engine.resolve_record().await.expect("record resolves");

    let mut outcomes = Vec::new();
    for _ in 0..4 {
        outcomes.push(engine.poll_once().await.expect("poll succeeds"));
    }

    let (a, b, c) = (ip("198.51.100.1"), ip("198.51.100.2"), ip("198.51.100.3"));
    assert_eq!(
        outcomes,
        vec![
            PollOutcome::Updated(a),
            PollOutcome::Updated(b),
            PollOutcome::Known(a),
            PollOutcome::Updated(c),
        ]
    );

    // Exactly three remote updates, in order
    assert_eq!(provider.updated_ips(), vec![a, b, c]);
    assert_eq!(store.write_count(), 3);

    // C newest, A kept because it was seen again after B
    assert_eq!(engine.pool().entries(), ["198.51.100.3", "198.51.100.1"]);
    let persisted = store.last().await.expect("state persisted");
    assert_eq!(persisted.value(IP_POOL), "198.51.100.3,198.51.100.1");
    assert_eq!(persisted.value(CURRENT_IP), "198.51.100.3");
}

#[tokio::test]
async fn same_address_twice_is_idempotent() {
    let addr = ip("203.0.113.7");
    let provider = MockDnsProvider::new();
    let store = MemoryStateStore::new();

    let (mut engine, _events) = DdnsEngine::new(
        Box::new(ScriptedResolver::fixed(addr)),
        Box::new(provider.clone()),
        Box::new(store.clone()),
        valid_state(1, 5),
    )
    .expect("engine construction succeeds");

    engine.resolve_record().await.unwrap();
    assert_eq!(engine.poll_once().await.unwrap(), PollOutcome::Updated(addr));
    let after_first = store.last().await;

    assert_eq!(engine.poll_once().await.unwrap(), PollOutcome::Known(addr));

    assert_eq!(provider.update_call_count(), 1, "second poll must not update");
    assert_eq!(store.write_count(), 1, "second poll must not persist");
    assert_eq!(store.last().await, after_first);
}

#[tokio::test]
async fn update_targets_resolved_record() {
    let provider = MockDnsProvider::new();

    let (mut engine, _events) = DdnsEngine::new(
        Box::new(ScriptedResolver::fixed(ip("203.0.113.7"))),
        Box::new(provider.clone()),
        Box::new(MemoryStateStore::new()),
        valid_state(1, 5),
    )
    .unwrap();

    engine.resolve_record().await.unwrap();
    engine.poll_once().await.unwrap();

    let updates = provider.updates();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].domain, DOMAIN_NAME);
    assert_eq!(updates[0].sub_domain, SUB_DOMAIN_NAME);
    assert_eq!(updates[0].record_id.as_str(), RECORD_ID_VALUE);
    assert_eq!(updates[0].ttl, 60);
    assert_eq!(updates[0].line, "default");
}

#[tokio::test]
async fn persisted_pool_survives_restart() {
    let addr = ip("203.0.113.7");
    let store = MemoryStateStore::new();

    // First run: push the address and persist
    {
        let provider = MockDnsProvider::new();
        let (mut engine, _events) = DdnsEngine::new(
            Box::new(ScriptedResolver::fixed(addr)),
            Box::new(provider.clone()),
            Box::new(store.clone()),
            valid_state(2, 5),
        )
        .unwrap();

        engine.resolve_record().await.unwrap();
        engine.poll_once().await.unwrap();
        assert_eq!(provider.update_call_count(), 1);
    }

    // Second run starts from the persisted snapshot
    let provider = MockDnsProvider::new();
    let persisted = store.last().await.expect("state persisted");
    let (mut engine, _events) = DdnsEngine::new(
        Box::new(ScriptedResolver::fixed(addr)),
        Box::new(provider.clone()),
        Box::new(store.clone()),
        persisted,
    )
    .unwrap();

    engine.resolve_record().await.unwrap();
    assert_eq!(engine.poll_once().await.unwrap(), PollOutcome::Known(addr));
    assert_eq!(provider.update_call_count(), 0, "restart must not re-push a known address");
}

#[tokio::test]
async fn known_address_emits_event_without_update() {
    let addr = ip("203.0.113.7");
    let (mut engine, mut events) = DdnsEngine::new(
        Box::new(ScriptedResolver::fixed(addr)),
        Box::new(MockDnsProvider::new()),
        Box::new(MemoryStateStore::new()),
        valid_state(1, 5).with(IP_POOL, "203.0.113.7"),
    )
    .unwrap();

    engine.resolve_record().await.unwrap();
    engine.poll_once().await.unwrap();

    assert!(matches!(events.recv().await, Some(EngineEvent::RecordResolved { .. })));
    assert_eq!(events.recv().await, Some(EngineEvent::AddressKnown { ip: addr }));
}

#[tokio::test]
async fn largest_ip_count_builds_a_working_engine() {
    let provider = MockDnsProvider::new();
    let store = MemoryStateStore::new();

    let (mut engine, _events) = DdnsEngine::new(
        Box::new(ScriptedResolver::sequence(&["198.51.100.1", "198.51.100.2"])),
        Box::new(provider.clone()),
        Box::new(store.clone()),
        valid_state(1, 5).with(IP_COUNT, u64::MAX.to_string()),
    )
    .expect("engine construction succeeds");

    assert!(engine.pool().is_empty());
    engine.resolve_record().await.unwrap();
    engine.poll_once().await.unwrap();
    engine.poll_once().await.unwrap();

    assert_eq!(engine.pool().entries(), ["198.51.100.2", "198.51.100.1"]);
    assert_eq!(provider.update_call_count(), 2);
}

#[tokio::test]
async fn known_address_reorder_is_not_persisted() {
    let store = MemoryStateStore::new();
    let (mut engine, _events) = DdnsEngine::new(
        Box::new(ScriptedResolver::fixed(ip("198.51.100.2"))),
        Box::new(MockDnsProvider::new()),
        Box::new(store.clone()),
        valid_state(2, 5).with(IP_POOL, "198.51.100.1,198.51.100.2"),
    )
    .unwrap();

    engine.resolve_record().await.unwrap();
    engine.poll_once().await.unwrap();

    assert_eq!(engine.pool().entries(), ["198.51.100.2", "198.51.100.1"]);
    assert_eq!(store.write_count(), 0);
    assert_eq!(engine.state().value(IP_POOL), "198.51.100.1,198.51.100.2");
}
