//! Id recycling and counting invariants under arbitrary append/delete
//! interleavings.

use std::collections::BTreeSet;

use cohort_core::{AgentAddress, AgentId, Params, Value};
use cohort_engine::{Group, GroupConfig};
use cohort_store::{StoreConfig, StoreHandle};
use cohort_test_utils::{recording_class, Journal};
use proptest::prelude::*;

fn owner() -> (StoreHandle, Group) {
    let store = StoreHandle::new(StoreConfig::new(2)).unwrap();
    let class = recording_class("firm", ["step"], &Journal::new());
    let group = Group::new(&store, "firm", class, GroupConfig::default()).unwrap();
    (store, group)
}

fn collection_len(store: &StoreHandle) -> usize {
    store
        .lock()
        .unwrap()
        .collection(&"firm".into())
        .unwrap()
        .len()
}

#[test]
fn fresh_append_grows_store_by_one() {
    let (store, mut group) = owner();
    for expected in 0..4u32 {
        let before = collection_len(&store);
        let id = group.append(&Params::new()).unwrap();
        assert_eq!(id, AgentId(expected));
        assert_eq!(id.index(), before);
        assert_eq!(collection_len(&store), before + 1);
    }
}

#[test]
fn deleted_ids_are_reused_fifo_before_minting() {
    let (store, mut group) = owner();
    group.append_many(5, &Params::new()).unwrap();
    group.delete(AgentId(3)).unwrap();
    group.delete(AgentId(0)).unwrap();

    let addr = AgentAddress::new("firm", 3u32);
    assert!(!store.lock().unwrap().is_live(&addr), "deleted slot reads as tombstone");

    assert_eq!(group.append(&Params::new()).unwrap(), AgentId(3));
    assert_eq!(group.append(&Params::new()).unwrap(), AgentId(0));
    assert_eq!(collection_len(&store), 5);
    assert_eq!(group.append(&Params::new()).unwrap(), AgentId(5));
}

#[test]
fn reused_slot_gets_a_fresh_agent() {
    let (_store, mut group) = owner();
    let mut rich = Params::new();
    rich.insert("wealth".into(), Value::Float(10.0));
    group.append(&rich).unwrap();
    group.delete(AgentId(0)).unwrap();
    group.append(&Params::new()).unwrap();

    let records = group
        .panel_log(&cohort_engine::LogRequest::new().variables(["wealth"]))
        .unwrap();
    assert_eq!(records[0].values.get("wealth"), Some(&Value::Float(0.0)));
}

#[test]
fn fixed_params_reach_every_agent() {
    let store = StoreHandle::new(StoreConfig::new(1)).unwrap();
    let journal = Journal::new();
    let class = cohort_core::AgentClass::new("firm", ["step"], move |spawn| {
        Box::new(cohort_test_utils::RecordingAgent::from_spawn(spawn, journal.clone()))
    });
    let mut fixed = Params::new();
    fixed.insert("tag".into(), Value::from("acme"));
    let mut group = Group::new(&store, "firm", class, GroupConfig::default())
        .unwrap()
        .with_fixed_params(fixed);
    group.append_many(2, &Params::new()).unwrap();

    let records = group
        .panel_log(&cohort_engine::LogRequest::new().variables(["tag"]))
        .unwrap();
    assert!(records
        .iter()
        .all(|r| r.values.get("tag") == Some(&Value::from("acme"))));
}

#[derive(Clone, Debug)]
enum Op {
    Append,
    Delete(u32),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![Just(Op::Append), (0u32..24).prop_map(Op::Delete)]
}

proptest! {
    #[test]
    fn count_matches_live_ids_and_free_list_is_disjoint(ops in proptest::collection::vec(op(), 1..80)) {
        let (store, mut group) = owner();
        let mut live: BTreeSet<u32> = BTreeSet::new();

        for op in ops {
            match op {
                Op::Append => {
                    let free = group.free_ids().unwrap_or_default();
                    let len = collection_len(&store) as u32;
                    let id = group.append(&Params::new()).unwrap();
                    match free.first() {
                        Some(&reused) => {
                            prop_assert_eq!(id, reused);
                        }
                        None => {
                            prop_assert_eq!(id, AgentId(len));
                        }
                    }
                    prop_assert!(live.insert(id.0), "append handed out a live id");
                }
                Op::Delete(target) => {
                    let deleted = group.delete(AgentId(target)).is_ok();
                    prop_assert_eq!(deleted, live.remove(&target));
                }
            }

            prop_assert_eq!(group.count().unwrap(), live.len());
            let free = group.free_ids().unwrap_or_default();
            for id in &free {
                prop_assert!(!live.contains(&id.0), "id {} is both free and live", id);
            }
            prop_assert_eq!(free.len() + live.len(), collection_len(&store));
        }
    }
}
