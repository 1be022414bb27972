//! Two-phase dispatch through the public `Group` API.
//!
//! Covers result ordering, the compute/deliver barrier in both dispatch
//! modes, selections, composites, and fault propagation.

use std::time::Duration;

use cohort_core::{AgentAddress, AgentId, Params, Value};
use cohort_engine::{DispatchMode, Group, GroupConfig, GroupError};
use cohort_store::{StoreConfig, StoreError, StoreHandle};
use cohort_test_utils::{failing_class, null_class, recording_class, Journal};

const COMMANDS: [&str; 3] = ["step", "ping", "last"];

fn quiet(mode: DispatchMode) -> GroupConfig {
    GroupConfig {
        workers: Some(3),
        dispatch_mode: mode,
        fault_jitter: Duration::ZERO,
    }
}

fn setup(n: usize, mode: DispatchMode) -> (StoreHandle, Journal, Group) {
    let store = StoreHandle::new(StoreConfig::new(4)).unwrap();
    let journal = Journal::new();
    let class = recording_class("household", COMMANDS, &journal);
    let mut group = Group::new(&store, "household", class, quiet(mode)).unwrap();
    group.append_many(n, &Params::new()).unwrap();
    (store, journal, group)
}

fn ids(values: &[Value]) -> Vec<i64> {
    values.iter().filter_map(Value::as_i64).collect()
}

#[test]
fn delete_append_dispatch_example() {
    let (_store, _journal, mut group) = setup(3, DispatchMode::Sequential);
    group.delete(AgentId(1)).unwrap();
    assert_eq!(group.free_ids(), Some(vec![AgentId(1)]));

    let reused = group.append(&Params::new()).unwrap();
    assert_eq!(reused, AgentId(1));

    let results = group.dispatch("step", &[]).unwrap();
    assert_eq!(ids(&results), vec![0, 1, 2]);
}

#[test]
fn one_result_per_live_agent_in_both_modes() {
    for mode in [DispatchMode::Sequential, DispatchMode::Parallel] {
        let (_store, _journal, mut group) = setup(10, mode);
        group.delete(AgentId(4)).unwrap();
        group.delete(AgentId(7)).unwrap();
        let results = group.dispatch("step", &[]).unwrap();
        assert_eq!(ids(&results), vec![0, 1, 2, 3, 5, 6, 8, 9], "{mode:?}");
    }
}

#[test]
fn no_delivery_before_compute_finishes() {
    for mode in [DispatchMode::Sequential, DispatchMode::Parallel] {
        let (_store, journal, mut group) = setup(12, mode);
        journal.clear();
        group
            .dispatch("ping", &[Value::Int(0), Value::Int(11)])
            .unwrap();
        assert!(journal.compute_precedes_delivery(), "{mode:?}");
        assert_eq!(journal.received_by(&AgentAddress::new("household", 0u32)), 12);
        assert_eq!(group.last_metrics().messages, 24);
    }
}

#[test]
fn selection_touches_exactly_its_ids() {
    let (_store, journal, group) = setup(5, DispatchMode::Sequential);
    let mut view = group.select([3u32, 1]);
    journal.clear();

    let results = view.dispatch("step", &[]).unwrap();
    assert_eq!(ids(&results), vec![3, 1]);
    let touched: Vec<u32> = journal.executed().iter().map(|a| a.id.0).collect();
    assert_eq!(touched, vec![3, 1]);
    assert_eq!(view.count().unwrap(), 2);
}

#[test]
fn view_dispatch_leaves_owner_bookkeeping_alone() {
    let (_store, _journal, mut group) = setup(3, DispatchMode::Sequential);
    group.delete(AgentId(2)).unwrap();
    let mut view = group.select([0u32, 1]);
    view.dispatch("step", &[]).unwrap();
    view.advance_round(1u64.into()).unwrap();

    assert_eq!(group.free_ids(), Some(vec![AgentId(2)]));
    assert_eq!(group.last_command(), cohort_engine::BEGIN_OF_SIMULATION);
    assert_eq!(view.last_command(), "step");
}

#[test]
fn selection_sees_agents_deleted_by_owner() {
    let (_store, _journal, mut group) = setup(3, DispatchMode::Sequential);
    let mut view = group.select([0u32, 1, 2]);
    group.delete(AgentId(1)).unwrap();
    assert_eq!(ids(&view.dispatch("step", &[]).unwrap()), vec![0, 2]);
    assert_eq!(view.count().unwrap(), 2);
}

#[test]
fn selection_past_the_end_is_an_error() {
    let (_store, _journal, group) = setup(2, DispatchMode::Sequential);
    let mut view = group.select_one(5u32);
    assert!(matches!(
        view.dispatch("step", &[]),
        Err(GroupError::Store(StoreError::OutOfRange { .. }))
    ));
}

#[test]
fn composite_dispatches_over_every_name_in_order() {
    let (store, journal, households) = setup(2, DispatchMode::Sequential);
    let firm_class = recording_class("firm", ["step", "produce"], &journal);
    let mut firms = Group::new(&store, "firm", firm_class, quiet(DispatchMode::Sequential)).unwrap();
    firms.append_many(3, &Params::new()).unwrap();

    let mut all = households.union(&firms).unwrap();
    assert!(all.is_composite());
    assert_eq!(all.capabilities().iter().collect::<Vec<_>>(), vec!["step"]);
    assert_eq!(all.count().unwrap(), 5);

    journal.clear();
    let results = all.dispatch("step", &[]).unwrap();
    assert_eq!(ids(&results), vec![0, 1, 0, 1, 2]);
    let groups: Vec<String> = journal
        .executed()
        .iter()
        .map(|a| a.group.to_string())
        .collect();
    assert_eq!(groups, ["household", "household", "firm", "firm", "firm"]);

    assert!(matches!(
        all.dispatch("produce", &[]),
        Err(GroupError::UnsupportedCommand { .. })
    ));
    assert!(matches!(
        all.append(&Params::new()),
        Err(GroupError::CompositeIdentity { .. })
    ));
}

#[test]
fn union_capabilities_are_an_intersection() {
    let store = StoreHandle::new(StoreConfig::new(1)).unwrap();
    let cfg = quiet(DispatchMode::Sequential);
    let a = Group::new(&store, "a", null_class("a", ["x", "y", "z"]), cfg.clone()).unwrap();
    let b = Group::new(&store, "b", null_class("b", ["y", "z", "w"]), cfg.clone()).unwrap();
    let c = Group::new(&store, "c", null_class("c", ["z", "y"]), cfg).unwrap();

    let ab = a.union(&b).unwrap();
    let expected = a.capabilities().intersection(b.capabilities());
    assert_eq!(ab.capabilities(), &expected);
    assert!(!ab.capabilities().contains("x"));
    assert!(!ab.capabilities().contains("w"));

    let abc = Group::union_all([&a, &b, &c]).unwrap();
    assert_eq!(abc.names().len(), 3);
    assert_eq!(abc.capabilities().len(), 2);
}

#[test]
fn last_command_is_context_for_agents() {
    let (_store, _journal, mut group) = setup(2, DispatchMode::Sequential);
    group.dispatch("step", &[]).unwrap();
    let results = group.dispatch("last", &[]).unwrap();
    assert_eq!(results, vec![Value::Text("last".into()); 2]);
}

#[test]
fn agent_fault_propagates_and_skips_delivery() {
    let store = StoreHandle::new(StoreConfig::new(1)).unwrap();
    let journal = Journal::new();
    let class = failing_class("firm", ["step"], &journal, 1);
    let mut group = Group::new(&store, "firm", class, quiet(DispatchMode::Sequential)).unwrap();
    group.append_many(3, &Params::new()).unwrap();

    group.dispatch("step", &[]).unwrap();
    journal.clear();
    let err = group.dispatch("step", &[]).unwrap_err();
    let GroupError::Agent { address, command, .. } = err else {
        panic!("expected an agent fault");
    };
    assert_eq!(address, AgentAddress::new("firm", 0u32));
    assert_eq!(command, "step");
    assert_eq!(journal.executed().len(), 1, "fail-fast");
}

#[test]
fn message_to_deleted_agent_is_a_delivery_fault() {
    let (_store, _journal, mut group) = setup(3, DispatchMode::Sequential);
    group.delete(AgentId(2)).unwrap();
    let err = group.dispatch("ping", &[Value::Int(2)]).unwrap_err();
    assert!(matches!(err, GroupError::Store(StoreError::Delivery { .. })));
}

#[test]
fn parallel_duplicate_selection_rejected() {
    let (_store, journal, group) = setup(3, DispatchMode::Parallel);
    let mut twice = group.select([1u32, 1]);
    journal.clear();
    assert!(matches!(
        twice.dispatch("step", &[]),
        Err(GroupError::DuplicateSelection { .. })
    ));
    assert!(journal.executed().is_empty());
    assert_eq!(twice.count().unwrap(), 2);
}
