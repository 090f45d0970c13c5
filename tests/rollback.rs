//! Rollback coverage for the optimistic apply-then-persist path
//!
//! Mutations apply to a working copy of the graph and only replace the
//! live graph once every store write lands. These tests flip the memory
//! store's write-failure toggle mid-flight and assert the last known good
//! graph survives untouched.

use hireflow::engine::PipelineEngine;
use hireflow::error::PipelineError;
use hireflow::graph::LayoutConfig;
use hireflow::models::StageKind;
use hireflow::store::Stores;

fn memory_engine() -> (PipelineEngine, std::sync::Arc<hireflow::store::MemoryStore>) {
    let (stores, handle) = Stores::memory();
    (PipelineEngine::new(stores, LayoutConfig::default()), handle)
}

#[test]
fn test_failed_insert_rolls_back_graph() {
    let (engine, store) = memory_engine();
    let job = engine.create_job("Backend Engineer").unwrap();
    let before = engine.graph(&job.id).unwrap();

    let entry_id = before.entry_stage().unwrap().id.clone();
    let edge_id = before.outgoing_edge(&entry_id).unwrap().id.clone();

    store.fail_writes(true);
    let err = engine
        .add_stage(&job.id, &edge_id, "TechTest", StageKind::Default)
        .unwrap_err();
    assert!(matches!(err, PipelineError::Persistence(_)));
    assert!(err.preserves_state());
    store.fail_writes(false);

    // The in-memory graph is unchanged, and the next mutation still works.
    assert_eq!(engine.graph(&job.id).unwrap(), before);
    engine
        .add_stage(&job.id, &edge_id, "TechTest", StageKind::Default)
        .unwrap();
    assert_eq!(engine.graph(&job.id).unwrap().stage_count(), 5);
}

#[test]
fn test_failed_insert_never_reuses_burned_id() {
    let (engine, store) = memory_engine();
    let job = engine.create_job("SRE").unwrap();
    let graph = engine.graph(&job.id).unwrap();
    let entry_id = graph.entry_stage().unwrap().id.clone();
    let edge_id = graph.outgoing_edge(&entry_id).unwrap().id.clone();

    store.fail_writes(true);
    engine
        .add_stage(&job.id, &edge_id, "Doomed", StageKind::Default)
        .unwrap_err();
    store.fail_writes(false);

    let retried = engine
        .add_stage(&job.id, &edge_id, "Survivor", StageKind::Default)
        .unwrap();
    // The failed attempt burned its id; the retry gets a fresh one.
    assert_eq!(retried, "stage-6");
}

#[test]
fn test_failed_advance_rolls_back_candidate_sets() {
    let (engine, store) = memory_engine();
    let job = engine.create_job("QA").unwrap();
    let candidate = engine.add_candidate(&job.id, "Ada", None).unwrap();
    let before = engine.graph(&job.id).unwrap();
    let entry_id = before.entry_stage().unwrap().id.clone();

    store.fail_writes(true);
    let err = engine
        .advance(&job.id, &candidate.id, &entry_id, "recruiter")
        .unwrap_err();
    assert!(matches!(err, PipelineError::Persistence(_)));
    store.fail_writes(false);

    let after = engine.graph(&job.id).unwrap();
    assert_eq!(after, before);
    assert!(after.node(&entry_id).unwrap().has_candidate(&candidate.id));

    // No half-applied timeline entry beyond the application event.
    assert_eq!(engine.timeline(&candidate.id).unwrap().len(), 1);

    // Retrying the same logical move applies exactly once.
    let outcome = engine
        .advance(&job.id, &candidate.id, &entry_id, "recruiter")
        .unwrap();
    assert!(outcome.is_some());
    assert_eq!(engine.timeline(&candidate.id).unwrap().len(), 2);
}

#[test]
fn test_failed_delete_keeps_stage() {
    let (engine, store) = memory_engine();
    let job = engine.create_job("PM").unwrap();
    let graph = engine.graph(&job.id).unwrap();
    let ordered: Vec<String> = graph.stages_in_order().iter().map(|n| n.id.clone()).collect();

    store.fail_writes(true);
    let err = engine.delete_stage(&job.id, &ordered[1]).unwrap_err();
    assert!(matches!(err, PipelineError::Persistence(_)));
    store.fail_writes(false);

    let after = engine.graph(&job.id).unwrap();
    assert_eq!(after.stage_count(), 4);
    assert!(after.contains_stage(&ordered[1]));
    assert!(after.is_connected());
}
