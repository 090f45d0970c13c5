//! Graph reconstruction
//!
//! Produces the live graph for a job from, in order of preference:
//! 1. The cached flow snapshot (fast path, trusted verbatim when it has at
//!    least one node).
//! 2. The normalized stage table plus current candidate assignments
//!    (fallback rebuild).
//!
//! If the snapshot is unusable the fallback runs; if the fallback also
//! fails the caller gets an empty graph plus a surfaced error, never a
//! crash.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::error::{PipelineError, Result};
use crate::graph::{PipelineGraph, StageNode, Transition};
use crate::models::{Assessment, Candidate, ResponseStatus, StageRecord};
use crate::snapshot::FlowSnapshot;

/// Per-assessment, per-candidate completion lookups gathered by the caller
/// before reconstruction, keeping this module free of store access.
pub type CompletionLookup = HashMap<String, HashMap<String, ResponseStatus>>;

/// Rebuild the live graph from normalized records.
///
/// Stages are sorted by persisted `order` ascending, ties broken by the
/// numeric suffix of the stage id, then chained linearly from the job
/// node. Each candidate attaches to the node matching its current-stage
/// id; a candidate that resolves to no node is recorded as an orphan and
/// surfaced, never turned into a phantom node.
pub fn rebuild_from_records(
    job_id: &str,
    mut stages: Vec<StageRecord>,
    candidates: Vec<Candidate>,
    assessments: Vec<Assessment>,
    completion: &CompletionLookup,
) -> PipelineGraph {
    stages.sort_by(|a, b| {
        a.order
            .cmp(&b.order)
            .then(a.numeric_suffix().cmp(&b.numeric_suffix()))
    });

    let mut graph = PipelineGraph::new(job_id);
    let mut prev = graph.job_node_id();
    for record in &stages {
        let node = StageNode::new(record.id.clone(), record.name.clone(), record.order)
            .into_positioned(record.position);
        graph.add_node(node);
        graph.add_edge(Transition::linear(prev, record.id.clone()));
        prev = record.id.clone();
    }

    for assessment in assessments {
        let Some(node) = graph.node_mut(&assessment.stage_id) else {
            warn!(
                assessment_id = %assessment.id,
                stage_id = %assessment.stage_id,
                "assessment targets a stage not present in the rebuilt graph"
            );
            continue;
        };
        let lookups = completion.get(&assessment.id).cloned().unwrap_or_default();
        node.set_assessment(assessment, lookups);
    }

    for candidate in candidates {
        match graph.node_mut(&candidate.stage_id) {
            Some(node) => node.candidates_mut().push(candidate),
            None => {
                warn!(
                    candidate_id = %candidate.id,
                    stage_id = %candidate.stage_id,
                    "candidate references a stage that does not exist; keeping as orphan"
                );
                graph.orphans_mut().push(candidate);
            }
        }
    }

    graph
}

/// Produce the live graph for a job.
///
/// Fast path: a snapshot with at least one node is trusted directly, with
/// no merge against the stage table. Otherwise the graph is rebuilt from
/// records. A decodable-but-corrupt snapshot falls back to the rebuild; an
/// empty stage table plus no snapshot yields `Reconstruction`.
pub fn reconstruct(
    job_id: &str,
    snapshot: Option<&FlowSnapshot>,
    stages: Vec<StageRecord>,
    candidates: Vec<Candidate>,
    assessments: Vec<Assessment>,
    completion: &CompletionLookup,
) -> Result<PipelineGraph> {
    if let Some(snapshot) = snapshot.filter(|s| !s.is_empty()) {
        match snapshot.restore(job_id) {
            Ok(graph) => {
                debug!(job_id, nodes = graph.stage_count(), "restored graph from snapshot");
                return Ok(graph);
            }
            Err(err) => {
                warn!(job_id, error = %err, "cached snapshot unusable; rebuilding from stage table");
            }
        }
    }

    if stages.is_empty() {
        return Err(PipelineError::Reconstruction {
            job_id: job_id.to_string(),
            reason: "no snapshot and no stage records".to_string(),
        });
    }

    let graph = rebuild_from_records(job_id, stages, candidates, assessments, completion);
    debug!(job_id, nodes = graph.stage_count(), "rebuilt graph from stage records");
    Ok(graph)
}
