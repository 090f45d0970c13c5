//! Candidate transitions
//!
//! `advance` follows the single outgoing edge of the candidate's current
//! stage; `move_to` takes a caller-supplied target within the same job's
//! graph. Both are idempotent under duplicate delivery: if the candidate
//! is no longer in the source node's set the call is a no-op, so repeated
//! invocations of the same logical move never double-apply.

use tracing::debug;

use crate::error::{PipelineError, Result};
use crate::graph::PipelineGraph;
use crate::models::{TimelineAction, TimelineEntry};

/// What a transition did, with everything the engine needs to persist:
/// the timeline event and the recomputed applicant total.
#[derive(Debug, Clone)]
pub struct TransitionOutcome {
    pub candidate_id: String,
    pub from_stage: String,
    pub to_stage: String,
    pub entry: TimelineEntry,
    /// Sum of candidates across all stage nodes after the move.
    pub total_candidates: usize,
}

/// Move a candidate along the single outgoing edge of `current_stage_id`.
///
/// Returns `Ok(None)` without touching any state when the stage is
/// terminal (no outgoing edge) or the candidate is not in the stage's set.
pub fn advance(
    graph: &mut PipelineGraph,
    candidate_id: &str,
    current_stage_id: &str,
    actor: &str,
) -> Result<Option<TransitionOutcome>> {
    graph.require_node(current_stage_id)?;

    let Some(edge) = graph.outgoing_edge(current_stage_id) else {
        debug!(candidate_id, stage_id = current_stage_id, "terminal stage; advance is a no-op");
        return Ok(None);
    };
    let target = edge.target.clone();

    apply_move(graph, candidate_id, current_stage_id, &target, TimelineAction::Advanced, actor)
}

/// Move a candidate to an arbitrary stage of the same job's graph.
///
/// Rejects with `InvalidTarget` when the target stage is not part of the
/// graph. Moving to the stage the candidate already occupies is a no-op.
pub fn move_to(
    graph: &mut PipelineGraph,
    source_stage_id: &str,
    candidate_id: &str,
    target_stage_id: &str,
) -> Result<Option<TransitionOutcome>> {
    move_to_as(graph, source_stage_id, candidate_id, target_stage_id, "system")
}

pub fn move_to_as(
    graph: &mut PipelineGraph,
    source_stage_id: &str,
    candidate_id: &str,
    target_stage_id: &str,
    actor: &str,
) -> Result<Option<TransitionOutcome>> {
    graph.require_node(source_stage_id)?;
    if !graph.contains_stage(target_stage_id) {
        return Err(PipelineError::InvalidTarget {
            stage_id: target_stage_id.to_string(),
            job_id: graph.job_id.clone(),
        });
    }
    if source_stage_id == target_stage_id {
        return Ok(None);
    }

    apply_move(graph, candidate_id, source_stage_id, target_stage_id, TimelineAction::Moved, actor)
}

fn apply_move(
    graph: &mut PipelineGraph,
    candidate_id: &str,
    from: &str,
    to: &str,
    action: TimelineAction,
    actor: &str,
) -> Result<Option<TransitionOutcome>> {
    // Verify the target before touching the source set so a failure can
    // never strand the candidate between nodes.
    graph.require_node(to)?;
    let source = graph
        .node_mut(from)
        .ok_or_else(|| PipelineError::StageNotFound(from.to_string()))?;

    let Some(index) = source
        .candidates()
        .iter()
        .position(|c| c.id == candidate_id)
    else {
        // Duplicate event delivery: the candidate already left this stage.
        debug!(candidate_id, from, "candidate not in source stage; no-op");
        return Ok(None);
    };
    let mut candidate = source.candidates_mut().remove(index);
    candidate.stage_id = to.to_string();

    let target = graph
        .node_mut(to)
        .ok_or_else(|| PipelineError::StageNotFound(to.to_string()))?;
    target.candidates_mut().push(candidate);

    let entry = TimelineEntry::transition(
        candidate_id.to_string(),
        action,
        from.to_string(),
        to.to_string(),
        actor.to_string(),
    );
    let total_candidates = graph.total_candidates();

    debug!(
        job_id = %graph.job_id,
        candidate_id,
        from,
        to,
        total = total_candidates,
        "candidate transitioned"
    );
    Ok(Some(TransitionOutcome {
        candidate_id: candidate_id.to_string(),
        from_stage: from.to_string(),
        to_stage: to.to_string(),
        entry,
        total_candidates,
    }))
}
