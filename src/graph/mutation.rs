//! Structural stage mutations
//!
//! Insert, rename and delete keep the chain connected: insertion splits
//! the targeted edge in two, deletion re-splices predecessor to successor.
//! All functions mutate the in-memory graph only; the engine persists the
//! result (or rolls back) afterwards.

use tracing::debug;

use crate::error::{PipelineError, Result};
use crate::graph::{PipelineGraph, StageNode, Transition};
use crate::models::Position;

/// Split `edge_id` into `source -> new` and `new -> target`.
///
/// The new node takes the target's column; every node at or beyond that
/// column shifts right by `column_offset` so columns never overlap. Its
/// persisted `order` is `max(existing) + 1`, which deliberately diverges
/// from topological position for mid-chain inserts (fallback ordering
/// keeps insertion history, not chain position).
///
/// Returns the new node's id.
pub fn insert_on_edge(
    graph: &mut PipelineGraph,
    edge_id: &str,
    new_id: String,
    name: String,
    column_offset: f64,
) -> Result<String> {
    let edge = graph
        .edge(edge_id)
        .cloned()
        .ok_or_else(|| PipelineError::EdgeNotFound(edge_id.to_string()))?;

    let column = graph
        .node(&edge.target)
        .map(|target| target.position.x)
        .unwrap_or_default();

    let shifted: Vec<String> = graph
        .nodes()
        .filter(|n| n.position.x >= column)
        .map(|n| n.id.clone())
        .collect();
    for node_id in shifted {
        if let Some(node) = graph.node_mut(&node_id) {
            node.position.x += column_offset;
        }
    }

    let order = graph.max_order() + 1;
    let node =
        StageNode::new(new_id.clone(), name, order).into_positioned(Position::new(column, 0.0));
    graph.add_node(node);

    graph.remove_edge(edge_id);
    graph.add_edge(Transition::linear(edge.source.clone(), new_id.clone()));
    graph.add_edge(Transition::linear(new_id.clone(), edge.target.clone()));

    debug!(
        job_id = %graph.job_id,
        stage_id = %new_id,
        source = %edge.source,
        target = %edge.target,
        "inserted stage on edge"
    );
    Ok(new_id)
}

/// Pure label update; no topology, candidate or position side effects.
pub fn rename(graph: &mut PipelineGraph, stage_id: &str, new_name: String) -> Result<()> {
    let node = graph
        .node_mut(stage_id)
        .ok_or_else(|| PipelineError::StageNotFound(stage_id.to_string()))?;
    node.name = new_name;
    Ok(())
}

/// Delete an empty stage, re-splicing the chain around it.
///
/// With both an incoming and an outgoing edge the predecessor reconnects
/// directly to the successor; with only one edge the node is dropped as a
/// chain endpoint. A stage holding candidates refuses with `StageNotEmpty`.
pub fn delete(graph: &mut PipelineGraph, stage_id: &str) -> Result<StageNode> {
    let node = graph.require_node(stage_id)?;
    let occupants = node.candidate_count();
    if occupants > 0 {
        return Err(PipelineError::StageNotEmpty {
            stage_id: stage_id.to_string(),
            occupants,
        });
    }

    let incoming = graph.incoming_edge(stage_id).cloned();
    let outgoing = graph.outgoing_edge(stage_id).cloned();

    if let Some(edge) = &incoming {
        graph.remove_edge(&edge.id);
    }
    if let Some(edge) = &outgoing {
        graph.remove_edge(&edge.id);
    }
    if let (Some(incoming), Some(outgoing)) = (&incoming, &outgoing) {
        graph.add_edge(Transition::linear(
            incoming.source.clone(),
            outgoing.target.clone(),
        ));
    }

    let removed = graph
        .remove_node(stage_id)
        .ok_or_else(|| PipelineError::StageNotFound(stage_id.to_string()))?;

    debug!(job_id = %graph.job_id, stage_id, "deleted stage");
    Ok(removed)
}
