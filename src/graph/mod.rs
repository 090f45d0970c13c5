//! Live pipeline graph for a single job
//!
//! This module provides:
//! - The in-memory node/edge graph with O(1) adjacency lookups
//! - Reconstruction from a cached snapshot or the normalized stage table
//! - Structural mutations (insert on edge, rename, delete)
//! - Candidate transitions (advance, arbitrary move)
//! - Vertical position layout with full and incremental refresh modes

mod layout;
mod mutation;
mod nodes;
mod reconstruct;
mod render;
mod transition;


pub use layout::{recompute_layout, refresh_layout, LayoutConfig};
pub use mutation::{delete, insert_on_edge, rename};
pub use nodes::{EdgeKind, NodeBody, StageNode, Transition};
pub use reconstruct::{rebuild_from_records, reconstruct, CompletionLookup};
pub use render::{RenderEdge, RenderModel, RenderNode, RenderNodeKind};
pub use transition::{advance, move_to, move_to_as, TransitionOutcome};

use std::collections::HashMap;

use crate::error::{PipelineError, Result};
use crate::models::Candidate;

/// The live graph of one job's hiring pipeline.
///
/// Nodes are hiring stages; a synthetic job node (id `job-{job_id}`) heads
/// the chain so the entry stage is reachable through the same adjacency
/// maps as every other node. Single primary chain: every node has at most
/// one incoming and one outgoing edge.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineGraph {
    pub job_id: String,
    nodes: HashMap<String, StageNode>,
    edges: HashMap<String, Transition>,
    /// node id -> id of its single outgoing edge
    outgoing: HashMap<String, String>,
    /// stage id -> id of its single incoming edge
    incoming: HashMap<String, String>,
    /// Candidates whose current-stage id resolved to no node during
    /// reconstruction. Kept visible rather than dropped; never turned into
    /// phantom nodes.
    orphans: Vec<Candidate>,
}

impl PipelineGraph {
    pub fn new(job_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            nodes: HashMap::new(),
            edges: HashMap::new(),
            outgoing: HashMap::new(),
            incoming: HashMap::new(),
            orphans: Vec::new(),
        }
    }

    /// Id of the synthetic job node heading the chain.
    pub fn job_node_id(&self) -> String {
        format!("job-{}", self.job_id)
    }

    /// The entry stage (target of the job node's outgoing edge), if any.
    pub fn entry_stage(&self) -> Option<&StageNode> {
        let edge_id = self.outgoing.get(&self.job_node_id())?;
        let edge = self.edges.get(edge_id)?;
        self.nodes.get(&edge.target)
    }

    pub fn stage_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn contains_stage(&self, stage_id: &str) -> bool {
        self.nodes.contains_key(stage_id)
    }

    pub fn node(&self, stage_id: &str) -> Option<&StageNode> {
        self.nodes.get(stage_id)
    }

    pub fn node_mut(&mut self, stage_id: &str) -> Option<&mut StageNode> {
        self.nodes.get_mut(stage_id)
    }

    pub fn require_node(&self, stage_id: &str) -> Result<&StageNode> {
        self.nodes
            .get(stage_id)
            .ok_or_else(|| PipelineError::StageNotFound(stage_id.to_string()))
    }

    pub fn edge(&self, edge_id: &str) -> Option<&Transition> {
        self.edges.get(edge_id)
    }

    pub fn edges(&self) -> impl Iterator<Item = &Transition> {
        self.edges.values()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &StageNode> {
        self.nodes.values()
    }

    /// Single outgoing edge from a node, if any. `None` marks a terminal
    /// stage.
    pub fn outgoing_edge(&self, node_id: &str) -> Option<&Transition> {
        self.outgoing
            .get(node_id)
            .and_then(|edge_id| self.edges.get(edge_id))
    }

    /// Single incoming edge of a stage, if any.
    pub fn incoming_edge(&self, stage_id: &str) -> Option<&Transition> {
        self.incoming
            .get(stage_id)
            .and_then(|edge_id| self.edges.get(edge_id))
    }

    pub fn add_node(&mut self, node: StageNode) {
        self.nodes.insert(node.id.clone(), node);
    }

    /// Insert an edge, maintaining the adjacency maps.
    pub fn add_edge(&mut self, edge: Transition) {
        self.outgoing.insert(edge.source.clone(), edge.id.clone());
        self.incoming.insert(edge.target.clone(), edge.id.clone());
        self.edges.insert(edge.id.clone(), edge);
    }

    /// Remove an edge and its adjacency entries. Returns the removed edge.
    pub fn remove_edge(&mut self, edge_id: &str) -> Option<Transition> {
        let edge = self.edges.remove(edge_id)?;
        if self.outgoing.get(&edge.source) == Some(&edge.id) {
            self.outgoing.remove(&edge.source);
        }
        if self.incoming.get(&edge.target) == Some(&edge.id) {
            self.incoming.remove(&edge.target);
        }
        Some(edge)
    }

    pub(crate) fn remove_node(&mut self, stage_id: &str) -> Option<StageNode> {
        self.nodes.remove(stage_id)
    }

    pub(crate) fn orphans_mut(&mut self) -> &mut Vec<Candidate> {
        &mut self.orphans
    }

    /// Candidates that could not be attached to any node at reconstruction.
    pub fn orphans(&self) -> &[Candidate] {
        &self.orphans
    }

    /// Stages in chain order, walking outgoing edges from the job node.
    pub fn stages_in_order(&self) -> Vec<&StageNode> {
        let mut ordered = Vec::with_capacity(self.nodes.len());
        let mut cursor = self.job_node_id();
        // Bounded walk: a corrupt snapshot with a cycle must not hang us.
        while ordered.len() <= self.nodes.len() {
            let Some(edge) = self.outgoing_edge(&cursor) else {
                break;
            };
            match self.nodes.get(&edge.target) {
                Some(node) => {
                    ordered.push(node);
                    cursor = node.id.clone();
                }
                None => break,
            }
        }
        ordered
    }

    /// Whether every stage is reachable from the job node and no edge
    /// dangles. A single-chain graph is connected exactly when the walk
    /// covers all nodes and all edges.
    pub fn is_connected(&self) -> bool {
        let reachable = self.stages_in_order().len();
        reachable == self.nodes.len() && self.edges.len() == reachable
    }

    /// Sum of candidates across all stage nodes. The job's applicant count
    /// is kept equal to this after every transition.
    pub fn total_candidates(&self) -> usize {
        self.nodes.values().map(StageNode::candidate_count).sum()
    }

    /// The stage currently holding a candidate, found by scanning node
    /// candidate sets (used for consistency checks, not hot paths).
    pub fn stage_of_candidate(&self, candidate_id: &str) -> Option<&StageNode> {
        self.nodes.values().find(|n| n.has_candidate(candidate_id))
    }

    /// Highest persisted `order` across stages, or 0 for an empty graph.
    pub fn max_order(&self) -> u32 {
        self.nodes.values().map(|n| n.order).max().unwrap_or(0)
    }

    /// Record a user-dragged position. Pinned nodes keep their place on
    /// incremental layout refresh.
    pub fn pin_position(&mut self, stage_id: &str, position: crate::models::Position) -> Result<()> {
        let node = self
            .nodes
            .get_mut(stage_id)
            .ok_or_else(|| PipelineError::StageNotFound(stage_id.to_string()))?;
        node.position = position;
        node.pinned = true;
        Ok(())
    }
}
