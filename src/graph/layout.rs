//! Position layout engine
//!
//! Stage nodes stack vertically: each node's height grows with its
//! candidate count and a running offset places the next node below it.
//! Horizontal position is never touched here; only stage insertion adjusts
//! x. Two refresh modes:
//! - full rebuild after any structural change (every node repositioned)
//! - incremental refresh after a candidate-only change (vertical offsets
//!   only, user-pinned nodes left where they are) so routine data refresh
//!   never makes nodes jump.

use serde::{Deserialize, Serialize};

use crate::graph::PipelineGraph;

/// Tunable layout geometry, loaded from `hireflow.toml` when present.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Minimum height of a stage node.
    pub base_height: f64,
    /// Extra height per attached candidate.
    pub candidate_height: f64,
    /// Vertical gap between consecutive stage nodes.
    pub stage_spacing: f64,
    /// Horizontal shift applied to downstream columns on insertion.
    pub column_offset: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            base_height: 120.0,
            candidate_height: 56.0,
            stage_spacing: 48.0,
            column_offset: 280.0,
        }
    }
}

impl LayoutConfig {
    pub fn node_height(&self, candidate_count: usize) -> f64 {
        self.base_height
            .max(candidate_count as f64 * self.candidate_height)
    }
}

/// Full rebuild: recompute every node's vertical position from scratch.
/// Clears user pins, since a structural change invalidates manual layout.
pub fn recompute_layout(graph: &mut PipelineGraph, config: &LayoutConfig) {
    let ordered: Vec<String> = graph.stages_in_order().iter().map(|n| n.id.clone()).collect();
    let mut offset = 0.0;
    for stage_id in ordered {
        if let Some(node) = graph.node_mut(&stage_id) {
            let height = config.node_height(node.candidate_count());
            node.position.y = offset;
            node.pinned = false;
            offset += height + config.stage_spacing;
        }
    }
}

/// Incremental refresh: reflow vertical offsets from candidate counts but
/// leave any user-pinned node untouched. The running offset still advances
/// past pinned nodes so their neighbours keep sensible spacing.
pub fn refresh_layout(graph: &mut PipelineGraph, config: &LayoutConfig) {
    let ordered: Vec<String> = graph.stages_in_order().iter().map(|n| n.id.clone()).collect();
    let mut offset = 0.0;
    for stage_id in ordered {
        if let Some(node) = graph.node_mut(&stage_id) {
            let height = config.node_height(node.candidate_count());
            if !node.pinned {
                node.position.y = offset;
            }
            offset += height + config.stage_spacing;
        }
    }
}
