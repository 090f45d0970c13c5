//! Cached flow snapshot
//!
//! A single JSON document `{ nodes, edges }` stored on the Job record.
//! Once present it is the authoritative representation of the pipeline
//! until a structural mutation replaces it: reconstruction trusts it
//! verbatim without merging against the stage table.

use serde::{Deserialize, Serialize};

use crate::graph::{PipelineGraph, StageNode, Transition};

/// The persisted node/edge graph with visual positions.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FlowSnapshot {
    #[serde(default)]
    pub nodes: Vec<StageNode>,
    #[serde(default)]
    pub edges: Vec<Transition>,
}

impl FlowSnapshot {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Capture the current graph. Nodes are emitted in chain order so the
    /// document diffs cleanly across persists.
    pub fn capture(graph: &PipelineGraph) -> Self {
        let mut nodes: Vec<StageNode> = graph.stages_in_order().into_iter().cloned().collect();
        // A disconnected graph should never be persisted, but if the walk
        // missed nodes, keep them rather than lose data.
        if nodes.len() < graph.stage_count() {
            let mut missing: Vec<StageNode> = graph
                .nodes()
                .filter(|n| !nodes.iter().any(|seen| seen.id == n.id))
                .cloned()
                .collect();
            missing.sort_by_key(|n| n.order);
            nodes.extend(missing);
        }
        let mut edges: Vec<Transition> = graph.edges().cloned().collect();
        edges.sort_by(|a, b| a.id.cmp(&b.id));
        Self { nodes, edges }
    }

    /// Rehydrate the live graph. The snapshot is trusted directly; the
    /// caller falls back to the stage table when this returns an error.
    pub fn restore(&self, job_id: &str) -> anyhow::Result<PipelineGraph> {
        let mut graph = PipelineGraph::new(job_id);
        for node in &self.nodes {
            graph.add_node(node.clone());
        }
        for edge in &self.edges {
            let source_known =
                edge.source == graph.job_node_id() || graph.contains_stage(&edge.source);
            if !source_known || !graph.contains_stage(&edge.target) {
                anyhow::bail!(
                    "snapshot edge '{}' references an unknown node ({} -> {})",
                    edge.id,
                    edge.source,
                    edge.target
                );
            }
            graph.add_edge(edge.clone());
        }
        if !graph.is_connected() {
            anyhow::bail!("snapshot graph is not a connected chain");
        }
        Ok(graph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Transition;
    use crate::graph::StageNode;

    fn chain(job_id: &str, names: &[&str]) -> PipelineGraph {
        let mut graph = PipelineGraph::new(job_id);
        let mut prev = graph.job_node_id();
        for (i, name) in names.iter().enumerate() {
            let id = format!("stage-{}", i + 1);
            graph.add_node(StageNode::new(id.clone(), name.to_string(), i as u32));
            graph.add_edge(Transition::linear(prev, id.clone()));
            prev = id;
        }
        graph
    }

    #[test]
    fn test_capture_restore_round_trip() {
        let graph = chain("job-1", &["Applied", "Screening", "Interview"]);
        let snapshot = FlowSnapshot::capture(&graph);
        assert_eq!(snapshot.nodes.len(), 3);
        assert_eq!(snapshot.edges.len(), 3);

        let restored = snapshot.restore("job-1").unwrap();
        assert_eq!(restored, graph);
    }

    #[test]
    fn test_round_trip_through_json() {
        let graph = chain("job-1", &["Applied", "Screening"]);
        let snapshot = FlowSnapshot::capture(&graph);
        let json = serde_json::to_string(&snapshot).unwrap();
        let decoded: FlowSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, snapshot);
        assert_eq!(decoded.restore("job-1").unwrap(), graph);
    }

    #[test]
    fn test_restore_rejects_dangling_edge() {
        let graph = chain("job-1", &["Applied"]);
        let mut snapshot = FlowSnapshot::capture(&graph);
        snapshot.edges.push(Transition::linear(
            "stage-1".to_string(),
            "stage-99".to_string(),
        ));
        assert!(snapshot.restore("job-1").is_err());
    }
}
