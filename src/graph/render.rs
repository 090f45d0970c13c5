//! Render model for the presentation layer
//!
//! Flattens the live graph into `{ nodes, edges }` the canvas can draw
//! directly: one job header node plus one node per stage, each carrying
//! the data its card needs (counts, assessment badge state).

use serde::Serialize;

use crate::graph::{EdgeKind, LayoutConfig, PipelineGraph};
use crate::models::{Job, Position};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RenderNodeKind {
    Job,
    Stage,
    StageWithCandidates,
    StageWithAssessment,
}

#[derive(Debug, Clone, Serialize)]
pub struct RenderNode {
    pub id: String,
    pub kind: RenderNodeKind,
    pub position: Position,
    pub data: serde_json::Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct RenderEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    pub kind: EdgeKind,
}

#[derive(Debug, Clone, Serialize)]
pub struct RenderModel {
    pub nodes: Vec<RenderNode>,
    pub edges: Vec<RenderEdge>,
}

impl RenderModel {
    pub fn build(job: &Job, graph: &PipelineGraph, config: &LayoutConfig) -> Self {
        let mut nodes = Vec::with_capacity(graph.stage_count() + 1);

        // The job header sits one column left of the entry stage.
        let job_x = graph
            .entry_stage()
            .map(|entry| entry.position.x - config.column_offset)
            .unwrap_or_default();
        nodes.push(RenderNode {
            id: graph.job_node_id(),
            kind: RenderNodeKind::Job,
            position: Position::new(job_x, 0.0),
            data: serde_json::json!({
                "title": job.title,
                "status": job.status,
                "applicantCount": job.applicant_count,
            }),
        });

        for stage in graph.stages_in_order() {
            let kind = if stage.assessment().is_some() {
                RenderNodeKind::StageWithAssessment
            } else if stage.candidate_count() > 0 {
                RenderNodeKind::StageWithCandidates
            } else {
                RenderNodeKind::Stage
            };
            let candidates: Vec<serde_json::Value> = stage
                .candidates()
                .iter()
                .map(|c| {
                    let completed = stage
                        .completion(&c.id)
                        .map(|status| status.completed)
                        .unwrap_or(false);
                    serde_json::json!({
                        "id": c.id,
                        "name": c.name,
                        "assessmentCompleted": completed,
                    })
                })
                .collect();
            nodes.push(RenderNode {
                id: stage.id.clone(),
                kind,
                position: stage.position,
                data: serde_json::json!({
                    "name": stage.name,
                    "order": stage.order,
                    "candidateCount": stage.candidate_count(),
                    "candidates": candidates,
                    "assessment": stage.assessment().map(|a| serde_json::json!({
                        "id": a.id,
                        "title": a.title,
                    })),
                }),
            });
        }

        let mut edges: Vec<RenderEdge> = graph
            .edges()
            .map(|e| RenderEdge {
                id: e.id.clone(),
                source: e.source.clone(),
                target: e.target.clone(),
                kind: e.kind,
            })
            .collect();
        edges.sort_by(|a, b| a.id.cmp(&b.id));

        Self { nodes, edges }
    }
}
