//! Node and edge types for the live pipeline graph

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::models::{Assessment, Candidate, Position, ResponseStatus, StageKind};

/// A directed connection between two nodes.
///
/// `Linear` edges carry the "add stage on this edge" affordance in the
/// presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    #[default]
    Linear,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub kind: EdgeKind,
}

impl Transition {
    pub fn linear(source: String, target: String) -> Self {
        Self {
            id: format!("e-{source}-{target}"),
            source,
            target,
            kind: EdgeKind::Linear,
        }
    }
}

/// Stage-kind-specific payload of a node.
///
/// Modeled as a sum type: a default stage only holds candidates, an
/// assessment stage additionally carries its definition and per-candidate
/// completion lookups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum NodeBody {
    Default {
        candidates: Vec<Candidate>,
    },
    Assessment {
        candidates: Vec<Candidate>,
        assessment: Assessment,
        #[serde(default)]
        completion: HashMap<String, ResponseStatus>,
    },
}

impl NodeBody {
    pub fn empty_default() -> Self {
        NodeBody::Default {
            candidates: Vec::new(),
        }
    }
}

/// A stage node of the live graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageNode {
    pub id: String,
    pub name: String,
    /// Persisted fallback ordering; independent of visual position.
    pub order: u32,
    pub position: Position,
    /// Set when the user manually placed this node; incremental layout
    /// refresh leaves pinned nodes where they are.
    #[serde(default)]
    pub pinned: bool,
    #[serde(flatten)]
    pub body: NodeBody,
}

impl StageNode {
    pub fn new(id: String, name: String, order: u32) -> Self {
        Self {
            id,
            name,
            order,
            position: Position::default(),
            pinned: false,
            body: NodeBody::empty_default(),
        }
    }

    pub fn into_positioned(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    pub fn kind(&self) -> StageKind {
        match self.body {
            NodeBody::Default { .. } => StageKind::Default,
            NodeBody::Assessment { .. } => StageKind::Assessment,
        }
    }

    pub fn candidates(&self) -> &[Candidate] {
        match &self.body {
            NodeBody::Default { candidates } => candidates,
            NodeBody::Assessment { candidates, .. } => candidates,
        }
    }

    pub fn candidates_mut(&mut self) -> &mut Vec<Candidate> {
        match &mut self.body {
            NodeBody::Default { candidates } => candidates,
            NodeBody::Assessment { candidates, .. } => candidates,
        }
    }

    pub fn candidate_count(&self) -> usize {
        self.candidates().len()
    }

    pub fn has_candidate(&self, candidate_id: &str) -> bool {
        self.candidates().iter().any(|c| c.id == candidate_id)
    }

    pub fn assessment(&self) -> Option<&Assessment> {
        match &self.body {
            NodeBody::Default { .. } => None,
            NodeBody::Assessment { assessment, .. } => Some(assessment),
        }
    }

    /// Completion status for a candidate, if this is an assessment stage
    /// and a lookup was recorded.
    pub fn completion(&self, candidate_id: &str) -> Option<ResponseStatus> {
        match &self.body {
            NodeBody::Default { .. } => None,
            NodeBody::Assessment { completion, .. } => completion.get(candidate_id).copied(),
        }
    }

    /// Attach an assessment definition, converting a default node in place.
    /// Re-attaching replaces the prior definition; candidates and recorded
    /// completion lookups are preserved.
    pub fn set_assessment(
        &mut self,
        assessment: Assessment,
        completion: HashMap<String, ResponseStatus>,
    ) {
        let candidates = std::mem::take(self.candidates_mut());
        self.body = NodeBody::Assessment {
            candidates,
            assessment,
            completion,
        };
    }
}
