use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::snapshot::FlowSnapshot;

/// Lifecycle status of a job opening.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    #[default]
    Open,
    Paused,
    Closed,
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Open => write!(f, "open"),
            JobStatus::Paused => write!(f, "paused"),
            JobStatus::Closed => write!(f, "closed"),
        }
    }
}

/// A job opening with its cached pipeline snapshot.
///
/// `flow_snapshot`, when present, is the authoritative serialized form of
/// the stage graph until a structural mutation replaces it. `applicant_count`
/// is a derived aggregate kept equal to the sum of candidates across stage
/// nodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub title: String,
    pub status: JobStatus,
    #[serde(default)]
    pub applicant_count: usize,
    /// Highest stage-id suffix ever allocated for this job. Outlives the
    /// stage records so deleted ids are never handed out again.
    #[serde(default)]
    pub stage_counter: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow_snapshot: Option<FlowSnapshot>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    pub fn new(id: String, title: String) -> Self {
        let now = Utc::now();
        Self {
            id,
            title,
            status: JobStatus::Open,
            applicant_count: 0,
            stage_counter: 0,
            flow_snapshot: None,
            created_at: now,
            updated_at: now,
        }
    }
}
