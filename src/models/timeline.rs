use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Action recorded on a candidate's timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimelineAction {
    /// Candidate applied and entered the job's entry stage.
    Applied,
    /// Candidate moved along the single outgoing edge of their stage.
    Advanced,
    /// Candidate reassigned to an arbitrary stage of the same job.
    Moved,
}

impl std::fmt::Display for TimelineAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimelineAction::Applied => write!(f, "applied"),
            TimelineAction::Advanced => write!(f, "advanced"),
            TimelineAction::Moved => write!(f, "moved"),
        }
    }
}

/// One append-only history event for a candidate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub candidate_id: String,
    pub action: TimelineAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_stage: Option<String>,
    pub to_stage: String,
    pub actor: String,
    pub at: DateTime<Utc>,
}

impl TimelineEntry {
    pub fn transition(
        candidate_id: String,
        action: TimelineAction,
        from_stage: String,
        to_stage: String,
        actor: String,
    ) -> Self {
        Self {
            candidate_id,
            action,
            from_stage: Some(from_stage),
            to_stage,
            actor,
            at: Utc::now(),
        }
    }
}
