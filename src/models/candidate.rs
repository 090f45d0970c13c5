use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A candidate in a job's pipeline.
///
/// Created once at application time in the job's entry stage. This
/// subsystem only ever reassigns `stage_id` (plus a timeline append);
/// deletion and archival are handled elsewhere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: String,
    pub job_id: String,
    /// Current stage; must resolve to an existing stage of the same job.
    pub stage_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub applied_at: DateTime<Utc>,
}

impl Candidate {
    pub fn new(job_id: String, stage_id: String, name: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            job_id,
            stage_id,
            name,
            email: None,
            applied_at: Utc::now(),
        }
    }

    pub fn with_email(mut self, email: String) -> Self {
        self.email = Some(email);
        self
    }
}
