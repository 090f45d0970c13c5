//! Pipeline error taxonomy
//!
//! Structural-mutation errors are synchronous and block the requested
//! action. Persistence failures keep the last known good in-memory graph
//! and are reported without discarding user-visible state. Nothing here
//! is process-fatal: worst case a job falls back to an empty pipeline.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, PipelineError>;

#[derive(Error, Debug)]
pub enum PipelineError {
    /// Delete blocked because candidates still occupy the stage.
    #[error("stage '{stage_id}' still has {occupants} candidate(s) and cannot be deleted")]
    StageNotEmpty { stage_id: String, occupants: usize },

    #[error("stage not found: {0}")]
    StageNotFound(String),

    #[error("edge not found: {0}")]
    EdgeNotFound(String),

    /// Arbitrary move targeting a stage outside the job's graph.
    #[error("stage '{stage_id}' is not part of job '{job_id}'")]
    InvalidTarget { stage_id: String, job_id: String },

    #[error("assessment not found: {0}")]
    AssessmentNotFound(String),

    #[error("job not found: {0}")]
    JobNotFound(String),

    /// A store write failed. The in-memory graph was rolled back to the
    /// last persisted state before this was raised.
    #[error("persistence failed: {0}")]
    Persistence(#[source] anyhow::Error),

    /// Neither the cached snapshot nor the stage-table fallback produced a
    /// usable graph.
    #[error("could not reconstruct pipeline for job '{job_id}': {reason}")]
    Reconstruction { job_id: String, reason: String },
}

impl PipelineError {
    /// Whether the caller's in-memory state is still valid after this error.
    ///
    /// Structural errors reject the request up front; persistence errors
    /// roll back first. Either way the last known good graph survives.
    pub fn preserves_state(&self) -> bool {
        !matches!(self, PipelineError::Reconstruction { .. })
    }
}
