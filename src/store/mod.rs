//! Record stores backing the pipeline engine
//!
//! The engine talks to its collaborators only through these traits: the
//! normalized stage table, the job record (with its cached snapshot), the
//! candidate list, assessment definitions/responses, and the append-only
//! timeline log. Two implementations ship here: a JSON-file store for the
//! CLI and an in-memory store for tests (with a write-failure toggle to
//! exercise rollback).

pub mod file;
pub mod locking;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use std::sync::Arc;

use anyhow::Result;
use std::path::Path;

use crate::models::{Assessment, AssessmentResponse, Candidate, Job, StageRecord, TimelineEntry};

pub trait JobStore: Send + Sync {
    fn get_job(&self, job_id: &str) -> Result<Option<Job>>;
    fn create_job(&self, job: &Job) -> Result<()>;
    /// Persist the job record, including its flow snapshot and applicant
    /// count. Last write wins.
    fn update_job(&self, job: &Job) -> Result<()>;
    fn list_jobs(&self) -> Result<Vec<Job>>;
}

pub trait StageStore: Send + Sync {
    fn list_stages(&self, job_id: &str) -> Result<Vec<StageRecord>>;
    fn create_stage(&self, record: &StageRecord) -> Result<()>;
    fn update_stage(&self, record: &StageRecord) -> Result<()>;
    fn delete_stage(&self, job_id: &str, stage_id: &str) -> Result<()>;
}

pub trait CandidateStore: Send + Sync {
    fn list_candidates_by_job(&self, job_id: &str) -> Result<Vec<Candidate>>;
    fn create_candidate(&self, candidate: &Candidate) -> Result<()>;
    fn update_candidate_stage(&self, candidate_id: &str, stage_id: &str) -> Result<()>;
}

pub trait AssessmentStore: Send + Sync {
    fn list_assessments_by_job(&self, job_id: &str) -> Result<Vec<Assessment>>;
    fn create_assessment(&self, assessment: &Assessment) -> Result<()>;
    fn update_assessment(&self, assessment: &Assessment) -> Result<()>;
    fn get_response(
        &self,
        assessment_id: &str,
        candidate_id: &str,
    ) -> Result<Option<AssessmentResponse>>;
    fn list_responses(&self, assessment_id: &str) -> Result<Vec<AssessmentResponse>>;
    fn record_response(&self, response: &AssessmentResponse) -> Result<()>;
}

/// Append-only candidate history.
pub trait TimelineLog: Send + Sync {
    fn append(&self, entry: &TimelineEntry) -> Result<()>;
    fn list(&self, candidate_id: &str) -> Result<Vec<TimelineEntry>>;
}

/// The bundle of store handles the engine is constructed with.
#[derive(Clone)]
pub struct Stores {
    pub jobs: Arc<dyn JobStore>,
    pub stages: Arc<dyn StageStore>,
    pub candidates: Arc<dyn CandidateStore>,
    pub assessments: Arc<dyn AssessmentStore>,
    pub timeline: Arc<dyn TimelineLog>,
}

impl Stores {
    /// File-backed stores rooted at `data_dir`.
    pub fn file(data_dir: &Path) -> Result<Self> {
        let store = Arc::new(FileStore::open(data_dir)?);
        Ok(Self {
            jobs: store.clone(),
            stages: store.clone(),
            candidates: store.clone(),
            assessments: store.clone(),
            timeline: store,
        })
    }

    /// In-memory stores; the returned handle exposes the write-failure
    /// toggle used by rollback tests.
    pub fn memory() -> (Self, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let stores = Self {
            jobs: store.clone(),
            stages: store.clone(),
            candidates: store.clone(),
            assessments: store.clone(),
            timeline: store.clone(),
        };
        (stores, store)
    }
}
