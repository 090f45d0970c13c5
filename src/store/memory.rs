//! In-memory store for tests
//!
//! Mirrors the file store's semantics, plus a write-failure toggle so the
//! engine's optimistic-apply/rollback path can be exercised directly.

use anyhow::Result;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use super::{AssessmentStore, CandidateStore, JobStore, StageStore, TimelineLog};
use crate::models::{Assessment, AssessmentResponse, Candidate, Job, StageRecord, TimelineEntry};

#[derive(Default)]
struct Inner {
    jobs: HashMap<String, Job>,
    /// Keyed by (job_id, stage_id): stage ids are only unique within a job.
    stages: HashMap<(String, String), StageRecord>,
    candidates: HashMap<String, Candidate>,
    assessments: HashMap<String, Assessment>,
    responses: HashMap<(String, String), AssessmentResponse>,
    timeline: HashMap<String, Vec<TimelineEntry>>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail, to drive rollback tests.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_write(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            anyhow::bail!("simulated store write failure");
        }
        Ok(())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // Lock poisoning only happens if a test thread panicked mid-write;
        // recover the data rather than cascading the panic.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl JobStore for MemoryStore {
    fn get_job(&self, job_id: &str) -> Result<Option<Job>> {
        Ok(self.lock().jobs.get(job_id).cloned())
    }

    fn create_job(&self, job: &Job) -> Result<()> {
        self.check_write()?;
        self.lock().jobs.insert(job.id.clone(), job.clone());
        Ok(())
    }

    fn update_job(&self, job: &Job) -> Result<()> {
        self.create_job(job)
    }

    fn list_jobs(&self) -> Result<Vec<Job>> {
        let mut jobs: Vec<Job> = self.lock().jobs.values().cloned().collect();
        jobs.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(jobs)
    }
}

impl StageStore for MemoryStore {
    fn list_stages(&self, job_id: &str) -> Result<Vec<StageRecord>> {
        let mut stages: Vec<StageRecord> = self
            .lock()
            .stages
            .values()
            .filter(|s| s.job_id == job_id)
            .cloned()
            .collect();
        stages.sort_by_key(|s| s.order);
        Ok(stages)
    }

    fn create_stage(&self, record: &StageRecord) -> Result<()> {
        self.check_write()?;
        self.lock()
            .stages
            .insert((record.job_id.clone(), record.id.clone()), record.clone());
        Ok(())
    }

    fn update_stage(&self, record: &StageRecord) -> Result<()> {
        self.create_stage(record)
    }

    fn delete_stage(&self, job_id: &str, stage_id: &str) -> Result<()> {
        self.check_write()?;
        self.lock()
            .stages
            .remove(&(job_id.to_string(), stage_id.to_string()));
        Ok(())
    }
}

impl CandidateStore for MemoryStore {
    fn list_candidates_by_job(&self, job_id: &str) -> Result<Vec<Candidate>> {
        let mut candidates: Vec<Candidate> = self
            .lock()
            .candidates
            .values()
            .filter(|c| c.job_id == job_id)
            .cloned()
            .collect();
        candidates.sort_by(|a, b| a.applied_at.cmp(&b.applied_at).then(a.id.cmp(&b.id)));
        Ok(candidates)
    }

    fn create_candidate(&self, candidate: &Candidate) -> Result<()> {
        self.check_write()?;
        self.lock()
            .candidates
            .insert(candidate.id.clone(), candidate.clone());
        Ok(())
    }

    fn update_candidate_stage(&self, candidate_id: &str, stage_id: &str) -> Result<()> {
        self.check_write()?;
        let mut inner = self.lock();
        match inner.candidates.get_mut(candidate_id) {
            Some(candidate) => {
                candidate.stage_id = stage_id.to_string();
                Ok(())
            }
            None => anyhow::bail!("candidate record not found: {candidate_id}"),
        }
    }
}

impl AssessmentStore for MemoryStore {
    fn list_assessments_by_job(&self, job_id: &str) -> Result<Vec<Assessment>> {
        Ok(self
            .lock()
            .assessments
            .values()
            .filter(|a| a.job_id == job_id)
            .cloned()
            .collect())
    }

    fn create_assessment(&self, assessment: &Assessment) -> Result<()> {
        self.check_write()?;
        self.lock()
            .assessments
            .insert(assessment.id.clone(), assessment.clone());
        Ok(())
    }

    fn update_assessment(&self, assessment: &Assessment) -> Result<()> {
        self.create_assessment(assessment)
    }

    fn get_response(
        &self,
        assessment_id: &str,
        candidate_id: &str,
    ) -> Result<Option<AssessmentResponse>> {
        Ok(self
            .lock()
            .responses
            .get(&(assessment_id.to_string(), candidate_id.to_string()))
            .cloned())
    }

    fn list_responses(&self, assessment_id: &str) -> Result<Vec<AssessmentResponse>> {
        Ok(self
            .lock()
            .responses
            .values()
            .filter(|r| r.assessment_id == assessment_id)
            .cloned()
            .collect())
    }

    fn record_response(&self, response: &AssessmentResponse) -> Result<()> {
        self.check_write()?;
        self.lock().responses.insert(
            (response.assessment_id.clone(), response.candidate_id.clone()),
            response.clone(),
        );
        Ok(())
    }
}

impl TimelineLog for MemoryStore {
    fn append(&self, entry: &TimelineEntry) -> Result<()> {
        self.check_write()?;
        self.lock()
            .timeline
            .entry(entry.candidate_id.clone())
            .or_default()
            .push(entry.clone());
        Ok(())
    }

    fn list(&self, candidate_id: &str) -> Result<Vec<TimelineEntry>> {
        Ok(self
            .lock()
            .timeline
            .get(candidate_id)
            .cloned()
            .unwrap_or_default())
    }
}
