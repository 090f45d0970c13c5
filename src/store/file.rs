//! JSON-file record store
//!
//! Layout under the data dir:
//! - `jobs/{job_id}.json`
//! - `stages/{job_id}/{stage_id}.json`
//! - `candidates/{job_id}/{candidate_id}.json`
//! - `assessments/{job_id}/{assessment_id}.json`
//! - `responses/{assessment_id}/{candidate_id}.json`
//! - `timeline/{candidate_id}.json` (append-only array)
//!
//! One record per file keeps writes small and lockable; all access goes
//! through the fs2-locked helpers in [`super::locking`].

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use super::locking::{read_json, write_json};
use super::{AssessmentStore, CandidateStore, JobStore, StageStore, TimelineLog};
use crate::models::{Assessment, AssessmentResponse, Candidate, Job, StageRecord, TimelineEntry};

const SUBDIRS: [&str; 6] = [
    "jobs",
    "stages",
    "candidates",
    "assessments",
    "responses",
    "timeline",
];

pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Open (creating if needed) a data dir with the expected structure.
    pub fn open(root: &Path) -> Result<Self> {
        for subdir in SUBDIRS {
            let path = root.join(subdir);
            fs::create_dir_all(&path)
                .with_context(|| format!("Failed to create {} directory", path.display()))?;
        }
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    fn job_path(&self, job_id: &str) -> PathBuf {
        self.root.join("jobs").join(format!("{job_id}.json"))
    }

    fn stage_dir(&self, job_id: &str) -> PathBuf {
        self.root.join("stages").join(job_id)
    }

    fn candidate_dir(&self, job_id: &str) -> PathBuf {
        self.root.join("candidates").join(job_id)
    }

    fn assessment_dir(&self, job_id: &str) -> PathBuf {
        self.root.join("assessments").join(job_id)
    }

    fn response_path(&self, assessment_id: &str, candidate_id: &str) -> PathBuf {
        self.root
            .join("responses")
            .join(assessment_id)
            .join(format!("{candidate_id}.json"))
    }

    fn timeline_path(&self, candidate_id: &str) -> PathBuf {
        self.root
            .join("timeline")
            .join(format!("{candidate_id}.json"))
    }

    /// Read every `.json` record in a directory. A missing directory is an
    /// empty list, not an error.
    fn read_dir_records<T: serde::de::DeserializeOwned>(dir: &Path) -> Result<Vec<T>> {
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut records = Vec::new();
        let entries = fs::read_dir(dir)
            .with_context(|| format!("Failed to read directory: {}", dir.display()))?;
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|s| s.to_str()) != Some("json") {
                continue;
            }
            records.push(read_json(&path)?);
        }
        Ok(records)
    }
}

impl JobStore for FileStore {
    fn get_job(&self, job_id: &str) -> Result<Option<Job>> {
        let path = self.job_path(job_id);
        if !path.exists() {
            return Ok(None);
        }
        read_json(&path).map(Some)
    }

    fn create_job(&self, job: &Job) -> Result<()> {
        write_json(&self.job_path(&job.id), job)
    }

    fn update_job(&self, job: &Job) -> Result<()> {
        write_json(&self.job_path(&job.id), job)
    }

    fn list_jobs(&self) -> Result<Vec<Job>> {
        let mut jobs: Vec<Job> = Self::read_dir_records(&self.root.join("jobs"))?;
        jobs.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(jobs)
    }
}

impl StageStore for FileStore {
    fn list_stages(&self, job_id: &str) -> Result<Vec<StageRecord>> {
        let mut stages: Vec<StageRecord> = Self::read_dir_records(&self.stage_dir(job_id))?;
        stages.sort_by_key(|s| s.order);
        Ok(stages)
    }

    fn create_stage(&self, record: &StageRecord) -> Result<()> {
        let dir = self.stage_dir(&record.job_id);
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create stage directory: {}", dir.display()))?;
        write_json(&dir.join(format!("{}.json", record.id)), record)
    }

    fn update_stage(&self, record: &StageRecord) -> Result<()> {
        self.create_stage(record)
    }

    fn delete_stage(&self, job_id: &str, stage_id: &str) -> Result<()> {
        let path = self.stage_dir(job_id).join(format!("{stage_id}.json"));
        if path.exists() {
            fs::remove_file(&path)
                .with_context(|| format!("Failed to delete stage record: {}", path.display()))?;
        }
        Ok(())
    }
}

impl CandidateStore for FileStore {
    fn list_candidates_by_job(&self, job_id: &str) -> Result<Vec<Candidate>> {
        let mut candidates: Vec<Candidate> =
            Self::read_dir_records(&self.candidate_dir(job_id))?;
        candidates.sort_by(|a, b| a.applied_at.cmp(&b.applied_at).then(a.id.cmp(&b.id)));
        Ok(candidates)
    }

    fn create_candidate(&self, candidate: &Candidate) -> Result<()> {
        let dir = self.candidate_dir(&candidate.job_id);
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create candidate directory: {}", dir.display()))?;
        write_json(&dir.join(format!("{}.json", candidate.id)), candidate)
    }

    fn update_candidate_stage(&self, candidate_id: &str, stage_id: &str) -> Result<()> {
        // Candidate files are per-job; scan job dirs for the record.
        let base = self.root.join("candidates");
        if base.exists() {
            for entry in fs::read_dir(&base)? {
                let path = entry?.path().join(format!("{candidate_id}.json"));
                if path.exists() {
                    let mut candidate: Candidate = read_json(&path)?;
                    candidate.stage_id = stage_id.to_string();
                    return write_json(&path, &candidate);
                }
            }
        }
        anyhow::bail!("candidate record not found: {candidate_id}")
    }
}

impl AssessmentStore for FileStore {
    fn list_assessments_by_job(&self, job_id: &str) -> Result<Vec<Assessment>> {
        Self::read_dir_records(&self.assessment_dir(job_id))
    }

    fn create_assessment(&self, assessment: &Assessment) -> Result<()> {
        let dir = self.assessment_dir(&assessment.job_id);
        fs::create_dir_all(&dir).with_context(|| {
            format!("Failed to create assessment directory: {}", dir.display())
        })?;
        write_json(&dir.join(format!("{}.json", assessment.id)), assessment)
    }

    fn update_assessment(&self, assessment: &Assessment) -> Result<()> {
        self.create_assessment(assessment)
    }

    fn get_response(
        &self,
        assessment_id: &str,
        candidate_id: &str,
    ) -> Result<Option<AssessmentResponse>> {
        let path = self.response_path(assessment_id, candidate_id);
        if !path.exists() {
            return Ok(None);
        }
        read_json(&path).map(Some)
    }

    fn list_responses(&self, assessment_id: &str) -> Result<Vec<AssessmentResponse>> {
        Self::read_dir_records(&self.root.join("responses").join(assessment_id))
    }

    fn record_response(&self, response: &AssessmentResponse) -> Result<()> {
        let path = self.response_path(&response.assessment_id, &response.candidate_id);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create response directory: {}", parent.display())
            })?;
        }
        write_json(&path, response)
    }
}

impl TimelineLog for FileStore {
    fn append(&self, entry: &TimelineEntry) -> Result<()> {
        let path = self.timeline_path(&entry.candidate_id);
        let mut entries: Vec<TimelineEntry> = if path.exists() {
            read_json(&path)?
        } else {
            Vec::new()
        };
        entries.push(entry.clone());
        write_json(&path, &entries)
    }

    fn list(&self, candidate_id: &str) -> Result<Vec<TimelineEntry>> {
        let path = self.timeline_path(candidate_id);
        if !path.exists() {
            return Ok(Vec::new());
        }
        read_json(&path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{StageKind, TimelineAction};

    #[test]
    fn test_job_round_trip() {
        let temp = tempfile::tempdir().unwrap();
        let store = FileStore::open(temp.path()).unwrap();

        let job = Job::new("job-1".to_string(), "Backend Engineer".to_string());
        store.create_job(&job).unwrap();

        let loaded = store.get_job("job-1").unwrap().unwrap();
        assert_eq!(loaded.title, "Backend Engineer");
        assert!(store.get_job("job-404").unwrap().is_none());
    }

    #[test]
    fn test_stage_listing_sorted_by_order() {
        let temp = tempfile::tempdir().unwrap();
        let store = FileStore::open(temp.path()).unwrap();

        for (id, order, name) in [("stage-2", 1, "Screening"), ("stage-1", 0, "Applied")] {
            store
                .create_stage(&StageRecord::new(
                    id.to_string(),
                    "job-1".to_string(),
                    name.to_string(),
                    order,
                    StageKind::Default,
                ))
                .unwrap();
        }

        let stages = store.list_stages("job-1").unwrap();
        assert_eq!(stages.len(), 2);
        assert_eq!(stages[0].name, "Applied");

        store.delete_stage("job-1", "stage-1").unwrap();
        assert_eq!(store.list_stages("job-1").unwrap().len(), 1);
    }

    #[test]
    fn test_timeline_appends_in_order() {
        let temp = tempfile::tempdir().unwrap();
        let store = FileStore::open(temp.path()).unwrap();

        for to in ["stage-2", "stage-3"] {
            store
                .append(&TimelineEntry::transition(
                    "c1".to_string(),
                    TimelineAction::Advanced,
                    "stage-1".to_string(),
                    to.to_string(),
                    "recruiter".to_string(),
                ))
                .unwrap();
        }

        let entries = store.list("c1").unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].to_stage, "stage-3");
    }

    #[test]
    fn test_update_candidate_stage_rewrites_record() {
        let temp = tempfile::tempdir().unwrap();
        let store = FileStore::open(temp.path()).unwrap();

        let candidate = Candidate::new("job-1".to_string(), "stage-1".to_string(), "Ada".to_string());
        store.create_candidate(&candidate).unwrap();

        store
            .update_candidate_stage(&candidate.id, "stage-2")
            .unwrap();
        let listed = store.list_candidates_by_job("job-1").unwrap();
        assert_eq!(listed[0].stage_id, "stage-2");
    }
}
