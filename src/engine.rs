//! Pipeline engine service
//!
//! Owns the store handles and the live graph for each job. Every mutation
//! on a job runs under that job's lock, as an atomic sequence of
//! in-memory update on a working copy -> layout recompute -> persistence
//! write; the working copy only replaces the live graph once persistence
//! succeeded, so a failed write rolls back for free and the last known
//! good graph survives. Mutations on different jobs do not contend.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{PipelineError, Result};
use crate::graph::{
    self, CompletionLookup, LayoutConfig, PipelineGraph, RenderModel, StageNode, TransitionOutcome,
};
use crate::ids::StageIdAllocator;
use crate::models::{
    stage::DEFAULT_CHAIN, Assessment, AssessmentResponse, Candidate, Job, Position,
    ResponseStatus, StageKind, StageRecord, TimelineAction, TimelineEntry,
};
use crate::snapshot::FlowSnapshot;
use crate::store::Stores;

struct JobState {
    graph: PipelineGraph,
    allocator: StageIdAllocator,
}

pub struct PipelineEngine {
    stores: Stores,
    layout: LayoutConfig,
    /// One lock per job: structural mutations and candidate transitions on
    /// the same job serialize, different jobs proceed independently.
    jobs: Mutex<HashMap<String, Arc<Mutex<JobState>>>>,
}

impl PipelineEngine {
    pub fn new(stores: Stores, layout: LayoutConfig) -> Self {
        Self {
            stores,
            layout,
            jobs: Mutex::new(HashMap::new()),
        }
    }

    /// Engine over the file-backed stores described by `config`.
    pub fn open(config: &Config) -> anyhow::Result<Self> {
        let stores = Stores::file(&config.data_dir)?;
        Ok(Self::new(stores, config.layout))
    }

    pub fn open_at(data_dir: &Path, layout: LayoutConfig) -> anyhow::Result<Self> {
        Ok(Self::new(Stores::file(data_dir)?, layout))
    }

    // ------------------------------------------------------------------
    // Job lifecycle
    // ------------------------------------------------------------------

    /// Create a job with the default stage chain and persist everything.
    pub fn create_job(&self, title: &str) -> Result<Job> {
        let job_id = format!("job-{}", uuid::Uuid::new_v4());
        let mut allocator = StageIdAllocator::new();
        let mut graph = PipelineGraph::new(job_id.clone());

        let mut prev = graph.job_node_id();
        let mut records = Vec::new();
        for (i, name) in DEFAULT_CHAIN.iter().enumerate() {
            let stage_id = allocator.allocate();
            let position = Position::new((i as f64 + 1.0) * self.layout.column_offset, 0.0);
            let node = StageNode::new(stage_id.clone(), name.to_string(), i as u32)
                .into_positioned(position);
            graph.add_node(node);
            graph.add_edge(graph::Transition::linear(prev, stage_id.clone()));
            records.push(
                StageRecord::new(
                    stage_id.clone(),
                    job_id.clone(),
                    name.to_string(),
                    i as u32,
                    StageKind::Default,
                )
                .with_position(position),
            );
            prev = stage_id;
        }
        graph::recompute_layout(&mut graph, &self.layout);
        for (record, node) in records.iter_mut().zip(graph.stages_in_order()) {
            record.position = node.position;
        }

        let mut job = Job::new(job_id.clone(), title.to_string());
        job.flow_snapshot = Some(FlowSnapshot::capture(&graph));
        job.stage_counter = allocator.high_water();

        self.stores
            .jobs
            .create_job(&job)
            .map_err(PipelineError::Persistence)?;
        for record in &records {
            self.stores
                .stages
                .create_stage(record)
                .map_err(PipelineError::Persistence)?;
        }

        self.jobs.lock().unwrap_or_else(|e| e.into_inner()).insert(
            job_id.clone(),
            Arc::new(Mutex::new(JobState { graph, allocator })),
        );
        info!(job_id = %job.id, title, "created job with default pipeline");
        Ok(job)
    }

    pub fn job(&self, job_id: &str) -> Result<Job> {
        self.stores
            .jobs
            .get_job(job_id)
            .map_err(PipelineError::Persistence)?
            .ok_or_else(|| PipelineError::JobNotFound(job_id.to_string()))
    }

    pub fn list_jobs(&self) -> Result<Vec<Job>> {
        self.stores.jobs.list_jobs().map_err(PipelineError::Persistence)
    }

    /// A copy of the live graph (reconstructing it on first access).
    pub fn graph(&self, job_id: &str) -> Result<PipelineGraph> {
        let slot = self.job_slot(job_id)?;
        let state = slot.lock().unwrap_or_else(|e| e.into_inner());
        Ok(state.graph.clone())
    }

    /// The `{ nodes, edges }` model handed to the presentation layer.
    pub fn render(&self, job_id: &str) -> Result<RenderModel> {
        let job = self.job(job_id)?;
        let graph = self.graph(job_id)?;
        Ok(RenderModel::build(&job, &graph, &self.layout))
    }

    // ------------------------------------------------------------------
    // Stage mutations
    // ------------------------------------------------------------------

    /// Insert a new stage on an existing edge. Returns the new stage id.
    pub fn add_stage(
        &self,
        job_id: &str,
        edge_id: &str,
        name: &str,
        kind: StageKind,
    ) -> Result<String> {
        let slot = self.job_slot(job_id)?;
        let mut state = slot.lock().unwrap_or_else(|e| e.into_inner());

        // Allocate before cloning: even if persistence fails the id is
        // burned, never reused.
        let new_id = state.allocator.allocate();
        let mut working = state.graph.clone();
        graph::insert_on_edge(
            &mut working,
            edge_id,
            new_id.clone(),
            name.to_string(),
            self.layout.column_offset,
        )?;
        graph::recompute_layout(&mut working, &self.layout);

        self.persist_structural(job_id, &working, state.allocator.high_water(), Some((&new_id, kind)))?;
        state.graph = working;
        info!(job_id, stage_id = %new_id, name, "stage inserted");
        Ok(new_id)
    }

    /// Rename a stage. Label-only: no topology, candidate or position
    /// side effects, and no layout recompute.
    pub fn rename_stage(&self, job_id: &str, stage_id: &str, new_name: &str) -> Result<()> {
        let slot = self.job_slot(job_id)?;
        let mut state = slot.lock().unwrap_or_else(|e| e.into_inner());

        let mut working = state.graph.clone();
        graph::rename(&mut working, stage_id, new_name.to_string())?;

        self.persist_structural(job_id, &working, state.allocator.high_water(), None)?;
        state.graph = working;
        Ok(())
    }

    /// Delete an empty stage and re-splice the chain.
    pub fn delete_stage(&self, job_id: &str, stage_id: &str) -> Result<()> {
        let slot = self.job_slot(job_id)?;
        let mut state = slot.lock().unwrap_or_else(|e| e.into_inner());

        let mut working = state.graph.clone();
        graph::delete(&mut working, stage_id)?;
        graph::recompute_layout(&mut working, &self.layout);

        self.persist_structural(job_id, &working, state.allocator.high_water(), None)?;
        state.graph = working;
        info!(job_id, stage_id, "stage deleted");
        Ok(())
    }

    /// Record a drag-released node position; pinned nodes survive
    /// incremental layout refresh untouched.
    pub fn set_stage_position(&self, job_id: &str, stage_id: &str, position: Position) -> Result<()> {
        let slot = self.job_slot(job_id)?;
        let mut state = slot.lock().unwrap_or_else(|e| e.into_inner());

        let mut working = state.graph.clone();
        working.pin_position(stage_id, position)?;

        self.persist_structural(job_id, &working, state.allocator.high_water(), None)?;
        state.graph = working;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Candidates
    // ------------------------------------------------------------------

    /// Register an application: the candidate enters the entry stage.
    pub fn add_candidate(&self, job_id: &str, name: &str, email: Option<&str>) -> Result<Candidate> {
        let slot = self.job_slot(job_id)?;
        let mut state = slot.lock().unwrap_or_else(|e| e.into_inner());

        let entry = state
            .graph
            .entry_stage()
            .ok_or_else(|| PipelineError::Reconstruction {
                job_id: job_id.to_string(),
                reason: "pipeline has no entry stage".to_string(),
            })?;
        let entry_id = entry.id.clone();

        let mut candidate =
            Candidate::new(job_id.to_string(), entry_id.clone(), name.to_string());
        if let Some(email) = email {
            candidate = candidate.with_email(email.to_string());
        }

        let mut working = state.graph.clone();
        if let Some(node) = working.node_mut(&entry_id) {
            node.candidates_mut().push(candidate.clone());
        }
        graph::refresh_layout(&mut working, &self.layout);

        self.stores
            .candidates
            .create_candidate(&candidate)
            .map_err(PipelineError::Persistence)?;
        self.stores
            .timeline
            .append(&TimelineEntry {
                candidate_id: candidate.id.clone(),
                action: TimelineAction::Applied,
                from_stage: None,
                to_stage: entry_id,
                actor: candidate.name.clone(),
                at: Utc::now(),
            })
            .map_err(PipelineError::Persistence)?;
        self.persist_snapshot(job_id, &working, state.allocator.high_water())?;

        state.graph = working;
        info!(job_id, candidate_id = %candidate.id, "candidate applied");
        Ok(candidate)
    }

    /// Advance a candidate along the single outgoing edge of their stage.
    /// Terminal stages and duplicate deliveries are no-ops returning
    /// `None` with state bit-for-bit unchanged.
    pub fn advance(
        &self,
        job_id: &str,
        candidate_id: &str,
        current_stage_id: &str,
        actor: &str,
    ) -> Result<Option<TransitionOutcome>> {
        self.transition(job_id, |working| {
            graph::advance(working, candidate_id, current_stage_id, actor)
        })
    }

    /// Move a candidate to an arbitrary stage of the same job.
    pub fn move_candidate(
        &self,
        job_id: &str,
        source_stage_id: &str,
        candidate_id: &str,
        target_stage_id: &str,
        actor: &str,
    ) -> Result<Option<TransitionOutcome>> {
        self.transition(job_id, |working| {
            graph::move_to_as(working, source_stage_id, candidate_id, target_stage_id, actor)
        })
    }

    fn transition<F>(&self, job_id: &str, apply: F) -> Result<Option<TransitionOutcome>>
    where
        F: FnOnce(&mut PipelineGraph) -> Result<Option<TransitionOutcome>>,
    {
        let slot = self.job_slot(job_id)?;
        let mut state = slot.lock().unwrap_or_else(|e| e.into_inner());

        let mut working = state.graph.clone();
        let Some(outcome) = apply(&mut working)? else {
            return Ok(None);
        };
        self.refresh_completion(&mut working, &outcome.to_stage, &outcome.candidate_id)?;
        graph::refresh_layout(&mut working, &self.layout);

        self.stores
            .candidates
            .update_candidate_stage(&outcome.candidate_id, &outcome.to_stage)
            .map_err(PipelineError::Persistence)?;
        self.stores
            .timeline
            .append(&outcome.entry)
            .map_err(PipelineError::Persistence)?;
        self.persist_snapshot(job_id, &working, state.allocator.high_water())?;

        state.graph = working;
        Ok(Some(outcome))
    }

    /// Re-read candidate assignments from the store (polling refresh) and
    /// reflow vertical offsets without disturbing pinned nodes.
    pub fn sync_candidates(&self, job_id: &str) -> Result<()> {
        let slot = self.job_slot(job_id)?;
        let mut state = slot.lock().unwrap_or_else(|e| e.into_inner());

        let candidates = self
            .stores
            .candidates
            .list_candidates_by_job(job_id)
            .map_err(PipelineError::Persistence)?;

        let mut working = state.graph.clone();
        for node_id in working.nodes().map(|n| n.id.clone()).collect::<Vec<_>>() {
            if let Some(node) = working.node_mut(&node_id) {
                node.candidates_mut().clear();
            }
        }
        working.orphans_mut().clear();
        for candidate in candidates {
            match working.node_mut(&candidate.stage_id) {
                Some(node) => node.candidates_mut().push(candidate),
                None => {
                    warn!(
                        job_id,
                        candidate_id = %candidate.id,
                        stage_id = %candidate.stage_id,
                        "candidate references unknown stage during refresh"
                    );
                    working.orphans_mut().push(candidate);
                }
            }
        }
        graph::refresh_layout(&mut working, &self.layout);

        self.persist_snapshot(job_id, &working, state.allocator.high_water())?;
        state.graph = working;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Assessment gate
    // ------------------------------------------------------------------

    /// Attach an assessment definition to a stage. At most one assessment
    /// per stage: re-attaching replaces the definition in place (same
    /// assessment id), leaving recorded responses untouched.
    pub fn attach_assessment(
        &self,
        job_id: &str,
        stage_id: &str,
        title: &str,
        questions: serde_json::Value,
    ) -> Result<Assessment> {
        let slot = self.job_slot(job_id)?;
        let mut state = slot.lock().unwrap_or_else(|e| e.into_inner());
        state.graph.require_node(stage_id)?;

        let existing = self
            .stores
            .assessments
            .list_assessments_by_job(job_id)
            .map_err(PipelineError::Persistence)?
            .into_iter()
            .find(|a| a.stage_id == stage_id);

        let (assessment, is_new) = match existing {
            Some(mut assessment) => {
                assessment.title = title.to_string();
                assessment.questions = questions;
                assessment.updated_at = Utc::now();
                (assessment, false)
            }
            None => (
                Assessment::new(job_id.to_string(), stage_id.to_string(), title.to_string())
                    .with_questions(questions),
                true,
            ),
        };

        let completion = self.completion_for(&assessment)?;
        let mut working = state.graph.clone();
        if let Some(node) = working.node_mut(stage_id) {
            node.set_assessment(assessment.clone(), completion);
        }

        if is_new {
            self.stores
                .assessments
                .create_assessment(&assessment)
                .map_err(PipelineError::Persistence)?;
        } else {
            self.stores
                .assessments
                .update_assessment(&assessment)
                .map_err(PipelineError::Persistence)?;
        }
        self.persist_structural(job_id, &working, state.allocator.high_water(), None)?;

        state.graph = working;
        info!(job_id, stage_id, assessment_id = %assessment.id, "assessment attached");
        Ok(assessment)
    }

    /// All recorded completion statuses for one assessment, keyed by
    /// candidate id.
    fn completion_for(&self, assessment: &Assessment) -> Result<HashMap<String, ResponseStatus>> {
        let mut lookups = HashMap::new();
        for response in self
            .stores
            .assessments
            .list_responses(&assessment.id)
            .map_err(PipelineError::Persistence)?
        {
            lookups.insert(
                response.candidate_id.clone(),
                ResponseStatus::from_response(Some(&response)),
            );
        }
        Ok(lookups)
    }

    /// Completion status for a candidate/assessment pair. Advisory only:
    /// advance and move never consult this as a gate.
    pub fn completion_status(
        &self,
        assessment_id: &str,
        candidate_id: &str,
    ) -> Result<ResponseStatus> {
        let response = self
            .stores
            .assessments
            .get_response(assessment_id, candidate_id)
            .map_err(PipelineError::Persistence)?;
        Ok(ResponseStatus::from_response(response.as_ref()))
    }

    /// Record a candidate's response and refresh the stage badge state.
    pub fn record_response(&self, job_id: &str, response: &AssessmentResponse) -> Result<()> {
        let slot = self.job_slot(job_id)?;
        let mut state = slot.lock().unwrap_or_else(|e| e.into_inner());

        let stage_id = state
            .graph
            .nodes()
            .find(|n| n.assessment().is_some_and(|a| a.id == response.assessment_id))
            .map(|n| n.id.clone())
            .ok_or_else(|| {
                PipelineError::AssessmentNotFound(response.assessment_id.clone())
            })?;

        self.stores
            .assessments
            .record_response(response)
            .map_err(PipelineError::Persistence)?;

        let mut working = state.graph.clone();
        self.refresh_completion(&mut working, &stage_id, &response.candidate_id)?;
        self.persist_snapshot(job_id, &working, state.allocator.high_water())?;
        state.graph = working;
        Ok(())
    }

    pub fn timeline(&self, candidate_id: &str) -> Result<Vec<TimelineEntry>> {
        self.stores
            .timeline
            .list(candidate_id)
            .map_err(PipelineError::Persistence)
    }

    pub fn responses(&self, assessment_id: &str) -> Result<Vec<AssessmentResponse>> {
        self.stores
            .assessments
            .list_responses(assessment_id)
            .map_err(PipelineError::Persistence)
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    /// Fetch or build the per-job state slot, reconstructing the graph on
    /// first access.
    fn job_slot(&self, job_id: &str) -> Result<Arc<Mutex<JobState>>> {
        if let Some(slot) = self
            .jobs
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(job_id)
        {
            return Ok(slot.clone());
        }

        let state = self.load_job_state(job_id)?;
        let mut registry = self.jobs.lock().unwrap_or_else(|e| e.into_inner());
        // Another caller may have raced us here; keep whichever landed.
        let slot = registry
            .entry(job_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(state)))
            .clone();
        Ok(slot)
    }

    fn load_job_state(&self, job_id: &str) -> Result<JobState> {
        let job = self.job(job_id)?;
        let stages = self
            .stores
            .stages
            .list_stages(job_id)
            .map_err(PipelineError::Persistence)?;
        let candidates = self
            .stores
            .candidates
            .list_candidates_by_job(job_id)
            .map_err(PipelineError::Persistence)?;
        let assessments = self
            .stores
            .assessments
            .list_assessments_by_job(job_id)
            .map_err(PipelineError::Persistence)?;

        let mut completion: CompletionLookup = HashMap::new();
        for assessment in &assessments {
            let mut lookups = HashMap::new();
            for response in self
                .stores
                .assessments
                .list_responses(&assessment.id)
                .map_err(PipelineError::Persistence)?
            {
                lookups.insert(
                    response.candidate_id.clone(),
                    ResponseStatus::from_response(Some(&response)),
                );
            }
            completion.insert(assessment.id.clone(), lookups);
        }

        let mut allocator = StageIdAllocator::seeded(
            stages
                .iter()
                .map(|s| s.id.as_str())
                .chain(
                    job.flow_snapshot
                        .iter()
                        .flat_map(|s| s.nodes.iter().map(|n| n.id.as_str())),
                ),
        );
        // The watermark outlives deleted stages; without it, dropping the
        // highest-numbered stage would recycle its id after a restart.
        allocator.reserve_past(job.stage_counter);

        let graph = graph::reconstruct(
            job_id,
            job.flow_snapshot.as_ref(),
            stages,
            candidates,
            assessments,
            &completion,
        )?;

        Ok(JobState { graph, allocator })
    }

    /// Pull the freshest completion status for one candidate into the
    /// node's badge map, if the node carries an assessment.
    fn refresh_completion(
        &self,
        graph: &mut PipelineGraph,
        stage_id: &str,
        candidate_id: &str,
    ) -> Result<()> {
        let assessment_id = match graph.node(stage_id).and_then(StageNode::assessment) {
            Some(assessment) => assessment.id.clone(),
            None => return Ok(()),
        };
        let status = self.completion_status(&assessment_id, candidate_id)?;
        if let Some(node) = graph.node_mut(stage_id) {
            if let graph::NodeBody::Assessment { completion, .. } = &mut node.body {
                completion.insert(candidate_id.to_string(), status);
            }
        }
        Ok(())
    }

    /// Reconcile the stage table with the working graph, then persist the
    /// snapshot. `new_stage` carries the caller-requested kind for a stage
    /// that does not have a record yet.
    fn persist_structural(
        &self,
        job_id: &str,
        graph: &PipelineGraph,
        stage_counter: u64,
        new_stage: Option<(&str, StageKind)>,
    ) -> Result<()> {
        let existing = self
            .stores
            .stages
            .list_stages(job_id)
            .map_err(PipelineError::Persistence)?;
        let mut seen: HashSet<&str> = HashSet::new();

        for node in graph.nodes() {
            seen.insert(node.id.as_str());
            match existing.iter().find(|r| r.id == node.id) {
                Some(record) => {
                    let mut record = record.clone();
                    record.name = node.name.clone();
                    record.order = node.order;
                    record.position = node.position;
                    if node.assessment().is_some() {
                        record.kind = StageKind::Assessment;
                    }
                    record.updated_at = Utc::now();
                    self.stores
                        .stages
                        .update_stage(&record)
                        .map_err(PipelineError::Persistence)?;
                }
                None => {
                    let kind = match new_stage {
                        Some((id, kind)) if id == node.id => kind,
                        _ => node.kind(),
                    };
                    let record = StageRecord::new(
                        node.id.clone(),
                        job_id.to_string(),
                        node.name.clone(),
                        node.order,
                        kind,
                    )
                    .with_position(node.position);
                    self.stores
                        .stages
                        .create_stage(&record)
                        .map_err(PipelineError::Persistence)?;
                }
            }
        }

        for record in existing.iter().filter(|r| !seen.contains(r.id.as_str())) {
            self.stores
                .stages
                .delete_stage(job_id, &record.id)
                .map_err(PipelineError::Persistence)?;
        }

        self.persist_snapshot(job_id, graph, stage_counter)
    }

    /// Persist the snapshot, derived applicant count and id watermark
    /// onto the job record. Last write wins; the watermark only ratchets
    /// upward.
    fn persist_snapshot(&self, job_id: &str, graph: &PipelineGraph, stage_counter: u64) -> Result<()> {
        let mut job = self.job(job_id)?;
        job.flow_snapshot = Some(FlowSnapshot::capture(graph));
        job.applicant_count = graph.total_candidates();
        job.stage_counter = job.stage_counter.max(stage_counter);
        job.updated_at = Utc::now();
        self.stores
            .jobs
            .update_job(&job)
            .map_err(PipelineError::Persistence)
    }
}
