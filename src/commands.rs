//! CLI command implementations
//!
//! Each function backs one `hireflow` subcommand, wrapping the engine with
//! colored terminal output. Structural errors from the engine surface
//! directly; they block the requested action but never crash the CLI.

use anyhow::Result;
use colored::Colorize;

use crate::engine::PipelineEngine;
use crate::models::{AssessmentResponse, Position, StageKind};

/// `hireflow new <title>` - create a job with the default stage chain.
pub fn new_job(engine: &PipelineEngine, title: &str) -> Result<()> {
    let job = engine.create_job(title)?;
    println!("{} Created job '{}' ({})", "✓".green(), job.title.cyan(), job.id);
    for stage in engine.graph(&job.id)?.stages_in_order() {
        println!("    {} {}", "·".dimmed(), stage.name);
    }
    Ok(())
}

/// `hireflow jobs` - list all jobs with applicant counts.
pub fn list_jobs(engine: &PipelineEngine) -> Result<()> {
    let jobs = engine.list_jobs()?;
    if jobs.is_empty() {
        println!("No jobs yet. Create one with 'hireflow new <title>'.");
        return Ok(());
    }
    for job in jobs {
        println!(
            "{}  {}  {} applicant(s)  [{}]",
            job.id.dimmed(),
            job.title.bold(),
            job.applicant_count,
            job.status
        );
    }
    Ok(())
}

/// `hireflow show <job>` - print the pipeline with candidates per stage.
pub fn show(engine: &PipelineEngine, job_id: &str) -> Result<()> {
    let job = engine.job(job_id)?;
    let graph = engine.graph(job_id)?;

    println!("{} ({} applicants)", job.title.bold(), job.applicant_count);
    for stage in graph.stages_in_order() {
        let badge = match stage.assessment() {
            Some(assessment) => format!(" [assessment: {}]", assessment.title).yellow().to_string(),
            None => String::new(),
        };
        println!(
            "  {} {} ({} candidate(s)){}",
            "→".cyan(),
            stage.name.bold(),
            stage.candidate_count(),
            badge
        );
        for candidate in stage.candidates() {
            let check = match stage.completion(&candidate.id) {
                Some(status) if status.completed => " ✓".green().to_string(),
                _ => String::new(),
            };
            println!("      {} {}{}", candidate.id.dimmed(), candidate.name, check);
        }
        if let Some(edge) = graph.outgoing_edge(&stage.id) {
            println!("      {}", format!("edge {}", edge.id).dimmed());
        }
    }
    if !graph.orphans().is_empty() {
        println!(
            "{} {} candidate(s) reference stages that no longer exist:",
            "!".yellow(),
            graph.orphans().len()
        );
        for orphan in graph.orphans() {
            println!("      {} {} (stage {})", orphan.id.dimmed(), orphan.name, orphan.stage_id);
        }
    }
    Ok(())
}

/// `hireflow add-stage <job> <edge> <name>` - insert a stage on an edge.
pub fn add_stage(
    engine: &PipelineEngine,
    job_id: &str,
    edge_id: &str,
    name: &str,
    kind: StageKind,
) -> Result<()> {
    let stage_id = engine.add_stage(job_id, edge_id, name, kind)?;
    println!("{} Inserted stage '{}' ({})", "✓".green(), name.cyan(), stage_id);
    Ok(())
}

/// `hireflow rename-stage <job> <stage> <name>`.
pub fn rename_stage(engine: &PipelineEngine, job_id: &str, stage_id: &str, name: &str) -> Result<()> {
    engine.rename_stage(job_id, stage_id, name)?;
    println!("{} Renamed {} to '{}'", "✓".green(), stage_id, name.cyan());
    Ok(())
}

/// `hireflow delete-stage <job> <stage>`.
pub fn delete_stage(engine: &PipelineEngine, job_id: &str, stage_id: &str) -> Result<()> {
    engine.delete_stage(job_id, stage_id)?;
    println!("{} Deleted stage {}", "✓".green(), stage_id);
    Ok(())
}

/// `hireflow pin <job> <stage> <x> <y>` - record a dragged position.
pub fn pin_stage(engine: &PipelineEngine, job_id: &str, stage_id: &str, x: f64, y: f64) -> Result<()> {
    engine.set_stage_position(job_id, stage_id, Position::new(x, y))?;
    println!("{} Pinned {} at ({x}, {y})", "✓".green(), stage_id);
    Ok(())
}

/// `hireflow apply <job> <name>` - register a candidate in the entry stage.
pub fn apply(engine: &PipelineEngine, job_id: &str, name: &str, email: Option<&str>) -> Result<()> {
    let candidate = engine.add_candidate(job_id, name, email)?;
    println!(
        "{} {} applied ({}) -> {}",
        "✓".green(),
        candidate.name.cyan(),
        candidate.id,
        candidate.stage_id
    );
    Ok(())
}

/// `hireflow advance <job> <candidate> <stage>`.
pub fn advance(
    engine: &PipelineEngine,
    job_id: &str,
    candidate_id: &str,
    stage_id: &str,
    actor: &str,
) -> Result<()> {
    match engine.advance(job_id, candidate_id, stage_id, actor)? {
        Some(outcome) => println!(
            "{} {} advanced {} -> {}",
            "✓".green(),
            candidate_id,
            outcome.from_stage,
            outcome.to_stage.cyan()
        ),
        None => println!("{} Nothing to do (terminal stage or already moved)", "·".dimmed()),
    }
    Ok(())
}

/// `hireflow move <job> <source> <candidate> <target>`.
pub fn move_candidate(
    engine: &PipelineEngine,
    job_id: &str,
    source_stage_id: &str,
    candidate_id: &str,
    target_stage_id: &str,
    actor: &str,
) -> Result<()> {
    match engine.move_candidate(job_id, source_stage_id, candidate_id, target_stage_id, actor)? {
        Some(outcome) => println!(
            "{} {} moved {} -> {}",
            "✓".green(),
            candidate_id,
            outcome.from_stage,
            outcome.to_stage.cyan()
        ),
        None => println!("{} Nothing to do (candidate already moved)", "·".dimmed()),
    }
    Ok(())
}

/// `hireflow attach-assessment <job> <stage> <title>`.
pub fn attach_assessment(
    engine: &PipelineEngine,
    job_id: &str,
    stage_id: &str,
    title: &str,
    questions: Option<&str>,
) -> Result<()> {
    let questions = match questions {
        Some(raw) => serde_json::from_str(raw)?,
        None => serde_json::Value::Null,
    };
    let assessment = engine.attach_assessment(job_id, stage_id, title, questions)?;
    println!(
        "{} Attached assessment '{}' ({}) to {}",
        "✓".green(),
        assessment.title.cyan(),
        assessment.id,
        stage_id
    );
    Ok(())
}

/// `hireflow respond <job> <assessment> <candidate>` - record a response.
pub fn record_response(
    engine: &PipelineEngine,
    job_id: &str,
    assessment_id: &str,
    candidate_id: &str,
    score: Option<f64>,
) -> Result<()> {
    let response = AssessmentResponse {
        assessment_id: assessment_id.to_string(),
        candidate_id: candidate_id.to_string(),
        completed: true,
        score,
        submitted_at: chrono::Utc::now(),
    };
    engine.record_response(job_id, &response)?;
    println!("{} Recorded response for {}", "✓".green(), candidate_id);
    Ok(())
}

/// `hireflow responses <assessment>` - list recorded responses.
pub fn list_responses(engine: &PipelineEngine, assessment_id: &str) -> Result<()> {
    let responses = engine.responses(assessment_id)?;
    if responses.is_empty() {
        println!("No responses recorded.");
        return Ok(());
    }
    for response in responses {
        let score = response
            .score
            .map(|s| format!("{s:.1}"))
            .unwrap_or_else(|| "-".to_string());
        let state = if response.completed {
            "completed".green().to_string()
        } else {
            "pending".yellow().to_string()
        };
        println!("{}  {}  score {}", response.candidate_id, state, score);
    }
    Ok(())
}

/// `hireflow timeline <candidate>` - print the candidate's history.
pub fn timeline(engine: &PipelineEngine, candidate_id: &str) -> Result<()> {
    let entries = engine.timeline(candidate_id)?;
    if entries.is_empty() {
        println!("No timeline entries.");
        return Ok(());
    }
    for entry in entries {
        let from = entry.from_stage.as_deref().unwrap_or("-");
        println!(
            "{}  {}  {} -> {}  by {}",
            entry.at.format("%Y-%m-%d %H:%M:%S").to_string().dimmed(),
            entry.action,
            from,
            entry.to_stage.cyan(),
            entry.actor
        );
    }
    Ok(())
}

/// `hireflow refresh <job>` - re-read candidates and reflow the layout.
pub fn refresh(engine: &PipelineEngine, job_id: &str) -> Result<()> {
    engine.sync_candidates(job_id)?;
    println!("{} Refreshed pipeline for {}", "✓".green(), job_id);
    Ok(())
}

/// `hireflow export <job>` - dump the render model as JSON.
pub fn export(engine: &PipelineEngine, job_id: &str) -> Result<()> {
    let model = engine.render(job_id)?;
    println!("{}", serde_json::to_string_pretty(&model)?);
    Ok(())
}
