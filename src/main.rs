use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use hireflow::commands;
use hireflow::config::Config;
use hireflow::engine::PipelineEngine;
use hireflow::models::StageKind;

#[derive(Parser)]
#[command(name = "hireflow")]
#[command(about = "Hiring pipeline engine CLI", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file (default: ./hireflow.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Actor recorded on timeline entries
    #[arg(long, global = true, default_value = "cli")]
    actor: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a job with the default stage chain
    New {
        /// Job title
        title: String,
    },

    /// List all jobs
    Jobs,

    /// Show a job's pipeline with candidates per stage
    Show {
        job_id: String,
    },

    /// Insert a new stage on an existing edge
    AddStage {
        job_id: String,
        /// Edge to split (shown by 'show')
        edge_id: String,
        /// Display name of the new stage
        name: String,
        /// Stage kind: default or assessment
        #[arg(long, default_value = "default")]
        kind: StageKind,
    },

    /// Rename a stage (label-only)
    RenameStage {
        job_id: String,
        stage_id: String,
        name: String,
    },

    /// Delete an empty stage, re-splicing the chain
    DeleteStage {
        job_id: String,
        stage_id: String,
    },

    /// Record a dragged node position
    Pin {
        job_id: String,
        stage_id: String,
        x: f64,
        y: f64,
    },

    /// Register a candidate in the entry stage
    Apply {
        job_id: String,
        name: String,
        #[arg(long)]
        email: Option<String>,
    },

    /// Advance a candidate along their stage's outgoing edge
    Advance {
        job_id: String,
        candidate_id: String,
        /// The candidate's current stage
        stage_id: String,
    },

    /// Move a candidate to an arbitrary stage of the same job
    Move {
        job_id: String,
        source_stage_id: String,
        candidate_id: String,
        target_stage_id: String,
    },

    /// Attach (or replace) a stage's assessment definition
    AttachAssessment {
        job_id: String,
        stage_id: String,
        title: String,
        /// Question set as raw JSON
        #[arg(long)]
        questions: Option<String>,
    },

    /// Record a completed assessment response
    Respond {
        job_id: String,
        assessment_id: String,
        candidate_id: String,
        #[arg(long)]
        score: Option<f64>,
    },

    /// List responses recorded for an assessment
    Responses {
        assessment_id: String,
    },

    /// Print a candidate's history
    Timeline {
        candidate_id: String,
    },

    /// Re-read candidate assignments and reflow the layout
    Refresh {
        job_id: String,
    },

    /// Dump the render model as JSON
    Export {
        job_id: String,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;
    let engine = PipelineEngine::open(&config)?;
    let actor = cli.actor.as_str();

    match cli.command {
        Commands::New { title } => commands::new_job(&engine, &title),
        Commands::Jobs => commands::list_jobs(&engine),
        Commands::Show { job_id } => commands::show(&engine, &job_id),
        Commands::AddStage {
            job_id,
            edge_id,
            name,
            kind,
        } => commands::add_stage(&engine, &job_id, &edge_id, &name, kind),
        Commands::RenameStage {
            job_id,
            stage_id,
            name,
        } => commands::rename_stage(&engine, &job_id, &stage_id, &name),
        Commands::DeleteStage { job_id, stage_id } => {
            commands::delete_stage(&engine, &job_id, &stage_id)
        }
        Commands::Pin {
            job_id,
            stage_id,
            x,
            y,
        } => commands::pin_stage(&engine, &job_id, &stage_id, x, y),
        Commands::Apply { job_id, name, email } => {
            commands::apply(&engine, &job_id, &name, email.as_deref())
        }
        Commands::Advance {
            job_id,
            candidate_id,
            stage_id,
        } => commands::advance(&engine, &job_id, &candidate_id, &stage_id, actor),
        Commands::Move {
            job_id,
            source_stage_id,
            candidate_id,
            target_stage_id,
        } => commands::move_candidate(
            &engine,
            &job_id,
            &source_stage_id,
            &candidate_id,
            &target_stage_id,
            actor,
        ),
        Commands::AttachAssessment {
            job_id,
            stage_id,
            title,
            questions,
        } => commands::attach_assessment(&engine, &job_id, &stage_id, &title, questions.as_deref()),
        Commands::Respond {
            job_id,
            assessment_id,
            candidate_id,
            score,
        } => commands::record_response(&engine, &job_id, &assessment_id, &candidate_id, score),
        Commands::Responses { assessment_id } => commands::list_responses(&engine, &assessment_id),
        Commands::Timeline { candidate_id } => commands::timeline(&engine, &candidate_id),
        Commands::Refresh { job_id } => commands::refresh(&engine, &job_id),
        Commands::Export { job_id } => commands::export(&engine, &job_id),
    }
}
