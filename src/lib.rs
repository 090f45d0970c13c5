pub mod commands;
pub mod config;
pub mod engine;
pub mod error;
pub mod graph;
pub mod ids;
pub mod models;
pub mod snapshot;
pub mod store;

pub use engine::PipelineEngine;
pub use error::{PipelineError, Result};
