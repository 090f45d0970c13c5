use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Visual position of a node on the pipeline canvas.
///
/// `x` is the column (set at insertion, shifted when stages are inserted
/// before this one); `y` is recomputed by the layout engine from candidate
/// counts.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Kind of a hiring stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageKind {
    /// Plain stage holding candidates.
    #[default]
    Default,
    /// Stage with an attached assessment definition.
    Assessment,
}

impl std::fmt::Display for StageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StageKind::Default => write!(f, "default"),
            StageKind::Assessment => write!(f, "assessment"),
        }
    }
}

impl std::str::FromStr for StageKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "default" | "stage" => Ok(StageKind::Default),
            "assessment" => Ok(StageKind::Assessment),
            _ => anyhow::bail!("Invalid stage kind: {s}. Valid values: default, assessment"),
        }
    }
}

/// A normalized hiring-stage record as persisted in the stage store.
///
/// `order` is the persisted fallback ordering used when no flow snapshot is
/// available. It is independent of the visual x-position, and after
/// mid-chain insertions it diverges from topological position (inserted
/// stages get `max(order) + 1`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageRecord {
    /// Stable id, unique within the job. Never reused.
    pub id: String,
    pub job_id: String,
    pub name: String,
    pub order: u32,
    #[serde(default)]
    pub kind: StageKind,
    #[serde(default)]
    pub position: Position,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StageRecord {
    pub fn new(id: String, job_id: String, name: String, order: u32, kind: StageKind) -> Self {
        let now = Utc::now();
        Self {
            id,
            job_id,
            name,
            order,
            kind,
            position: Position::default(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_position(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    /// Numeric suffix of the stage id, used as the deterministic tiebreak
    /// when two stages share the same `order`.
    pub fn numeric_suffix(&self) -> u64 {
        self.id
            .rsplit('-')
            .next()
            .and_then(|s| s.parse().ok())
            .unwrap_or(0)
    }
}

/// Names of the default chain created with every new job.
pub const DEFAULT_CHAIN: [&str; 4] = ["Applied", "Screening", "Interview", "Offer"];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_kind_parsing() {
        assert_eq!("default".parse::<StageKind>().unwrap(), StageKind::Default);
        assert_eq!(
            "assessment".parse::<StageKind>().unwrap(),
            StageKind::Assessment
        );
        assert!("interview".parse::<StageKind>().is_err());
    }

    #[test]
    fn test_numeric_suffix() {
        let stage = StageRecord::new(
            "stage-12".to_string(),
            "job-1".to_string(),
            "Screening".to_string(),
            1,
            StageKind::Default,
        );
        assert_eq!(stage.numeric_suffix(), 12);
    }
}
