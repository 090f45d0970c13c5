use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An assessment definition attached to at most one stage of one job.
///
/// The question set is opaque to the pipeline core; it is stored and
/// round-tripped as raw JSON for the assessment UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub id: String,
    pub job_id: String,
    pub stage_id: String,
    pub title: String,
    #[serde(default)]
    pub questions: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Assessment {
    pub fn new(job_id: String, stage_id: String, title: String) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            job_id,
            stage_id,
            title,
            questions: serde_json::Value::Null,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_questions(mut self, questions: serde_json::Value) -> Self {
        self.questions = questions;
        self
    }
}

/// A candidate's recorded response to an assessment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentResponse {
    pub assessment_id: String,
    pub candidate_id: String,
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    pub submitted_at: DateTime<Utc>,
}

/// Completion status derived from the presence of a completed response.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ResponseStatus {
    pub completed: bool,
    pub score: Option<f64>,
}

impl ResponseStatus {
    pub fn from_response(response: Option<&AssessmentResponse>) -> Self {
        match response {
            Some(r) if r.completed => Self {
                completed: true,
                score: r.score,
            },
            _ => Self::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_status_requires_completion() {
        let incomplete = AssessmentResponse {
            assessment_id: "a-1".to_string(),
            candidate_id: "c-1".to_string(),
            completed: false,
            score: Some(40.0),
            submitted_at: Utc::now(),
        };
        let status = ResponseStatus::from_response(Some(&incomplete));
        assert!(!status.completed);
        assert_eq!(status.score, None);

        let complete = AssessmentResponse {
            completed: true,
            score: Some(85.0),
            ..incomplete
        };
        let status = ResponseStatus::from_response(Some(&complete));
        assert!(status.completed);
        assert_eq!(status.score, Some(85.0));

        assert!(!ResponseStatus::from_response(None).completed);
    }
}
