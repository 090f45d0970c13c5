pub mod assessment;
pub mod candidate;
pub mod job;
pub mod stage;
pub mod timeline;

pub use assessment::{Assessment, AssessmentResponse, ResponseStatus};
pub use candidate::Candidate;
pub use job::{Job, JobStatus};
pub use stage::{Position, StageKind, StageRecord};
pub use timeline::{TimelineAction, TimelineEntry};
