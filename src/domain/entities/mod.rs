pub mod context;
pub mod context_item;
pub mod processing_job;
pub mod question_history;
pub mod topic;

pub use context::Context;
pub use context_item::{ContextItem, NewContextItem};
pub use processing_job::ProcessingJob;
pub use question_history::{NewQuestionHistory, QuestionHistory};
pub use topic::Topic;
