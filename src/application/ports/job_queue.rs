use async_trait::async_trait;

use crate::domain::entities::ProcessingJob;

#[derive(Debug)]
pub enum JobQueueError {
    QueueClosed,
    InvalidJob(String),
}

impl std::fmt::Display for JobQueueError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobQueueError::QueueClosed => write!(f, "Job queue is closed"),
            JobQueueError::InvalidJob(msg) => write!(f, "Invalid job: {}", msg),
        }
    }
}

impl std::error::Error for JobQueueError {}

#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Enqueue a job for the background workers
    async fn enqueue(&self, job: ProcessingJob) -> Result<(), JobQueueError>;

    /// Number of jobs waiting for a worker
    async fn size(&self) -> usize;
}
