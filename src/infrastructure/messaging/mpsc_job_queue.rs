use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{Mutex, mpsc};

use crate::application::ports::JobQueue;
use crate::application::ports::job_queue::JobQueueError;
use crate::domain::entities::ProcessingJob;

/// Sending half of the in-process job queue, handed to the HTTP layer.
pub struct MpscJobQueue {
    sender: mpsc::UnboundedSender<ProcessingJob>,
    pending: Arc<AtomicUsize>,
}

/// Receiving half shared by the background workers.
pub struct MpscJobQueueReceiver {
    receiver: Mutex<mpsc::UnboundedReceiver<ProcessingJob>>,
    pending: Arc<AtomicUsize>,
}

impl MpscJobQueue {
    pub fn create_pair() -> (Self, MpscJobQueueReceiver) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let pending = Arc::new(AtomicUsize::new(0));

        (
            Self {
                sender,
                pending: pending.clone(),
            },
            MpscJobQueueReceiver {
                receiver: Mutex::new(receiver),
                pending,
            },
        )
    }
}

#[async_trait]
impl JobQueue for MpscJobQueue {
    async fn enqueue(&self, job: ProcessingJob) -> Result<(), JobQueueError> {
        let job_id = job.id();
        self.pending.fetch_add(1, Ordering::SeqCst);

        if self.sender.send(job).is_err() {
            self.pending.fetch_sub(1, Ordering::SeqCst);
            return Err(JobQueueError::QueueClosed);
        }

        tracing::debug!("Enqueued job {}", job_id);
        Ok(())
    }

    async fn size(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }
}

impl MpscJobQueueReceiver {
    /// Waits for the next job; `None` once every sender is gone and the
    /// queue is drained.
    pub async fn recv(&self) -> Option<ProcessingJob> {
        let job = {
            let mut receiver = self.receiver.lock().await;
            receiver.recv().await
        };

        if job.is_some() {
            self.pending.fetch_sub(1, Ordering::SeqCst);
        }
        job
    }
}
