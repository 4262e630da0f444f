use std::path::PathBuf;
use std::sync::Arc;

use crate::application::use_cases::{IngestContextUseCase, IngestRequest, ReindexContextsUseCase};
use crate::domain::entities::ProcessingJob;
use crate::domain::entities::processing_job::JobType;
use crate::infrastructure::messaging::MpscJobQueueReceiver;

/// Pool of workers draining the job queue. Each job runs to completion on
/// one worker; per-context serialization is left to the use cases' locks.
pub struct BackgroundProcessor {
    job_receiver: Arc<MpscJobQueueReceiver>,
    ingest_context: Arc<IngestContextUseCase>,
    reindex_contexts: Arc<ReindexContextsUseCase>,
    worker_count: usize,
}

impl BackgroundProcessor {
    pub fn new(
        job_receiver: Arc<MpscJobQueueReceiver>,
        ingest_context: Arc<IngestContextUseCase>,
        reindex_contexts: Arc<ReindexContextsUseCase>,
    ) -> Self {
        Self {
            job_receiver,
            ingest_context,
            reindex_contexts,
            worker_count: 3,
        }
    }

    pub fn with_worker_count(mut self, count: usize) -> Self {
        self.worker_count = count.max(1);
        self
    }

    /// Runs the workers until the queue is closed and drained.
    pub async fn start(self: Arc<Self>) {
        tracing::info!(
            "Starting background processor with {} workers",
            self.worker_count
        );

        let mut handles = Vec::with_capacity(self.worker_count);
        for worker_id in 0..self.worker_count {
            let processor = self.clone();
            handles.push(tokio::spawn(async move {
                processor.worker_loop(worker_id).await;
            }));
        }

        for (i, handle) in handles.into_iter().enumerate() {
            if let Err(e) = handle.await {
                tracing::error!("Worker {} panicked: {}", i, e);
            }
        }

        tracing::info!("Background processor stopped");
    }

    async fn worker_loop(&self, worker_id: usize) {
        tracing::debug!("Worker {} started", worker_id);

        while let Some(job) = self.job_receiver.recv().await {
            tracing::info!(task_id = %job.id(), "Worker {} picked up job", worker_id);
            self.process_job(job).await;
        }

        tracing::debug!("Worker {} stopped", worker_id);
    }

    async fn process_job(&self, job: ProcessingJob) {
        let task_id = job.id();
        let start_time = std::time::Instant::now();

        match job.job_type().clone() {
            JobType::Ingest {
                context_id,
                path,
                title,
            } => {
                let request = IngestRequest {
                    context_id,
                    path: PathBuf::from(path),
                    title,
                    task_id: Some(task_id),
                };
                match self.ingest_context.execute(request).await {
                    Ok(outcome) => tracing::info!(
                        %task_id,
                        context_id,
                        "Ingest finished as {} with {} chunks ({} indexed) in {:.2}s",
                        outcome.status,
                        outcome.chunk_count,
                        outcome.indexed_count,
                        start_time.elapsed().as_secs_f64()
                    ),
                    Err(e) => tracing::error!(
                        %task_id,
                        context_id,
                        error_kind = %e.kind(),
                        "Ingest failed: {}",
                        e
                    ),
                }
            }
            JobType::Reindex { context_ids, reset } => {
                match self.reindex_contexts.execute(&context_ids, reset).await {
                    Ok(outcome) => tracing::info!(
                        %task_id,
                        "Reindexed {} of {} contexts ({} failed) in {:.2}s",
                        outcome.affected_count,
                        context_ids.len(),
                        outcome.failures.len(),
                        start_time.elapsed().as_secs_f64()
                    ),
                    Err(e) => tracing::error!(
                        %task_id,
                        error_kind = %e.kind(),
                        "Reindex failed: {}",
                        e
                    ),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::JobQueue;
    use crate::domain::value_objects::{ContextKind, ProcessingStatus};
    use crate::infrastructure::messaging::MpscJobQueue;
    use crate::test_support::Harness;

    #[tokio::test]
    async fn test_ingest_job_records_its_id_as_task_id() {
        let harness = Harness::new();
        harness.contexts.add_context(5, ContextKind::Pdf);
        harness.parser.set_text("doc.pdf", "Hello.");

        let (queue, receiver) = MpscJobQueue::create_pair();
        let job = ProcessingJob::new_ingest(5, "doc.pdf".to_string(), "Doc".to_string());
        let job_id = job.id();
        queue.enqueue(job).await.unwrap();
        drop(queue);

        let processor = Arc::new(
            BackgroundProcessor::new(
                Arc::new(receiver),
                harness.ingest.clone(),
                harness.reindex.clone(),
            )
            .with_worker_count(2),
        );
        processor.start().await;

        let context = harness.contexts.get(5).unwrap();
        assert_eq!(context.processing_status(), ProcessingStatus::Completed);
        let items = harness.items.items_for(5);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].metadata()["task_id"], job_id.to_string());
    }

    #[tokio::test]
    async fn test_failed_job_does_not_stop_the_worker() {
        let harness = Harness::new();
        harness.contexts.add_context(6, ContextKind::Markdown);
        harness.parser.set_text("ok.md", "Fine.");

        let (queue, receiver) = MpscJobQueue::create_pair();
        queue
            .enqueue(ProcessingJob::new_ingest(99, "nope.md".into(), "Nope".into()))
            .await
            .unwrap();
        queue
            .enqueue(ProcessingJob::new_ingest(6, "ok.md".into(), "Ok".into()))
            .await
            .unwrap();
        drop(queue);

        let processor = Arc::new(
            BackgroundProcessor::new(
                Arc::new(receiver),
                harness.ingest.clone(),
                harness.reindex.clone(),
            )
            .with_worker_count(1),
        );
        processor.start().await;

        assert_eq!(
            harness.contexts.get(6).unwrap().processing_status(),
            ProcessingStatus::Completed
        );
    }
}
