use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::application::ports::JobQueue;
use crate::application::services::UsageMonitor;
use crate::application::use_cases::{AppendFaqEntryUseCase, ManageTopicsUseCase};
use crate::domain::entities::ProcessingJob;
use crate::domain::errors::RagError;
use crate::domain::repositories::ContextRepository;
use crate::presentation::http::dto::{
    ApiResponse, AssignContextsRequestDto, ContextItemDto, FaqEntryRequestDto, IngestRequestDto,
    JobAcceptedDto, ReindexRequestDto, SystemPromptRequestDto, UsageReportDto,
};

pub struct AdminHandler {
    contexts: Arc<dyn ContextRepository>,
    job_queue: Arc<dyn JobQueue>,
    append_faq_entry: Arc<AppendFaqEntryUseCase>,
    manage_topics: Arc<ManageTopicsUseCase>,
    usage_monitor: Arc<UsageMonitor>,
}

fn error_response(error: RagError) -> Response {
    if !matches!(error, RagError::InvalidInput(_) | RagError::NotFound(_)) {
        tracing::error!(error_kind = %error.kind(), "Admin request failed: {}", error);
    }
    let (status, body) = ApiResponse::<()>::from_rag_error(&error, None);
    (status, Json(body)).into_response()
}

fn ok<T: serde::Serialize>(status: StatusCode, data: T) -> Response {
    (status, Json(ApiResponse::success(data))).into_response()
}

impl AdminHandler {
    pub fn new(
        contexts: Arc<dyn ContextRepository>,
        job_queue: Arc<dyn JobQueue>,
        append_faq_entry: Arc<AppendFaqEntryUseCase>,
        manage_topics: Arc<ManageTopicsUseCase>,
        usage_monitor: Arc<UsageMonitor>,
    ) -> Self {
        Self {
            contexts,
            job_queue,
            append_faq_entry,
            manage_topics,
            usage_monitor,
        }
    }

    async fn enqueue(&self, job: ProcessingJob) -> Result<JobAcceptedDto, RagError> {
        let job_id = job.id();
        self.job_queue
            .enqueue(job)
            .await
            .map_err(|e| RagError::storage(e.to_string()))?;
        Ok(JobAcceptedDto::queued(job_id))
    }

    pub async fn ingest_context(
        State(handler): State<Arc<AdminHandler>>,
        Path(context_id): Path<i64>,
        Json(body): Json<IngestRequestDto>,
    ) -> Response {
        if body.path.trim().is_empty() || body.title.trim().is_empty() {
            return error_response(RagError::invalid_input("path and title are required"));
        }

        match handler.contexts.find_by_id(context_id).await {
            Ok(Some(_)) => {}
            Ok(None) => return error_response(RagError::not_found(format!("Context {}", context_id))),
            Err(e) => return error_response(e.into()),
        }

        let job = ProcessingJob::new_ingest(context_id, body.path, body.title);
        match handler.enqueue(job).await {
            Ok(accepted) => {
                tracing::info!(context_id, task_id = %accepted.job_id, "Ingest queued");
                ok(StatusCode::ACCEPTED, accepted)
            }
            Err(e) => error_response(e),
        }
    }

    pub async fn reindex_contexts(
        State(handler): State<Arc<AdminHandler>>,
        Json(body): Json<ReindexRequestDto>,
    ) -> Response {
        if body.context_ids.is_empty() {
            return error_response(RagError::invalid_input("context_ids must not be empty"));
        }

        let job = ProcessingJob::new_reindex(body.context_ids, body.reset);
        match handler.enqueue(job).await {
            Ok(accepted) => ok(StatusCode::ACCEPTED, accepted),
            Err(e) => error_response(e),
        }
    }

    pub async fn append_faq_entry(
        State(handler): State<Arc<AdminHandler>>,
        Path(context_id): Path<i64>,
        Json(body): Json<FaqEntryRequestDto>,
    ) -> Response {
        match handler
            .append_faq_entry
            .execute(context_id, &body.question, &body.answer)
            .await
        {
            Ok(item) => ok(StatusCode::CREATED, ContextItemDto::from(item)),
            Err(e) => error_response(e),
        }
    }

    pub async fn assign_contexts(
        State(handler): State<Arc<AdminHandler>>,
        Json(body): Json<AssignContextsRequestDto>,
    ) -> Response {
        match handler
            .manage_topics
            .assign_contexts(&body.topic_ids, &body.context_ids)
            .await
        {
            Ok(outcome) => ok(StatusCode::OK, outcome),
            Err(e) => error_response(e),
        }
    }

    pub async fn update_system_prompt(
        State(handler): State<Arc<AdminHandler>>,
        Json(body): Json<SystemPromptRequestDto>,
    ) -> Response {
        match handler
            .manage_topics
            .update_system_prompt(&body.topic_ids, body.system_prompt.as_deref())
            .await
        {
            Ok(outcome) => ok(StatusCode::OK, outcome),
            Err(e) => error_response(e),
        }
    }

    pub async fn usage(State(handler): State<Arc<AdminHandler>>) -> impl IntoResponse {
        let monitor = &handler.usage_monitor;
        let report = UsageReportDto {
            stats: monitor.snapshot(),
            cost: monitor.cost_estimate(),
            recommendations: monitor.recommendations(),
            rate_limited: monitor.check_rate_limits(),
        };
        (StatusCode::OK, Json(ApiResponse::success(report)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::ContextKind;
    use crate::infrastructure::messaging::{MpscJobQueue, MpscJobQueueReceiver};
    use crate::presentation::http::routes::admin_routes;
    use crate::test_support::Harness;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    struct Admin {
        harness: Harness,
        queue: Arc<MpscJobQueue>,
        _receiver: MpscJobQueueReceiver,
        app: axum::Router,
    }

    fn admin() -> Admin {
        let harness = Harness::new();
        let (queue, receiver) = MpscJobQueue::create_pair();
        let queue = Arc::new(queue);
        let handler = AdminHandler::new(
            harness.contexts.clone(),
            queue.clone(),
            harness.faq.clone(),
            harness.manage_topics.clone(),
            harness.monitor.clone(),
        );
        let app = admin_routes(Arc::new(handler));
        Admin {
            harness,
            queue,
            _receiver: receiver,
            app,
        }
    }

    async fn send(app: &axum::Router, method: &str, uri: &str, body: Value) -> (StatusCode, Value) {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_ingest_is_queued_for_known_contexts_only() {
        let admin = admin();
        admin.harness.contexts.add_context(7, ContextKind::Pdf);

        let (status, body) = send(
            &admin.app,
            "POST",
            "/admin/contexts/7/ingest",
            json!({ "path": "/data/a.pdf", "title": "A" }),
        )
        .await;
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(body["data"]["status"], "queued");
        assert_eq!(admin.queue.size().await, 1);

        let (status, _) = send(
            &admin.app,
            "POST",
            "/admin/contexts/8/ingest",
            json!({ "path": "/data/b.pdf", "title": "B" }),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(admin.queue.size().await, 1);
    }

    #[tokio::test]
    async fn test_bulk_endpoints_report_failures() {
        let admin = admin();
        admin.harness.topics.add_topic(1, None);
        admin.harness.contexts.add_context(10, ContextKind::Markdown);

        let (status, body) = send(
            &admin.app,
            "POST",
            "/admin/topics/contexts",
            json!({ "topic_ids": [1, 2], "context_ids": [10] }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["affected_count"], 1);
        assert_eq!(body["data"]["failures"][0]["id"], 2);
        assert_eq!(body["data"]["failures"][0]["error_kind"], "not_found");

        let (status, _) = send(
            &admin.app,
            "POST",
            "/admin/contexts/reindex",
            json!({ "context_ids": [] }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_faq_append_and_usage_report() {
        let admin = admin();
        admin
            .harness
            .contexts
            .add_named_context(3, "Billing FAQ", ContextKind::Faq);

        let (status, body) = send(
            &admin.app,
            "POST",
            "/admin/contexts/3/faq",
            json!({ "question": "How do I pay?", "answer": "By card." }),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["title"], "Billing FAQ - Q&A 1");

        let (status, body) = send(&admin.app, "GET", "/admin/usage", Value::Null).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["stats"]["embeddings"]["calls"], 1);
        assert_eq!(body["data"]["rate_limited"], false);
    }
}
