use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::Instrument;
use uuid::Uuid;

use crate::application::use_cases::{AnswerQuestionUseCase, QueryRequest};
use crate::domain::errors::RagError;
use crate::presentation::http::dto::{ApiResponse, AskRequestDto, AskResponseDto};

pub struct RagHandler {
    answer_question: Arc<AnswerQuestionUseCase>,
}

impl RagHandler {
    pub fn new(answer_question: Arc<AnswerQuestionUseCase>) -> Self {
        Self { answer_question }
    }

    pub async fn ask(
        State(handler): State<Arc<RagHandler>>,
        Json(body): Json<AskRequestDto>,
    ) -> Response {
        let correlation_id = Uuid::new_v4();
        let span = tracing::info_span!("rag_ask", %correlation_id, topic_id = body.topic_id);

        async move {
            if let Err(message) = body.validate() {
                return error_response(&RagError::invalid_input(message), correlation_id);
            }

            let mut request = QueryRequest::new(body.question, vec![body.topic_id]);
            request.session_id = body.session_id;

            match handler.answer_question.execute(request).await {
                Ok(result) => (
                    StatusCode::OK,
                    Json(AskResponseDto::new(result, body.topic_id)),
                )
                    .into_response(),
                Err(e) => {
                    tracing::error!(
                        %correlation_id,
                        error_kind = %e.kind(),
                        "Question failed: {}",
                        e
                    );
                    error_response(&e, correlation_id)
                }
            }
        }
        .instrument(span)
        .await
    }
}

fn error_response(error: &RagError, correlation_id: Uuid) -> Response {
    let (status, body) =
        ApiResponse::<()>::from_rag_error(error, Some(format!("correlation_id={}", correlation_id)));
    (status, Json(body)).into_response()
}
