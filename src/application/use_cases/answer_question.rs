use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use crate::application::ports::VectorIndex;
use crate::application::ports::vector_index::SearchHit;
use crate::application::services::deadline::with_timeout;
use crate::application::services::query_cache::{EMPTY_RESULT_TTL, RESULT_TTL, query_cache_key};
use crate::application::services::{
    AnswerGenerator, EmbeddingService, GenerationOptions, NO_RELEVANT_INFORMATION, QueryCache,
    RerankService, TopicContextResolver,
};
use crate::domain::entities::NewQuestionHistory;
use crate::domain::errors::{RagError, RagResult};
use crate::domain::repositories::{QuestionHistoryRepository, TopicRepository};

pub const DEFAULT_SEARCH_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone)]
pub struct QueryRequest {
    pub question: String,
    pub topic_ids: Vec<i64>,
    pub limit: Option<usize>,
    pub rerank_top_k: Option<usize>,
    pub session_id: Option<String>,
}

impl QueryRequest {
    pub fn new(question: impl Into<String>, topic_ids: Vec<i64>) -> Self {
        Self {
            question: question.into(),
            topic_ids,
            limit: None,
            rerank_top_k: None,
            session_id: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub title: String,
    pub content: String,
    pub score: f32,
    pub context_type: String,
    pub context_item_id: i64,
}

impl From<&SearchHit> for Source {
    fn from(hit: &SearchHit) -> Self {
        Self {
            title: hit.payload.title.clone(),
            content: hit.payload.content.clone(),
            score: hit.effective_score(),
            context_type: hit.payload.context_type.clone(),
            context_item_id: hit.payload.context_item_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub answer: String,
    pub sources: Vec<Source>,
    /// The reranked hits with full payloads, in the order shown to the model.
    pub context_items: Vec<SearchHit>,
}

impl QueryResult {
    fn no_relevant_information() -> Self {
        Self {
            answer: NO_RELEVANT_INFORMATION.to_string(),
            sources: Vec::new(),
            context_items: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct QuerySettings {
    pub collection: String,
    pub search_limit: usize,
    pub rerank_top_k: usize,
    pub search_timeout: Duration,
    pub generation: GenerationOptions,
}

impl Default for QuerySettings {
    fn default() -> Self {
        Self {
            collection: "context_items".to_string(),
            search_limit: 10,
            rerank_top_k: 5,
            search_timeout: DEFAULT_SEARCH_TIMEOUT,
            generation: GenerationOptions::default(),
        }
    }
}

/// The query pipeline: cache, topic resolution, embed, search, rerank,
/// generate. Holds no per-request state.
pub struct AnswerQuestionUseCase {
    embeddings: Arc<EmbeddingService>,
    index: Arc<dyn VectorIndex>,
    reranker: Arc<RerankService>,
    generator: Arc<AnswerGenerator>,
    resolver: Arc<TopicContextResolver>,
    cache: Arc<QueryCache>,
    topics: Arc<dyn TopicRepository>,
    history: Arc<dyn QuestionHistoryRepository>,
    settings: QuerySettings,
}

impl AnswerQuestionUseCase {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        embeddings: Arc<EmbeddingService>,
        index: Arc<dyn VectorIndex>,
        reranker: Arc<RerankService>,
        generator: Arc<AnswerGenerator>,
        resolver: Arc<TopicContextResolver>,
        cache: Arc<QueryCache>,
        topics: Arc<dyn TopicRepository>,
        history: Arc<dyn QuestionHistoryRepository>,
        settings: QuerySettings,
    ) -> Self {
        Self {
            embeddings,
            index,
            reranker,
            generator,
            resolver,
            cache,
            topics,
            history,
            settings,
        }
    }

    pub async fn execute(&self, request: QueryRequest) -> RagResult<QueryResult> {
        // Validate input
        let question = request.question.trim();
        if question.is_empty() {
            return Err(RagError::invalid_input("Question cannot be empty"));
        }
        if request.topic_ids.is_empty() {
            return Err(RagError::invalid_input("At least one topic id is required"));
        }

        let limit = request.limit.unwrap_or(self.settings.search_limit);
        let rerank_top_k = request.rerank_top_k.unwrap_or(self.settings.rerank_top_k);
        if limit == 0 || rerank_top_k == 0 {
            return Err(RagError::invalid_input(
                "limit and rerank_top_k must be positive",
            ));
        }

        let topic_ids: BTreeSet<i64> = request.topic_ids.iter().copied().collect();
        let cache_key = query_cache_key(question, &topic_ids, limit, rerank_top_k);

        if let Some(cached) = self.cache.get::<QueryResult>(&cache_key).await {
            tracing::info!("Query cache hit for {}", cache_key);
            self.record_history(&topic_ids, question, &cached, request.session_id)
                .await;
            return Ok(cached);
        }

        let result = self
            .run_pipeline(question, &topic_ids, limit, rerank_top_k)
            .await?;

        let ttl = if result.is_empty() {
            EMPTY_RESULT_TTL
        } else {
            RESULT_TTL
        };
        self.cache.put(&cache_key, &result, ttl).await;

        self.record_history(&topic_ids, question, &result, request.session_id)
            .await;
        Ok(result)
    }

    async fn run_pipeline(
        &self,
        question: &str,
        topic_ids: &BTreeSet<i64>,
        limit: usize,
        rerank_top_k: usize,
    ) -> RagResult<QueryResult> {
        let context_ids = self.resolver.resolve(topic_ids).await?;
        if context_ids.is_empty() {
            tracing::info!("Topics {:?} have no contexts", topic_ids);
            return Ok(QueryResult::no_relevant_information());
        }

        let query_vector = self.embeddings.embed(question).await?;

        let mut hits = with_timeout(
            self.settings.search_timeout,
            "vector search",
            self.index.search(
                &self.settings.collection,
                &query_vector,
                &context_ids,
                limit,
            ),
        )
        .await?;

        // Never trust the backend filter alone.
        hits.retain(|hit| context_ids.contains(&hit.payload.context_id));
        if hits.is_empty() {
            tracing::info!("No hits for topics {:?}", topic_ids);
            return Ok(QueryResult::no_relevant_information());
        }

        let reranked = self
            .reranker
            .rerank(question, hits, Some(rerank_top_k))
            .await?;

        let options = GenerationOptions {
            system_prompt: self.system_prompt_for(topic_ids).await?,
            ..self.settings.generation.clone()
        };
        let answer = self.generator.generate(question, &reranked, &options).await?;

        let sources = reranked.iter().map(Source::from).collect();
        Ok(QueryResult {
            answer,
            sources,
            context_items: reranked,
        })
    }

    /// The first topic (by id) that defines a system prompt wins.
    async fn system_prompt_for(&self, topic_ids: &BTreeSet<i64>) -> RagResult<Option<String>> {
        for topic_id in topic_ids {
            if let Some(topic) = self.topics.find_by_id(*topic_id).await? {
                if let Some(prompt) = topic.system_prompt() {
                    return Ok(Some(prompt.to_string()));
                }
            }
        }
        Ok(None)
    }

    async fn record_history(
        &self,
        topic_ids: &BTreeSet<i64>,
        question: &str,
        result: &QueryResult,
        session_id: Option<String>,
    ) {
        let Some(topic_id) = topic_ids.first().copied() else {
            return;
        };

        let entry = NewQuestionHistory {
            topic_id,
            question: question.to_string(),
            answer: result.answer.clone(),
            session_id: session_id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
        };

        if let Err(e) = self.history.save(&entry).await {
            tracing::warn!("Failed to record question history: {}", e);
        }
    }
}
