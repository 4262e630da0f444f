use std::cmp::Ordering;
use std::sync::Arc;
use std::time::Duration;

use crate::application::ports::CrossEncoder;
use crate::application::ports::vector_index::SearchHit;
use crate::application::services::deadline::with_timeout;
use crate::domain::errors::{RagError, RagResult};

pub const DEFAULT_RERANK_TIMEOUT: Duration = Duration::from_secs(5);

/// Second-stage scoring of retrieved hits with a cross-encoder.
pub struct RerankService {
    encoder: Arc<dyn CrossEncoder>,
    timeout: Duration,
}

impl RerankService {
    pub fn new(encoder: Arc<dyn CrossEncoder>) -> Self {
        Self {
            encoder,
            timeout: DEFAULT_RERANK_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn model_name(&self) -> &str {
        self.encoder.model_name()
    }

    /// Scores every `(query, hit.content)` pair, sorts by rerank score, then
    /// vector score, then id, and keeps the first `top_k` when given.
    pub async fn rerank(
        &self,
        query: &str,
        mut hits: Vec<SearchHit>,
        top_k: Option<usize>,
    ) -> RagResult<Vec<SearchHit>> {
        if query.trim().is_empty() {
            return Err(RagError::invalid_input("Rerank query cannot be empty"));
        }
        if hits.is_empty() {
            return Err(RagError::invalid_input("Nothing to rerank"));
        }

        let passages: Vec<String> = hits.iter().map(|hit| hit.payload.content.clone()).collect();
        let scores = with_timeout(self.timeout, "rerank", self.encoder.score(query, &passages))
            .await?;

        if scores.len() != hits.len() {
            return Err(RagError::permanent(format!(
                "Cross-encoder returned {} scores for {} passages",
                scores.len(),
                hits.len()
            )));
        }

        for (hit, score) in hits.iter_mut().zip(scores) {
            hit.rerank_score = Some(score);
        }
        hits.sort_by(compare_reranked);

        if let Some(top_k) = top_k {
            hits.truncate(top_k);
        }

        tracing::debug!("Reranked {} hits with {}", hits.len(), self.model_name());
        Ok(hits)
    }
}

fn compare_reranked(a: &SearchHit, b: &SearchHit) -> Ordering {
    let by_rerank = b
        .rerank_score
        .unwrap_or(f32::NEG_INFINITY)
        .partial_cmp(&a.rerank_score.unwrap_or(f32::NEG_INFINITY))
        .unwrap_or(Ordering::Equal);

    by_rerank
        .then_with(|| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal))
        .then_with(|| a.id.cmp(&b.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FakeCrossEncoder, hit};

    #[tokio::test]
    async fn test_rerank_tie_break() {
        // Vector scores [0.9, 0.9, 0.8], rerank scores [0.5, 0.5, 0.9].
        let hits = vec![hit(12, 0.9, "alpha"), hit(11, 0.9, "beta"), hit(13, 0.8, "gamma")];
        let encoder = Arc::new(FakeCrossEncoder::with_scores(&[
            ("alpha", 0.5),
            ("beta", 0.5),
            ("gamma", 0.9),
        ]));
        let service = RerankService::new(encoder);

        let ranked = service.rerank("question", hits, None).await.unwrap();
        let ids: Vec<i64> = ranked.iter().map(|h| h.id).collect();

        assert_eq!(ids, vec![13, 11, 12]);
        assert_eq!(ranked[0].rerank_score, Some(0.9));
    }

    #[tokio::test]
    async fn test_vector_score_breaks_rerank_ties() {
        let hits = vec![hit(1, 0.4, "a"), hit(2, 0.7, "b")];
        let encoder = Arc::new(FakeCrossEncoder::with_scores(&[("a", 0.2), ("b", 0.2)]));

        let ranked = RerankService::new(encoder)
            .rerank("q", hits, None)
            .await
            .unwrap();
        assert_eq!(ranked[0].id, 2);
    }

    #[tokio::test]
    async fn test_top_k_truncates_after_sorting() {
        let hits = vec![hit(1, 0.9, "a"), hit(2, 0.8, "b"), hit(3, 0.7, "c")];
        let encoder = Arc::new(FakeCrossEncoder::with_scores(&[
            ("a", 0.1),
            ("b", 0.2),
            ("c", 0.3),
        ]));

        let ranked = RerankService::new(encoder)
            .rerank("q", hits, Some(2))
            .await
            .unwrap();
        let ids: Vec<i64> = ranked.iter().map(|h| h.id).collect();
        assert_eq!(ids, vec![3, 2]);
    }

    #[tokio::test]
    async fn test_top_k_larger_than_input_keeps_all() {
        let hits = vec![hit(1, 0.9, "a")];
        let encoder = Arc::new(FakeCrossEncoder::with_scores(&[("a", 0.1)]));

        let ranked = RerankService::new(encoder)
            .rerank("q", hits, Some(10))
            .await
            .unwrap();
        assert_eq!(ranked.len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_input() {
        let encoder = Arc::new(FakeCrossEncoder::with_scores(&[]));
        let service = RerankService::new(encoder.clone());

        let empty_query = service.rerank(" ", vec![hit(1, 0.5, "a")], None).await;
        assert!(matches!(empty_query, Err(RagError::InvalidInput(_))));

        let no_hits = service.rerank("q", Vec::new(), None).await;
        assert!(matches!(no_hits, Err(RagError::InvalidInput(_))));
        assert_eq!(encoder.calls(), 0);
    }
}
