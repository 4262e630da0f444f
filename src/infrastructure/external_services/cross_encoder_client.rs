use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::application::ports::{CrossEncoder, ModelProviderError};

#[derive(Debug, Clone)]
pub struct CrossEncoderConfig {
    pub service_url: String,
    pub model_name: String,
    pub timeout_secs: u64,
}

#[derive(Serialize)]
struct RerankBody<'a> {
    query: &'a str,
    texts: &'a [String],
    raw_scores: bool,
}

#[derive(Deserialize)]
struct RankedText {
    index: usize,
    score: f32,
}

/// Cross-encoder served over HTTP by a text-embeddings-inference style
/// `/rerank` endpoint.
pub struct HttpCrossEncoder {
    client: Client,
    config: CrossEncoderConfig,
}

impl HttpCrossEncoder {
    pub fn new(config: CrossEncoderConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }
}

#[async_trait]
impl CrossEncoder for HttpCrossEncoder {
    async fn score(&self, query: &str, passages: &[String]) -> Result<Vec<f32>, ModelProviderError> {
        let url = format!("{}/rerank", self.config.service_url.trim_end_matches('/'));
        let response = self
            .client
            .post(url)
            .json(&RerankBody {
                query,
                texts: passages,
                raw_scores: false,
            })
            .send()
            .await
            .map_err(ModelProviderError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ModelProviderError::from_status(status.as_u16(), message));
        }

        let ranked: Vec<RankedText> = response
            .json()
            .await
            .map_err(ModelProviderError::from_reqwest)?;

        // The service returns pairs sorted by score; put them back in input order.
        let mut scores: Vec<Option<f32>> = vec![None; passages.len()];
        for item in ranked {
            match scores.get_mut(item.index) {
                Some(slot) => *slot = Some(item.score),
                None => {
                    return Err(ModelProviderError::InvalidResponse(format!(
                        "Rerank index {} out of range",
                        item.index
                    )));
                }
            }
        }

        scores
            .into_iter()
            .enumerate()
            .map(|(i, score)| {
                score.ok_or_else(|| {
                    ModelProviderError::InvalidResponse(format!("Missing rerank score for {}", i))
                })
            })
            .collect()
    }

    fn model_name(&self) -> &str {
        &self.config.model_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn encoder_for(server: &MockServer) -> HttpCrossEncoder {
        HttpCrossEncoder::new(CrossEncoderConfig {
            service_url: server.uri(),
            model_name: "BAAI/bge-reranker-base".to_string(),
            timeout_secs: 5,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_scores_come_back_in_input_order() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rerank"))
            .and(body_partial_json(json!({ "query": "q", "texts": ["a", "b", "c"] })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "index": 2, "score": 0.9 },
                { "index": 0, "score": 0.5 },
                { "index": 1, "score": 0.1 }
            ])))
            .mount(&server)
            .await;

        let passages = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let scores = encoder_for(&server).score("q", &passages).await.unwrap();
        assert_eq!(scores, vec![0.5, 0.1, 0.9]);
    }

    #[tokio::test]
    async fn test_missing_score_is_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rerank"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "index": 0, "score": 0.5 }
            ])))
            .mount(&server)
            .await;

        let passages = vec!["a".to_string(), "b".to_string()];
        let err = encoder_for(&server).score("q", &passages).await.unwrap_err();
        assert!(matches!(err, ModelProviderError::InvalidResponse(_)));
    }
}
