use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeSet;
use std::time::Duration;

use crate::application::ports::VectorIndex;
use crate::application::ports::vector_index::{
    DistanceMetric, PointPayload, SearchHit, VectorIndexError, VectorPoint, compare_hits,
};

#[derive(Debug, Clone)]
pub struct QdrantConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl QdrantConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self {
            base_url: format!("http://{}:{}", host, port),
            api_key: None,
            timeout_secs: 10,
        }
    }
}

#[derive(Deserialize)]
struct QdrantEnvelope<T> {
    result: T,
}

#[derive(Deserialize)]
struct CollectionInfo {
    config: CollectionConfig,
}

#[derive(Deserialize)]
struct CollectionConfig {
    params: CollectionParams,
}

#[derive(Deserialize)]
struct CollectionParams {
    vectors: VectorParams,
}

#[derive(Serialize, Deserialize)]
struct VectorParams {
    size: usize,
    distance: String,
}

#[derive(Deserialize)]
struct UpdateResult {
    operation_id: Option<u64>,
}

#[derive(Deserialize)]
struct ScoredPoint {
    id: i64,
    score: f32,
    payload: Option<PointPayload>,
}

/// Vector index backed by the Qdrant REST API.
pub struct QdrantVectorIndex {
    client: Client,
    config: QdrantConfig,
}

impl QdrantVectorIndex {
    pub fn new(config: QdrantConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let builder = self.client.request(method, self.url(path));
        match &self.config.api_key {
            Some(key) => builder.header("api-key", key),
            None => builder,
        }
    }

    async fn send(&self, builder: reqwest::RequestBuilder) -> Result<Response, VectorIndexError> {
        builder.send().await.map_err(|e| {
            VectorIndexError::ConnectionError(format!("Qdrant request failed: {}", e.without_url()))
        })
    }

    async fn check(response: Response, collection: &str) -> Result<Response, VectorIndexError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(match status {
            StatusCode::NOT_FOUND => VectorIndexError::CollectionNotFound(collection.to_string()),
            s if s == StatusCode::TOO_MANY_REQUESTS
                || s == StatusCode::REQUEST_TIMEOUT
                || s.is_server_error() =>
            {
                VectorIndexError::ConnectionError(format!("Qdrant returned {}: {}", s, body))
            }
            s => VectorIndexError::BackendError(format!("Qdrant returned {}: {}", s, body)),
        })
    }

    async fn decode<T: for<'de> Deserialize<'de>>(response: Response) -> Result<T, VectorIndexError> {
        response
            .json::<QdrantEnvelope<T>>()
            .await
            .map(|envelope| envelope.result)
            .map_err(|e| VectorIndexError::BackendError(format!("Unexpected Qdrant response: {}", e)))
    }

    async fn create_collection(
        &self,
        name: &str,
        dimension: usize,
        metric: DistanceMetric,
    ) -> Result<(), VectorIndexError> {
        let body = json!({
            "vectors": VectorParams { size: dimension, distance: metric.as_str().to_string() }
        });
        let response = self
            .send(self.request(reqwest::Method::PUT, &format!("/collections/{}", name)).json(&body))
            .await?;
        Self::check(response, name).await?;

        // Payload index on context_id for the search filter.
        let index_body = json!({ "field_name": "context_id", "field_schema": "integer" });
        let response = self
            .send(
                self.request(reqwest::Method::PUT, &format!("/collections/{}/index", name))
                    .json(&index_body),
            )
            .await?;
        Self::check(response, name).await?;

        tracing::info!("Created Qdrant collection {} (dimension {})", name, dimension);
        Ok(())
    }
}

fn context_filter(key_match: serde_json::Value) -> serde_json::Value {
    json!({ "must": [{ "key": "context_id", "match": key_match }] })
}

#[async_trait]
impl VectorIndex for QdrantVectorIndex {
    async fn ensure_collection(
        &self,
        name: &str,
        dimension: usize,
        metric: DistanceMetric,
    ) -> Result<(), VectorIndexError> {
        match self.collection_dimension(name).await? {
            Some(existing) if existing != dimension => Err(VectorIndexError::DimensionMismatch {
                expected: existing,
                actual: dimension,
            }),
            Some(_) => Ok(()),
            None => self.create_collection(name, dimension, metric).await,
        }
    }

    async fn recreate_collection(
        &self,
        name: &str,
        dimension: usize,
        metric: DistanceMetric,
    ) -> Result<(), VectorIndexError> {
        let response = self
            .send(self.request(reqwest::Method::DELETE, &format!("/collections/{}", name)))
            .await?;
        match Self::check(response, name).await {
            Ok(_) | Err(VectorIndexError::CollectionNotFound(_)) => {}
            Err(e) => return Err(e),
        }

        self.create_collection(name, dimension, metric).await
    }

    async fn collection_dimension(&self, name: &str) -> Result<Option<usize>, VectorIndexError> {
        let response = self
            .send(self.request(reqwest::Method::GET, &format!("/collections/{}", name)))
            .await?;

        match Self::check(response, name).await {
            Ok(response) => {
                let info: CollectionInfo = Self::decode(response).await?;
                Ok(Some(info.config.params.vectors.size))
            }
            Err(VectorIndexError::CollectionNotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn upsert(&self, collection: &str, point: VectorPoint) -> Result<String, VectorIndexError> {
        if point.vector.is_empty() {
            return Err(VectorIndexError::InvalidInput("Empty vector".to_string()));
        }

        let body = json!({
            "points": [{
                "id": point.id,
                "vector": point.vector,
                "payload": point.payload,
            }]
        });

        let response = self
            .send(
                self.request(
                    reqwest::Method::PUT,
                    &format!("/collections/{}/points?wait=true", collection),
                )
                .json(&body),
            )
            .await?;
        let response = Self::check(response, collection).await?;
        let result: UpdateResult = Self::decode(response).await?;

        Ok(result
            .operation_id
            .map(|id| id.to_string())
            .unwrap_or_else(|| point.id.to_string()))
    }

    async fn delete_by_context(
        &self,
        collection: &str,
        context_id: i64,
    ) -> Result<(), VectorIndexError> {
        let body = json!({ "filter": context_filter(json!({ "value": context_id })) });
        let response = self
            .send(
                self.request(
                    reqwest::Method::POST,
                    &format!("/collections/{}/points/delete?wait=true", collection),
                )
                .json(&body),
            )
            .await?;

        match Self::check(response, collection).await {
            Ok(_) | Err(VectorIndexError::CollectionNotFound(_)) => Ok(()),
            Err(e) => Err(e),
        }
    }

    async fn search(
        &self,
        collection: &str,
        query_vector: &[f32],
        context_ids: &BTreeSet<i64>,
        limit: usize,
    ) -> Result<Vec<SearchHit>, VectorIndexError> {
        if query_vector.is_empty() {
            return Err(VectorIndexError::InvalidInput("Empty query vector".to_string()));
        }
        if context_ids.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        let body = json!({
            "vector": query_vector,
            "filter": context_filter(json!({ "any": context_ids })),
            "limit": limit,
            "with_payload": true,
        });

        let response = self
            .send(
                self.request(
                    reqwest::Method::POST,
                    &format!("/collections/{}/points/search", collection),
                )
                .json(&body),
            )
            .await?;
        let response = Self::check(response, collection).await?;
        let points: Vec<ScoredPoint> = Self::decode(response).await?;

        let mut hits: Vec<SearchHit> = points
            .into_iter()
            .filter_map(|point| {
                let payload = point.payload?;
                context_ids.contains(&payload.context_id).then_some(SearchHit {
                    id: point.id,
                    score: point.score,
                    payload,
                    rerank_score: None,
                })
            })
            .collect();

        hits.sort_by(compare_hits);
        hits.truncate(limit);
        Ok(hits)
    }
}
