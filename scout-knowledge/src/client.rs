//! A thin REST client for the knowledge store, modeled as a schema-bearing
//! document/vector store behind a small set of endpoints: `GET/POST /v1/schema`,
//! `PATCH /v1/schema/{collection}`, `POST /v1/objects`, `POST /v1/search`.

use crate::schema::{default_schema, missing_properties, CollectionDef};
use scout_errors::ScoutError;
use serde_json::json;

/// A connected knowledge store client.
#[derive(Clone)]
pub struct KnowledgeClient {
    base_url: String,
    api_key: String,
    http: reqwest::Client,
}

impl KnowledgeClient {
    /// Construct a client for the knowledge store at `base_url`.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        KnowledgeClient { base_url: base_url.into(), api_key: api_key.into(), http: reqwest::Client::new() }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    async fn get_json(&self, path: &str) -> Result<Option<serde_json::Value>, ScoutError> {
        let response = self
            .http
            .get(self.url(path))
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| ScoutError::KnowledgeConnection(e.to_string()))?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(ScoutError::KnowledgeSchema(format!("GET {path}: {}", response.status())));
        }
        response
            .json()
            .await
            .map(Some)
            .map_err(|e| ScoutError::KnowledgeSchema(e.to_string()))
    }

    async fn post_json(&self, path: &str, body: &serde_json::Value) -> Result<(), ScoutError> {
        let response = self
            .http
            .post(self.url(path))
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| ScoutError::KnowledgeConnection(e.to_string()))?;
        if !response.status().is_success() {
            return Err(ScoutError::KnowledgeSchema(format!("POST {path}: {}", response.status())));
        }
        Ok(())
    }

    async fn patch_json(&self, path: &str, body: &serde_json::Value) -> Result<(), ScoutError> {
        let response = self
            .http
            .patch(self.url(path))
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| ScoutError::KnowledgeConnection(e.to_string()))?;
        if !response.status().is_success() {
            return Err(ScoutError::KnowledgeSchema(format!("PATCH {path}: {}", response.status())));
        }
        Ok(())
    }

    /// Idempotently bring the backend schema up to date with
    /// [`default_schema`]: missing collections are created, existing
    /// collections have their missing properties appended. Never removes
    /// or retypes an existing property.
    pub async fn ensure_collections(&self) -> Result<(), ScoutError> {
        for wanted in default_schema() {
            self.ensure_collection(&wanted).await?;
        }
        Ok(())
    }

    async fn ensure_collection(&self, wanted: &CollectionDef) -> Result<(), ScoutError> {
        let existing = self.get_json(&format!("/v1/schema/{}", wanted.name)).await?;

        let Some(existing) = existing else {
            return self
                .post_json(
                    "/v1/schema",
                    &json!({
                        "class": wanted.name,
                        "properties": wanted.properties,
                    }),
                )
                .await;
        };

        let existing_properties: Vec<crate::schema::PropertyDef> = existing
            .get("properties")
            .and_then(|v| serde_json::from_value(v.clone()).ok())
            .unwrap_or_default();
        let missing = missing_properties(&existing_properties, &wanted.properties);
        if missing.is_empty() {
            return Ok(());
        }

        self.patch_json(&format!("/v1/schema/{}/properties", wanted.name), &json!({ "properties": missing })).await
    }

    /// Insert or replace an object in `collection`, keyed by `object_id`.
    pub async fn put_object(
        &self,
        collection: &str,
        object_id: &str,
        properties: serde_json::Value,
    ) -> Result<(), ScoutError> {
        self.post_json(
            "/v1/objects",
            &json!({
                "class": collection,
                "id": object_id,
                "properties": properties,
            }),
        )
        .await
    }

    /// Fetch a single object by id, or `None` if it does not exist.
    pub async fn get_object(&self, collection: &str, object_id: &str) -> Result<Option<serde_json::Value>, ScoutError> {
        self.get_json(&format!("/v1/objects/{collection}/{object_id}")).await
    }

    /// Aggregate per-collection object counts, as reported by the backend.
    pub async fn stats(&self) -> Result<serde_json::Value, ScoutError> {
        Ok(self.get_json("/v1/stats").await?.unwrap_or_else(|| json!({})))
    }

    /// Run a search query against `collection` and return raw hits (each
    /// `{object_id, score, properties}`) — reranking and summarization are
    /// applied by the search pipeline, not here.
    pub async fn search(
        &self,
        collection: &str,
        query: &str,
        search_type: &str,
        alpha: f64,
        filter: Option<&serde_json::Value>,
        limit: usize,
    ) -> Result<Vec<(String, f64, serde_json::Value)>, ScoutError> {
        let response = self
            .http
            .post(self.url("/v1/search"))
            .bearer_auth(&self.api_key)
            .json(&json!({
                "class": collection,
                "query": query,
                "search_type": search_type,
                "alpha": alpha,
                "filter": filter,
                "limit": limit,
            }))
            .send()
            .await
            .map_err(|e| ScoutError::KnowledgeConnection(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ScoutError::KnowledgeQuery(format!("search {collection}: {}", response.status())));
        }

        let body: serde_json::Value = response.json().await.map_err(|e| ScoutError::KnowledgeQuery(e.to_string()))?;
        let hits = body
            .get("hits")
            .and_then(|v| v.as_array())
            .cloned()
            .unwrap_or_default();

        Ok(hits
            .into_iter()
            .filter_map(|hit| {
                let object_id = hit.get("object_id")?.as_str()?.to_string();
                let score = hit.get("score")?.as_f64().unwrap_or(0.0);
                let properties = hit.get("properties").cloned().unwrap_or(serde_json::Value::Null);
                Some((object_id, score, properties))
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn ensure_collections_creates_missing_collection() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/schema"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let client = KnowledgeClient::new(server.uri(), "key");
        client.ensure_collections().await.unwrap();
    }

    #[tokio::test]
    async fn search_parses_hits_from_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "hits": [{"object_id": "abc", "score": 0.8, "properties": {"summary": "hi"}}]
            })))
            .mount(&server)
            .await;

        let client = KnowledgeClient::new(server.uri(), "key");
        let hits = client.search("VideoAnalyses", "query", "hybrid", 0.5, None, 10).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].0, "abc");
        assert_eq!(hits[0].1, 0.8);
    }

    #[tokio::test]
    async fn search_surfaces_backend_error_as_knowledge_query() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/search"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = KnowledgeClient::new(server.uri(), "key");
        let err = client.search("VideoAnalyses", "query", "hybrid", 0.5, None, 10).await.unwrap_err();
        assert!(matches!(err, ScoutError::KnowledgeQuery(_)));
    }
}
