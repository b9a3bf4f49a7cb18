//! The generative backend's files API, wired as an [`UploadBackend`] so
//! [`scout_upload::UploadCoordinator`] can drive it directly.

use crate::client::GenerativeClient;
use crate::error::{map_http_status, map_reqwest_error};
use scout_errors::ScoutError;
use scout_upload::{UploadBackend, UploadHandle, UploadState};
use serde::Deserialize;

#[derive(Deserialize)]
struct FileUploadResponse {
    uri: String,
    mime_type: String,
    expires_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Deserialize)]
struct FileStatusResponse {
    state: String,
    #[serde(default)]
    error: Option<String>,
}

#[async_trait::async_trait]
impl UploadBackend for GenerativeClient {
    async fn upload(&self, bytes: &[u8], mime_type: &str) -> Result<UploadHandle, ScoutError> {
        let response = self
            .http()
            .post(format!("{}/files", self.base_url_str()))
            .bearer_auth(self.api_key_str())
            .header("content-type", mime_type)
            .body(bytes.to_vec())
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        let body = response.text().await.map_err(map_reqwest_error)?;
        if !status.is_success() {
            return Err(map_http_status(status, &body));
        }

        let parsed: FileUploadResponse =
            serde_json::from_str(&body).map_err(|e| ScoutError::Other(Box::new(e)))?;
        Ok(UploadHandle { uri: parsed.uri, mime_type: parsed.mime_type, expires_at: parsed.expires_at })
    }

    async fn poll_status(&self, uri: &str) -> Result<UploadState, ScoutError> {
        let response = self
            .http()
            .get(format!("{}/files/status", self.base_url_str()))
            .bearer_auth(self.api_key_str())
            .query(&[("uri", uri)])
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        let body = response.text().await.map_err(map_reqwest_error)?;
        if !status.is_success() {
            return Err(map_http_status(status, &body));
        }

        let parsed: FileStatusResponse =
            serde_json::from_str(&body).map_err(|e| ScoutError::Other(Box::new(e)))?;
        Ok(match parsed.state.as_str() {
            "active" => UploadState::Active,
            "failed" => UploadState::Failed(parsed.error.unwrap_or_else(|| "unknown upload failure".to_string())),
            _ => UploadState::Processing,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn upload_parses_handle_from_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/files"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "uri": "files/abc123",
                "mime_type": "video/mp4",
                "expires_at": "2030-01-01T00:00:00Z",
            })))
            .mount(&server)
            .await;

        let client = GenerativeClient::new("key").base_url(server.uri());
        let handle = client.upload(b"bytes", "video/mp4").await.unwrap();
        assert_eq!(handle.uri, "files/abc123");
    }

    #[tokio::test]
    async fn poll_status_maps_backend_states() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/files/status"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"state": "active"})))
            .mount(&server)
            .await;

        let client = GenerativeClient::new("key").base_url(server.uri());
        let state = client.poll_status("files/abc123").await.unwrap();
        assert_eq!(state, UploadState::Active);
    }
}
