use std::sync::Mutex;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("upload request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("storage gateway rejected the upload: {status} {body}")]
    Gateway { status: u16, body: String },

    #[error("failed to serialize metadata: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("upload failed: {0}")]
    Custom(String),
}

/// Content-addressed storage collaborator. The storage protocol itself is
/// external; this trait only moves bytes out and URIs back.
#[async_trait]
pub trait AssetUploader: Send + Sync + 'static {
    async fn upload(
        &self,
        bytes: Vec<u8>,
        file_name: &str,
        content_type: &str,
    ) -> Result<String, UploadError>;

    async fn upload_json(&self, value: &serde_json::Value) -> Result<String, UploadError>;
}

#[derive(Deserialize)]
struct UploadResponse {
    uri: String,
}

/// Uploader backed by an HTTP storage gateway: POST the raw bytes, read the
/// content URI from the JSON response.
pub struct HttpStorageUploader {
    endpoint: String,
    auth_token: Option<String>,
    http: reqwest::Client,
}

impl HttpStorageUploader {
    pub fn new(endpoint: String, auth_token: Option<String>) -> Self {
        Self {
            endpoint,
            auth_token,
            http: reqwest::Client::new(),
        }
    }

    async fn post(
        &self,
        bytes: Vec<u8>,
        file_name: &str,
        content_type: &str,
    ) -> Result<String, UploadError> {
        let mut request = self
            .http
            .post(format!("{}/upload", self.endpoint.trim_end_matches('/')))
            .header("Content-Type", content_type)
            .query(&[("name", file_name)])
            .body(bytes);
        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UploadError::Gateway {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: UploadResponse = response.json().await?;
        debug!("uploaded {} -> {}", file_name, parsed.uri);
        Ok(parsed.uri)
    }
}

#[async_trait]
impl AssetUploader for HttpStorageUploader {
    async fn upload(
        &self,
        bytes: Vec<u8>,
        file_name: &str,
        content_type: &str,
    ) -> Result<String, UploadError> {
        self.post(bytes, file_name, content_type).await
    }

    async fn upload_json(&self, value: &serde_json::Value) -> Result<String, UploadError> {
        let bytes = serde_json::to_vec(value)?;
        self.post(bytes, "metadata.json", "application/json").await
    }
}

/// Canned-URI uploader for tests; fails on demand without touching the
/// network.
#[derive(Default)]
pub struct TestUploader {
    pub fail: bool,
    uploads: Mutex<Vec<String>>,
}

impl TestUploader {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn uploads(&self) -> Vec<String> {
        self.uploads.lock().unwrap().clone()
    }
}

#[async_trait]
impl AssetUploader for TestUploader {
    async fn upload(
        &self,
        _bytes: Vec<u8>,
        file_name: &str,
        _content_type: &str,
    ) -> Result<String, UploadError> {
        if self.fail {
            return Err(UploadError::Custom("uploader offline".to_string()));
        }
        let uri = format!("https://storage.test/{}", file_name);
        self.uploads.lock().unwrap().push(uri.clone());
        Ok(uri)
    }

    async fn upload_json(&self, value: &serde_json::Value) -> Result<String, UploadError> {
        if self.fail {
            return Err(UploadError::Custom("uploader offline".to_string()));
        }
        let name = value
            .get("name")
            .and_then(|v| v.as_str())
            .unwrap_or("metadata");
        let uri = format!("https://storage.test/{}.json", name);
        self.uploads.lock().unwrap().push(uri.clone());
        Ok(uri)
    }
}
