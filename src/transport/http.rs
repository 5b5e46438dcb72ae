//! HTTP backend for the upload and export endpoints

use crate::error::{SessionError, SessionResult};
use crate::session::api::{ExportedFile, ProxyApi, UploadRequest, UploadResponse};
use crate::session::export::export_url;
use crate::session::models::{CheckResult, ExportKind};
use crate::ClientConfig;
use async_trait::async_trait;
use reqwest::header::CONTENT_DISPOSITION;
use reqwest::Client;

/// `reqwest` implementation of [`ProxyApi`]
#[derive(Debug, Clone)]
pub struct HttpApi {
    client: Client,
    base_url: String,
}

impl HttpApi {
    pub fn new(config: &ClientConfig) -> crate::Result<Self> {
        let client = Client::builder().timeout(config.request_timeout).build()?;

        Ok(Self {
            client,
            base_url: config.server_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl ProxyApi for HttpApi {
    async fn upload(&self, request: UploadRequest) -> SessionResult<UploadResponse> {
        let url = format!("{}/upload", self.base_url);
        tracing::debug!(%url, bytes = request.content.len(), "uploading proxy file");

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| SessionError::Upload(e.to_string()))?;

        response
            .json::<UploadResponse>()
            .await
            .map_err(|e| SessionError::Upload(format!("unreadable reply: {}", e)))
    }

    async fn export(&self, kind: ExportKind, results: &[CheckResult]) -> SessionResult<ExportedFile> {
        let url = export_url(&self.base_url, kind, results)?;
        tracing::debug!(%kind, results = results.len(), "requesting export");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| SessionError::Export(e.to_string()))?;

        if !response.status().is_success() {
            return Err(SessionError::Export(format!("HTTP status: {}", response.status())));
        }

        let file_name = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|value| value.to_str().ok())
            .and_then(disposition_file_name);

        let bytes = response
            .bytes()
            .await
            .map_err(|e| SessionError::Export(e.to_string()))?;

        Ok(ExportedFile {
            file_name,
            bytes: bytes.to_vec(),
        })
    }
}

/// Extract `filename` from a `Content-Disposition` header value
fn disposition_file_name(header: &str) -> Option<String> {
    header.split(';').map(str::trim).find_map(|part| {
        let value = part.strip_prefix("filename=")?;
        let value = value.trim_matches('"');
        (!value.is_empty()).then(|| value.to_string())
    })
}
