//! Request/response contracts of the checker server's HTTP endpoints

use crate::error::SessionResult;
use crate::session::models::{CheckResult, ExportKind, ProxyAddress};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Body of `POST /upload`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadRequest {
    pub content: String,
}

/// Reply of `POST /upload`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct UploadResponse {
    pub success: bool,
    #[serde(default)]
    pub proxies: Option<Vec<ProxyAddress>>,
    #[serde(default)]
    pub count: Option<usize>,
}

/// File returned by `GET /export/{kind}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedFile {
    /// Name suggested by the server, if any
    pub file_name: Option<String>,
    pub bytes: Vec<u8>,
}

/// HTTP endpoints used by the session. Each call is exactly one request.
#[async_trait]
pub trait ProxyApi: Send + Sync {
    async fn upload(&self, request: UploadRequest) -> SessionResult<UploadResponse>;

    async fn export(&self, kind: ExportKind, results: &[CheckResult]) -> SessionResult<ExportedFile>;
}
