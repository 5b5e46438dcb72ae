//! In-memory stand-in for the server's HTTP endpoints

use crate::error::{SessionError, SessionResult};
use crate::session::api::{ExportedFile, ProxyApi, UploadRequest, UploadResponse};
use crate::session::models::{CheckResult, ExportKind, FilterMode};
use async_trait::async_trait;
use std::sync::Mutex;

enum UploadBehaviour {
    Accept(Vec<String>),
    Reject,
    Fail,
}

pub struct FakeApi {
    upload: UploadBehaviour,
    fail_export: bool,
    uploads: Mutex<Vec<String>>,
    exports: Mutex<Vec<(ExportKind, Vec<CheckResult>)>>,
}

impl FakeApi {
    fn with(upload: UploadBehaviour) -> Self {
        Self {
            upload,
            fail_export: false,
            uploads: Mutex::new(Vec::new()),
            exports: Mutex::new(Vec::new()),
        }
    }

    pub fn accepting(proxies: &[&str]) -> Self {
        Self::with(UploadBehaviour::Accept(
            proxies.iter().map(|p| p.to_string()).collect(),
        ))
    }

    pub fn rejecting() -> Self {
        Self::with(UploadBehaviour::Reject)
    }

    pub fn unreachable() -> Self {
        Self::with(UploadBehaviour::Fail)
    }

    pub fn failing_export(mut self) -> Self {
        self.fail_export = true;
        self
    }

    pub fn uploads(&self) -> Vec<String> {
        self.uploads.lock().unwrap().clone()
    }

    pub fn exports(&self) -> Vec<(ExportKind, Vec<CheckResult>)> {
        self.exports.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProxyApi for FakeApi {
    async fn upload(&self, request: UploadRequest) -> SessionResult<UploadResponse> {
        self.uploads.lock().unwrap().push(request.content);

        match &self.upload {
            UploadBehaviour::Accept(proxies) => Ok(UploadResponse {
                success: true,
                proxies: Some(proxies.clone()),
                count: Some(proxies.len()),
            }),
            UploadBehaviour::Reject => Ok(UploadResponse::default()),
            UploadBehaviour::Fail => Err(SessionError::Upload("connection refused".to_string())),
        }
    }

    async fn export(&self, kind: ExportKind, results: &[CheckResult]) -> SessionResult<ExportedFile> {
        self.exports.lock().unwrap().push((kind, results.to_vec()));

        if self.fail_export {
            return Err(SessionError::Export("HTTP status: 500".to_string()));
        }

        let filter = match kind {
            ExportKind::All => FilterMode::All,
            ExportKind::Valid => FilterMode::Valid,
            ExportKind::Invalid => FilterMode::Invalid,
        };
        let body = results
            .iter()
            .filter(|r| filter.admits(r))
            .map(|r| r.proxy.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        Ok(ExportedFile {
            file_name: None,
            bytes: body.into_bytes(),
        })
    }
}
