//! Exporting check results through the server's export endpoint

use crate::error::{SessionError, SessionResult};
use crate::session::api::ProxyApi;
use crate::session::models::{CheckResult, ExportKind};
use reqwest::Url;
use std::path::{Path, PathBuf};

/// Build `{base}/export/{kind}?data=<url-encoded JSON array>`
pub fn export_url(base: &str, kind: ExportKind, results: &[CheckResult]) -> SessionResult<Url> {
    let data = serde_json::to_string(results)?;
    let endpoint = format!("{}/export/{}", base.trim_end_matches('/'), kind.as_path());

    Url::parse_with_params(&endpoint, &[("data", data.as_str())])
        .map_err(|e| SessionError::Export(format!("invalid export URL {}: {}", endpoint, e)))
}

/// Saves export payloads into a local directory
#[derive(Debug, Clone)]
pub struct ExportService {
    output_dir: PathBuf,
}

impl ExportService {
    pub fn new<P: AsRef<Path>>(output_dir: P) -> Self {
        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
        }
    }

    /// Send the full result sequence with `kind` to the export endpoint and
    /// write the returned file. Empty input fails before any request.
    pub async fn export<A>(
        &self,
        api: &A,
        results: &[CheckResult],
        kind: ExportKind,
    ) -> SessionResult<PathBuf>
    where
        A: ProxyApi + ?Sized,
    {
        if results.is_empty() {
            return Err(SessionError::EmptyResult);
        }

        let file = api.export(kind, results).await?;
        let file_name = file
            .file_name
            .as_deref()
            .and_then(sanitize_file_name)
            .unwrap_or_else(|| default_file_name(kind));

        tokio::fs::create_dir_all(&self.output_dir).await?;
        let path = self.output_dir.join(file_name);
        tokio::fs::write(&path, &file.bytes).await?;

        tracing::debug!(path = %path.display(), bytes = file.bytes.len(), "export saved");
        Ok(path)
    }
}

fn default_file_name(kind: ExportKind) -> String {
    format!("{}-proxies.txt", kind.as_path())
}

/// Keep only the final path component of a server-suggested name
fn sanitize_file_name(name: &str) -> Option<String> {
    let name = name.rsplit(|c: char| c == '/' || c == '\\').next()?.trim();
    if name.is_empty() || name == "." || name == ".." {
        None
    } else {
        Some(name.to_string())
    }
}
