//! Proxy Check Client - session controller for a streaming proxy checker
//!
//! This crate drives a proxy check that runs on a remote server. It uploads
//! a proxy list, starts and cancels checks over a stream channel, keeps the
//! streamed results with their counts and filtered views, and exports them.

pub mod client;
pub mod error;
pub mod logging;
pub mod session;
pub mod transport;
pub mod tui;

pub use client::{Command, SessionClient};
pub use error::{SessionError, SessionResult};
pub use session::*;

use std::path::PathBuf;
use std::time::Duration;

/// Application result type
pub type Result<T> = anyhow::Result<T>;

/// Default base URL of the checker server
const DEFAULT_SERVER_URL: &str = "http://localhost:3000";

/// Default URL of the stream channel
const DEFAULT_STREAM_URL: &str = "ws://localhost:3000/ws";

/// Default timeout for upload and export requests in seconds
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Application configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the upload and export endpoints
    pub server_url: String,
    /// URL of the stream channel
    pub stream_url: String,
    /// Directory exported files are written to
    pub output_dir: PathBuf,
    /// Timeout for each HTTP request
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            stream_url: DEFAULT_STREAM_URL.to_string(),
            output_dir: PathBuf::from("."),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_server_url(mut self, url: String) -> Self {
        self.server_url = url;
        self
    }

    pub fn with_stream_url(mut self, url: String) -> Self {
        self.stream_url = url;
        self
    }

    pub fn with_output_dir(mut self, dir: PathBuf) -> Self {
        self.output_dir = dir;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_config_default() {
        let config = ClientConfig::default();
        assert_eq!(config.server_url, DEFAULT_SERVER_URL);
        assert_eq!(config.stream_url, DEFAULT_STREAM_URL);
        assert_eq!(config.request_timeout, Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS));
    }

    #[test]
    fn test_client_config_builder() {
        let config = ClientConfig::new()
            .with_server_url("http://checker:8000".to_string())
            .with_stream_url("ws://checker:8000/ws".to_string())
            .with_output_dir(PathBuf::from("/tmp/exports"))
            .with_request_timeout(Duration::from_secs(5));

        assert_eq!(config.server_url, "http://checker:8000");
        assert_eq!(config.stream_url, "ws://checker:8000/ws");
        assert_eq!(config.output_dir, PathBuf::from("/tmp/exports"));
        assert_eq!(config.request_timeout, Duration::from_secs(5));
    }
}
