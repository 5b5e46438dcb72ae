//! Check session data models

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Opaque proxy identifier as uploaded (`host:port[:credentials]`)
pub type ProxyAddress = String;

/// Outcome of checking a single proxy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Valid,
    Invalid,
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckStatus::Valid => write!(f, "Valid"),
            CheckStatus::Invalid => write!(f, "Invalid"),
        }
    }
}

/// Country code the server reports when geolocation failed
pub const UNKNOWN_COUNTRY: &str = "Unknown";

/// Result of one proxy check as streamed by the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckResult {
    pub proxy: ProxyAddress,
    pub status: CheckStatus,
    #[serde(rename = "type", default)]
    pub proxy_type: String,
    #[serde(rename = "country", default = "unknown_country")]
    pub country_code: String,
    #[serde(default)]
    pub country_name: String,
    #[serde(default)]
    pub city: String,
    #[serde(rename = "responseTime", default, deserialize_with = "null_as_zero")]
    pub response_time_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
}

fn unknown_country() -> String {
    UNKNOWN_COUNTRY.to_string()
}

/// Failed checks may report `"responseTime": null`
fn null_as_zero<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    Ok(Option::<u64>::deserialize(deserializer)?.unwrap_or_default())
}

impl CheckResult {
    /// Create a result with unknown location and no HTTP status
    pub fn new(proxy: impl Into<ProxyAddress>, status: CheckStatus) -> Self {
        Self {
            proxy: proxy.into(),
            status,
            proxy_type: String::new(),
            country_code: unknown_country(),
            country_name: String::new(),
            city: String::new(),
            response_time_ms: 0,
            status_code: None,
        }
    }

    pub fn valid(proxy: impl Into<ProxyAddress>, response_time_ms: u64) -> Self {
        Self {
            response_time_ms,
            status_code: Some(200),
            ..Self::new(proxy, CheckStatus::Valid)
        }
    }

    pub fn invalid(proxy: impl Into<ProxyAddress>) -> Self {
        Self::new(proxy, CheckStatus::Invalid)
    }

    pub fn with_location(mut self, country_code: &str, country_name: &str, city: &str) -> Self {
        self.country_code = country_code.to_string();
        self.country_name = country_name.to_string();
        self.city = city.to_string();
        self
    }

    pub fn is_valid(&self) -> bool {
        self.status == CheckStatus::Valid
    }
}

/// Which subset of results the view shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterMode {
    #[default]
    All,
    Valid,
    Invalid,
}

impl FilterMode {
    /// Whether a result passes this filter
    pub fn admits(self, result: &CheckResult) -> bool {
        match self {
            FilterMode::All => true,
            FilterMode::Valid => result.is_valid(),
            FilterMode::Invalid => !result.is_valid(),
        }
    }

    /// Next mode in All -> Valid -> Invalid order
    pub fn cycle(self) -> Self {
        match self {
            FilterMode::All => FilterMode::Valid,
            FilterMode::Valid => FilterMode::Invalid,
            FilterMode::Invalid => FilterMode::All,
        }
    }
}

impl fmt::Display for FilterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterMode::All => write!(f, "all"),
            FilterMode::Valid => write!(f, "valid"),
            FilterMode::Invalid => write!(f, "invalid"),
        }
    }
}

/// Subset requested from the export endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportKind {
    #[default]
    All,
    Valid,
    Invalid,
}

impl ExportKind {
    /// Path segment used by `/export/{kind}`
    pub fn as_path(self) -> &'static str {
        match self {
            ExportKind::All => "all",
            ExportKind::Valid => "valid",
            ExportKind::Invalid => "invalid",
        }
    }
}

impl fmt::Display for ExportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_path())
    }
}

impl std::str::FromStr for ExportKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all" => Ok(ExportKind::All),
            "valid" => Ok(ExportKind::Valid),
            "invalid" => Ok(ExportKind::Invalid),
            _ => Err(format!("Invalid export kind: {}. Use: all, valid, invalid", s)),
        }
    }
}

/// Lifecycle state of the current check session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JobState {
    #[default]
    Idle,
    Uploading,
    Running,
    Cancelling,
    Completed,
    Cancelled,
}

impl JobState {
    /// Whether progress without a session id may still be applied
    pub fn accepts_untagged_progress(self) -> bool {
        self == JobState::Running
    }

    /// Whether the active session may still receive stream events
    pub fn accepts_events(self) -> bool {
        matches!(self, JobState::Running | JobState::Cancelling)
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            JobState::Idle => "idle",
            JobState::Uploading => "uploading",
            JobState::Running => "running",
            JobState::Cancelling => "cancelling",
            JobState::Completed => "completed",
            JobState::Cancelled => "cancelled",
        };
        f.write_str(label)
    }
}

/// One run of checking an uploaded list against a target URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSession {
    pub id: String,
    pub target_url: String,
    pub total: u64,
    pub completed: u64,
}

impl JobSession {
    pub fn new(id: String, target_url: String, total: u64) -> Self {
        Self {
            id,
            target_url,
            total,
            completed: 0,
        }
    }
}

/// Counts derived from the stored results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Aggregate {
    pub valid_count: usize,
    pub invalid_count: usize,
    pub total: usize,
}

/// Latest completed/total pair received from the stream
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Progress {
    pub completed: u64,
    pub total: u64,
    pub finished: bool,
}

impl Progress {
    /// Percentage for the progress bar, pinned to 100 once finished
    pub fn percent(&self) -> f64 {
        if self.finished {
            return 100.0;
        }
        if self.total == 0 {
            return 0.0;
        }
        (self.completed as f64 / self.total as f64 * 100.0).min(100.0)
    }

    pub fn label(&self) -> String {
        format!("{}/{}", self.completed, self.total)
    }
}

/// Enabled/visible state of the user actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Controls {
    pub start_enabled: bool,
    pub cancel_enabled: bool,
    pub export_visible: bool,
}

/// Display form of a result row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultRow {
    pub status: CheckStatus,
    pub status_label: String,
    pub proxy: String,
    pub proxy_type: String,
    pub flag: String,
    pub country_name: String,
    pub city: String,
    pub response_time: String,
    pub status_code: String,
}

impl From<&CheckResult> for ResultRow {
    fn from(result: &CheckResult) -> Self {
        let status_label = match result.status {
            CheckStatus::Valid => "✅ Valid",
            CheckStatus::Invalid => "❌ Invalid",
        };

        Self {
            status: result.status,
            status_label: status_label.to_string(),
            proxy: result.proxy.clone(),
            proxy_type: result.proxy_type.clone(),
            flag: flag_emoji(&result.country_code),
            country_name: result.country_name.clone(),
            city: result.city.clone(),
            response_time: format!("{}ms", result.response_time_ms),
            status_code: result
                .status_code
                .map_or_else(|| "N/A".to_string(), |code| code.to_string()),
        }
    }
}

/// Regional indicator flag for an ISO country code, globe for unknown
pub fn flag_emoji(country_code: &str) -> String {
    if country_code == UNKNOWN_COUNTRY || country_code.is_empty() {
        return "🌐".to_string();
    }

    country_code
        .to_uppercase()
        .chars()
        .map(|c| {
            if c.is_ascii_uppercase() {
                char::from_u32(0x1F1E6 + (c as u32 - 'A' as u32)).unwrap_or(c)
            } else {
                c
            }
        })
        .collect()
}
