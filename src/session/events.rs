//! Stream channel messages exchanged with the checker server
//!
//! Every message travels as one JSON frame `{"event": "<name>", "data": <payload>}`.

use crate::error::{SessionError, SessionResult};
use crate::session::models::{CheckResult, ProxyAddress};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Progress for one checked proxy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    pub completed: u64,
    pub total: u64,
    pub result: CheckResult,
    /// Session id, when the server echoes it back
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_id: Option<String>,
}

/// Final counts for a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteEvent {
    pub valid: u64,
    pub invalid: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_id: Option<String>,
}

/// Server to client messages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ServerEvent {
    #[serde(rename = "check-progress")]
    Progress(ProgressEvent),
    #[serde(rename = "check-complete")]
    Complete(CompleteEvent),
}

impl ServerEvent {
    pub fn decode(frame: &str) -> SessionResult<Self> {
        Ok(serde_json::from_str(frame)?)
    }

    /// Session id attached by the server, if any
    pub fn check_id(&self) -> Option<&str> {
        match self {
            ServerEvent::Progress(evt) => evt.check_id.as_deref(),
            ServerEvent::Complete(evt) => evt.check_id.as_deref(),
        }
    }
}

/// Payload of `start-check`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartCheck {
    pub proxies: Vec<ProxyAddress>,
    pub target_url: String,
    pub check_id: String,
}

/// Client to server messages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ClientEvent {
    #[serde(rename = "start-check")]
    StartCheck(StartCheck),
    /// Carries the id of the session to cancel
    #[serde(rename = "cancel-check")]
    CancelCheck(String),
}

impl ClientEvent {
    pub fn encode(&self) -> SessionResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn name(&self) -> &'static str {
        match self {
            ClientEvent::StartCheck(_) => "start-check",
            ClientEvent::CancelCheck(_) => "cancel-check",
        }
    }
}

/// Outbound half of the stream channel
pub trait StreamSink: Send {
    fn emit(&mut self, event: ClientEvent) -> SessionResult<()>;
}

impl StreamSink for mpsc::UnboundedSender<ClientEvent> {
    fn emit(&mut self, event: ClientEvent) -> SessionResult<()> {
        self.send(event)
            .map_err(|e| SessionError::Transport(format!("stream closed, dropped {}", e.0.name())))
    }
}

/// Collects emitted events in memory
impl StreamSink for Vec<ClientEvent> {
    fn emit(&mut self, event: ClientEvent) -> SessionResult<()> {
        self.push(event);
        Ok(())
    }
}
