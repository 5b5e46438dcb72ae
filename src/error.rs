use thiserror::Error;

pub type SessionResult<T> = std::result::Result<T, SessionError>;

/// Failures of session operations. None of them leave the controller in an
/// unusable state; callers report them and carry on.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("{0}")]
    Validation(String),
    #[error("upload failed: {0}")]
    Upload(String),
    #[error("No results to export")]
    EmptyResult,
    #[error("event for session {event_id:?} does not match active session {active_id:?}")]
    StaleEvent {
        event_id: Option<String>,
        active_id: Option<String>,
    },
    #[error("export failed: {0}")]
    Export(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SessionError {
    /// Stale events are dropped silently instead of being shown to the user
    pub fn is_silent(&self) -> bool {
        matches!(self, SessionError::StaleEvent { .. })
    }
}
