//! Check session module
//!
//! This module provides:
//! - The session state machine driving a server-side proxy check
//! - Result storage with derived counts and filtered projections
//! - Upload and export of proxy lists through the server's HTTP endpoints
//! - Stream channel messages and user notifications

pub mod api;
pub mod controller;
pub mod events;
pub mod export;
pub mod models;
pub mod notify;
pub mod store;
pub mod upload;

#[cfg(test)]
pub(crate) mod testing;

pub use api::{ExportedFile, ProxyApi, UploadRequest, UploadResponse};
pub use controller::{SessionController, SessionView};
pub use events::{ClientEvent, CompleteEvent, ProgressEvent, ServerEvent, StartCheck, StreamSink};
pub use export::{export_url, ExportService};
pub use models::{
    Aggregate, CheckResult, CheckStatus, Controls, ExportKind, FilterMode, JobSession, JobState,
    Progress, ProxyAddress, ResultRow,
};
pub use notify::{LogNotifier, Notification, NotificationLevel, Notifier, RecordingNotifier};
pub use store::ResultStore;
pub use upload::{UploadController, UploadedList};
