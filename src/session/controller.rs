//! Session state machine
//!
//! The controller owns everything that changes over a check session: the
//! uploaded proxy list, the active session id, the result store, the filter
//! mode and the enabled state of the user actions. Inbound stream events and
//! user actions are applied one at a time through `&mut self`.

use crate::error::{SessionError, SessionResult};
use crate::session::api::ProxyApi;
use crate::session::events::{ClientEvent, CompleteEvent, ProgressEvent, ServerEvent, StartCheck, StreamSink};
use crate::session::export::ExportService;
use crate::session::models::{
    Aggregate, Controls, ExportKind, FilterMode, JobSession, JobState, Progress, ProxyAddress,
    ResultRow,
};
use crate::session::notify::{Notification, Notifier};
use crate::session::store::ResultStore;
use crate::session::upload::{UploadController, UploadedList};
use chrono::Utc;
use std::path::PathBuf;
use uuid::Uuid;

/// Snapshot of everything a render target needs
#[derive(Debug, Clone, PartialEq)]
pub struct SessionView {
    pub state: JobState,
    pub session_id: Option<String>,
    pub target_url: Option<String>,
    pub uploaded_count: usize,
    pub progress: Progress,
    pub aggregate: Aggregate,
    pub filter: FilterMode,
    pub rows: Vec<ResultRow>,
    pub controls: Controls,
}

pub struct SessionController<S, N> {
    sink: S,
    notifier: N,
    state: JobState,
    session: Option<JobSession>,
    store: ResultStore,
    uploaded: Option<Vec<ProxyAddress>>,
    filter: FilterMode,
    controls: Controls,
}

impl<S, N> SessionController<S, N>
where
    S: StreamSink,
    N: Notifier,
{
    pub fn new(sink: S, notifier: N) -> Self {
        Self {
            sink,
            notifier,
            state: JobState::Idle,
            session: None,
            store: ResultStore::new(),
            uploaded: None,
            filter: FilterMode::All,
            controls: Controls::default(),
        }
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    pub fn session(&self) -> Option<&JobSession> {
        self.session.as_ref()
    }

    pub fn active_id(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.id.as_str())
    }

    pub fn store(&self) -> &ResultStore {
        &self.store
    }

    pub fn aggregate(&self) -> Aggregate {
        self.store.aggregate()
    }

    pub fn filter(&self) -> FilterMode {
        self.filter
    }

    pub fn controls(&self) -> Controls {
        self.controls
    }

    pub fn uploaded_proxies(&self) -> Option<&[ProxyAddress]> {
        self.uploaded.as_deref()
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn progress(&self) -> Progress {
        let (completed, total) = self
            .session
            .as_ref()
            .map_or((0, 0), |s| (s.completed, s.total));

        Progress {
            completed,
            total,
            finished: matches!(self.state, JobState::Completed | JobState::Cancelled),
        }
    }

    /// Upload a proxy file. The previous list survives any failure.
    pub async fn upload<A>(&mut self, api: &A, bytes: &[u8]) -> SessionResult<usize>
    where
        A: ProxyApi + ?Sized,
    {
        let previous = self.state;
        let busy = matches!(previous, JobState::Running | JobState::Cancelling);
        if !busy {
            self.state = JobState::Uploading;
        }

        let outcome = UploadController::submit(api, bytes).await;

        if !busy {
            self.state = previous;
        }
        self.apply_upload(outcome)
    }

    /// Record the outcome of an upload attempt
    pub fn apply_upload(&mut self, outcome: SessionResult<UploadedList>) -> SessionResult<usize> {
        match outcome {
            Ok(list) => {
                tracing::info!(count = list.count, "proxy list uploaded");
                self.notifier.notify(Notification::success(format!(
                    "Successfully loaded {} proxies",
                    list.count
                )));
                let count = list.count;
                self.uploaded = Some(list.proxies);
                if self.state != JobState::Running {
                    self.controls.start_enabled = true;
                }
                Ok(count)
            }
            Err(e) => {
                tracing::warn!(error = %e, "upload failed");
                self.notifier.notify(Notification::error("Error uploading file"));
                Err(e)
            }
        }
    }

    /// Start a new check session for the uploaded list and return its id
    pub fn start(&mut self, target_url: &str) -> SessionResult<String> {
        if self.state == JobState::Running {
            return Err(self.reject("A check is already running"));
        }

        let proxies = self.uploaded.clone().unwrap_or_default();
        if proxies.is_empty() {
            return Err(self.reject("Please upload a proxy file first"));
        }

        let target_url = target_url.trim();
        if target_url.is_empty() {
            return Err(self.reject("Please enter a target URL"));
        }

        let id = mint_session_id();
        let total = proxies.len() as u64;
        let event = ClientEvent::StartCheck(StartCheck {
            proxies,
            target_url: target_url.to_string(),
            check_id: id.clone(),
        });

        if let Err(e) = self.sink.emit(event) {
            tracing::error!(error = %e, "could not send start-check");
            self.notifier.notify(Notification::error("Could not start check"));
            return Err(e);
        }

        self.session = Some(JobSession::new(id.clone(), target_url.to_string(), total));
        self.store.reset(&id);
        self.state = JobState::Running;
        self.controls = Controls {
            start_enabled: false,
            cancel_enabled: true,
            export_visible: false,
        };

        tracing::info!(check_id = %id, total, target = %target_url, "check started");
        self.notifier.notify(Notification::info("Started checking proxies..."));
        Ok(id)
    }

    /// Apply one inbound stream event
    pub fn dispatch(&mut self, event: ServerEvent) -> SessionResult<()> {
        tracing::trace!(check_id = ?event.check_id(), state = %self.state, "stream event");
        match event {
            ServerEvent::Progress(evt) => self.on_progress(evt),
            ServerEvent::Complete(evt) => self.on_complete(evt),
        }
    }

    pub fn on_progress(&mut self, evt: ProgressEvent) -> SessionResult<()> {
        let id = self.admit(evt.check_id.as_deref(), self.state.accepts_untagged_progress())?;

        if !self.store.append(&id, evt.result) {
            return Err(self.stale(evt.check_id));
        }

        if let Some(session) = self.session.as_mut() {
            session.completed = evt.completed;
            session.total = evt.total;
        }
        tracing::trace!(completed = evt.completed, total = evt.total, "progress applied");
        Ok(())
    }

    pub fn on_complete(&mut self, evt: CompleteEvent) -> SessionResult<()> {
        self.admit(evt.check_id.as_deref(), self.state.accepts_events())?;

        self.state = match self.state {
            JobState::Cancelling => JobState::Cancelled,
            _ => JobState::Completed,
        };
        self.controls = Controls {
            start_enabled: self.uploaded.is_some(),
            cancel_enabled: false,
            export_visible: true,
        };

        tracing::info!(valid = evt.valid, invalid = evt.invalid, state = %self.state, "check finished");
        self.notifier.notify(Notification::success(format!(
            "Check completed! {} valid, {} invalid proxies found",
            evt.valid, evt.invalid
        )));
        Ok(())
    }

    /// Request cancellation without waiting for the server
    pub fn cancel(&mut self) -> SessionResult<()> {
        if self.state != JobState::Running {
            return Err(SessionError::Validation("No check is running".to_string()));
        }

        let id = self.active_id().unwrap_or_default().to_string();
        if let Err(e) = self.sink.emit(ClientEvent::CancelCheck(id.clone())) {
            tracing::warn!(error = %e, check_id = %id, "cancel-check not delivered");
        }

        self.state = JobState::Cancelling;
        self.controls.cancel_enabled = false;
        self.controls.start_enabled = true;

        tracing::info!(check_id = %id, "check cancelled");
        self.notifier.notify(Notification::warning("Check cancelled"));
        Ok(())
    }

    /// Empty the result list without touching the session
    pub fn clear(&mut self) -> SessionResult<()> {
        if self.store.is_empty() {
            self.notifier.notify(Notification::error("No results to clear"));
            return Err(SessionError::EmptyResult);
        }

        self.store.clear();
        self.controls.export_visible = false;
        self.notifier.notify(Notification::info("Results cleared"));
        Ok(())
    }

    pub fn set_filter(&mut self, mode: FilterMode) {
        self.filter = mode;
    }

    /// Export the full result list as `kind`
    pub async fn export<A>(
        &mut self,
        api: &A,
        service: &ExportService,
        kind: ExportKind,
    ) -> SessionResult<PathBuf>
    where
        A: ProxyApi + ?Sized,
    {
        if self.store.is_empty() {
            self.notifier.notify(Notification::error("No results to export"));
            return Err(SessionError::EmptyResult);
        }

        match service.export(api, self.store.results(), kind).await {
            Ok(path) => {
                tracing::info!(kind = %kind, path = %path.display(), "results exported");
                self.notifier.notify(Notification::success(format!(
                    "Exported {} proxies successfully!",
                    kind
                )));
                Ok(path)
            }
            Err(e) => {
                tracing::warn!(kind = %kind, error = %e, "export failed");
                self.notifier.notify(Notification::error("Error exporting results"));
                Err(e)
            }
        }
    }

    /// Export everything regardless of filter
    pub async fn quick_export<A>(&mut self, api: &A, service: &ExportService) -> SessionResult<PathBuf>
    where
        A: ProxyApi + ?Sized,
    {
        self.export(api, service, ExportKind::All).await
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            state: self.state,
            session_id: self.session.as_ref().map(|s| s.id.clone()),
            target_url: self.session.as_ref().map(|s| s.target_url.clone()),
            uploaded_count: self.uploaded.as_ref().map_or(0, Vec::len),
            progress: self.progress(),
            aggregate: self.store.aggregate(),
            filter: self.filter,
            rows: self.store.project(self.filter).into_iter().map(ResultRow::from).collect(),
            controls: self.controls,
        }
    }

    /// Check an event against the active session and return the session id.
    /// Tagged events are admitted on id equality while the session is
    /// running or cancelling. Untagged events fall back to `untagged_allows`.
    fn admit(&self, event_id: Option<&str>, untagged_allows: bool) -> SessionResult<String> {
        let active = match self.active_id() {
            Some(active) if self.state.accepts_events() => active,
            _ => return Err(self.stale(event_id.map(str::to_string))),
        };

        match event_id {
            Some(id) if id == active => Ok(active.to_string()),
            Some(id) => Err(self.stale(Some(id.to_string()))),
            None if untagged_allows => Ok(active.to_string()),
            None => Err(self.stale(None)),
        }
    }

    fn stale(&self, event_id: Option<String>) -> SessionError {
        let err = SessionError::StaleEvent {
            event_id,
            active_id: self.active_id().map(str::to_string),
        };
        tracing::debug!(state = %self.state, "dropping stale event: {}", err);
        err
    }

    fn reject(&mut self, message: &str) -> SessionError {
        self.notifier.notify(Notification::error(message));
        SessionError::Validation(message.to_string())
    }
}

/// `check-<unix millis>-<random>`, unique for the lifetime of the process
fn mint_session_id() -> String {
    let random = Uuid::new_v4().simple().to_string();
    format!("check-{}-{}", Utc::now().timestamp_millis(), &random[..8])
}
