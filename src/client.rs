//! Event loop glue between user commands, the stream channel and the
//! session controller

use crate::error::{SessionError, SessionResult};
use crate::session::{
    ExportKind, ExportService, FilterMode, JobState, Notifier, ProxyApi, ServerEvent,
    SessionController, StreamSink,
};
use tokio::sync::mpsc::UnboundedReceiver;

/// User actions, one per control of the interface
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Upload(Vec<u8>),
    Start(String),
    Cancel,
    Clear,
    SetFilter(FilterMode),
    Export(ExportKind),
    QuickExport,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Upload(_) => "upload",
            Command::Start(_) => "start",
            Command::Cancel => "cancel",
            Command::Clear => "clear",
            Command::SetFilter(_) => "set-filter",
            Command::Export(_) => "export",
            Command::QuickExport => "quick-export",
        }
    }
}

/// Owns the controller together with the collaborators it needs for
/// commands. Callers feed it one command or event at a time.
pub struct SessionClient<A, S, N> {
    controller: SessionController<S, N>,
    api: A,
    exporter: ExportService,
}

impl<A, S, N> SessionClient<A, S, N>
where
    A: ProxyApi,
    S: StreamSink,
    N: Notifier,
{
    pub fn new(api: A, sink: S, notifier: N, exporter: ExportService) -> Self {
        Self {
            controller: SessionController::new(sink, notifier),
            api,
            exporter,
        }
    }

    pub fn controller(&self) -> &SessionController<S, N> {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut SessionController<S, N> {
        &mut self.controller
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub async fn execute(&mut self, command: Command) -> SessionResult<()> {
        tracing::debug!(command = command.name(), "executing");
        match command {
            Command::Upload(bytes) => self.controller.upload(&self.api, &bytes).await.map(|_| ()),
            Command::Start(target_url) => self.controller.start(&target_url).map(|_| ()),
            Command::Cancel => self.controller.cancel(),
            Command::Clear => self.controller.clear(),
            Command::SetFilter(mode) => {
                self.controller.set_filter(mode);
                Ok(())
            }
            Command::Export(kind) => self
                .controller
                .export(&self.api, &self.exporter, kind)
                .await
                .map(|_| ()),
            Command::QuickExport => self
                .controller
                .quick_export(&self.api, &self.exporter)
                .await
                .map(|_| ()),
        }
    }

    /// Apply a stream event. Stale events are dropped quietly.
    pub fn apply(&mut self, event: ServerEvent) {
        if let Err(e) = self.controller.dispatch(event) {
            if !e.is_silent() {
                tracing::warn!(error = %e, "stream event rejected");
            }
        }
    }

    /// Apply every event already waiting in `events` without blocking
    pub fn drain(&mut self, events: &mut UnboundedReceiver<ServerEvent>) -> usize {
        let mut applied = 0;
        while let Ok(event) = events.try_recv() {
            self.apply(event);
            applied += 1;
        }
        applied
    }

    /// Apply events until the session completes. Ctrl-C cancels the running
    /// session and returns without waiting for the server.
    pub async fn run_until_finished(
        &mut self,
        events: &mut UnboundedReceiver<ServerEvent>,
    ) -> SessionResult<JobState> {
        loop {
            match self.controller.state() {
                JobState::Completed | JobState::Cancelled => return Ok(self.controller.state()),
                JobState::Running => {}
                state => {
                    return Err(SessionError::Validation(format!(
                        "no check is running (state: {})",
                        state
                    )))
                }
            }

            tokio::select! {
                event = events.recv() => match event {
                    Some(event) => self.apply(event),
                    None => return Err(SessionError::Transport("stream closed".to_string())),
                },
                _ = tokio::signal::ctrl_c() => {
                    self.controller.cancel()?;
                    return Ok(self.controller.state());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::testing::FakeApi;
    use crate::session::{
        CheckResult, ClientEvent, CompleteEvent, ProgressEvent, RecordingNotifier,
    };
    use tokio::sync::mpsc;

    type TestClient = SessionClient<FakeApi, Vec<ClientEvent>, RecordingNotifier>;

    fn client() -> TestClient {
        SessionClient::new(
            FakeApi::accepting(&["1.2.3.4:8080", "5.6.7.8:3128"]),
            Vec::new(),
            RecordingNotifier::new(),
            ExportService::new(std::env::temp_dir()),
        )
    }

    fn progress(completed: u64, result: CheckResult) -> ServerEvent {
        ServerEvent::Progress(ProgressEvent {
            completed,
            total: 2,
            result,
            check_id: None,
        })
    }

    #[tokio::test]
    async fn test_upload_then_start() {
        let mut client = client();
        client.execute(Command::Upload(b"1.2.3.4:8080\n5.6.7.8:3128".to_vec())).await.unwrap();
        client.execute(Command::Start("http://example.com".to_string())).await.unwrap();

        let ctl = client.controller();
        assert_eq!(ctl.state(), JobState::Running);
        assert!(ctl.store().is_empty());
        match ctl.sink().as_slice() {
            [ClientEvent::StartCheck(start)] => {
                assert_eq!(start.proxies, vec!["1.2.3.4:8080", "5.6.7.8:3128"]);
                assert_eq!(start.target_url, "http://example.com");
            }
            other => panic!("unexpected events: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_run_until_finished() {
        let mut client = client();
        client.execute(Command::Upload(b"x".to_vec())).await.unwrap();
        client.execute(Command::Start("http://example.com".to_string())).await.unwrap();

        let (tx, mut rx) = mpsc::unbounded_channel();
        tx.send(progress(1, CheckResult::valid("1.2.3.4:8080", 10))).unwrap();
        tx.send(progress(2, CheckResult::invalid("5.6.7.8:3128"))).unwrap();
        tx.send(ServerEvent::Complete(CompleteEvent {
            valid: 1,
            invalid: 1,
            check_id: None,
        }))
        .unwrap();

        let state = client.run_until_finished(&mut rx).await.unwrap();
        assert_eq!(state, JobState::Completed);
        assert_eq!(client.controller().aggregate().total, 2);
    }

    #[tokio::test]
    async fn test_run_until_finished_stream_closed() {
        let mut client = client();
        client.execute(Command::Upload(b"x".to_vec())).await.unwrap();
        client.execute(Command::Start("http://example.com".to_string())).await.unwrap();

        let (tx, mut rx) = mpsc::unbounded_channel();
        tx.send(progress(1, CheckResult::valid("1.2.3.4:8080", 10))).unwrap();
        drop(tx);

        let err = client.run_until_finished(&mut rx).await.unwrap_err();
        assert!(matches!(err, SessionError::Transport(_)));
        assert_eq!(client.controller().aggregate().total, 1);
    }

    #[tokio::test]
    async fn test_run_until_finished_requires_running() {
        let mut client = client();
        let (_tx, mut rx) = mpsc::unbounded_channel();
        assert!(client.run_until_finished(&mut rx).await.is_err());
    }

    #[tokio::test]
    async fn test_drain_applies_waiting_events() {
        let mut client = client();
        client.execute(Command::Upload(b"x".to_vec())).await.unwrap();
        client.execute(Command::Start("http://example.com".to_string())).await.unwrap();
        client.execute(Command::SetFilter(FilterMode::Invalid)).await.unwrap();

        let (tx, mut rx) = mpsc::unbounded_channel();
        tx.send(progress(1, CheckResult::valid("1.2.3.4:8080", 10))).unwrap();
        tx.send(progress(2, CheckResult::invalid("5.6.7.8:3128"))).unwrap();

        assert_eq!(client.drain(&mut rx), 2);
        assert_eq!(client.drain(&mut rx), 0);
        assert_eq!(client.controller().view().rows.len(), 1);
    }

    #[tokio::test]
    async fn test_cancel_then_export() {
        let mut client = client();
        client.execute(Command::Upload(b"x".to_vec())).await.unwrap();
        client.execute(Command::Start("http://example.com".to_string())).await.unwrap();
        client.apply(progress(1, CheckResult::valid("1.2.3.4:8080", 10)));
        client.execute(Command::Cancel).await.unwrap();

        // Results received before the cancel remain exportable.
        client.execute(Command::Export(ExportKind::Valid)).await.unwrap();
        let exports = client.api().exports();
        assert_eq!(exports.len(), 1);
        assert_eq!(exports[0].0, ExportKind::Valid);

        let _ = std::fs::remove_file(std::env::temp_dir().join("valid-proxies.txt"));
    }
}
