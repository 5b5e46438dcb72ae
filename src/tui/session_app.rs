//! Interactive terminal view of a check session

use crate::client::{Command, SessionClient};
use crate::session::{
    CheckStatus, ExportKind, FilterMode, JobState, NotificationLevel, ProxyApi, RecordingNotifier, ResultRow,
    ServerEvent, SessionView, StreamSink,
};
use crate::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Gauge, List, ListItem, ListState, Paragraph, Wrap},
    Frame, Terminal,
};
use std::io;
use std::path::PathBuf;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::Duration;

const KEY_HELP: &str =
    "s start | c cancel | u reload file | x clear | tab filter | e export all | v/i export valid/invalid | q quit";

/// Terminal application wrapping a session client
pub struct SessionApp<A, S> {
    client: SessionClient<A, S, RecordingNotifier>,
    events: UnboundedReceiver<ServerEvent>,
    /// Proxy file, re-read on every upload
    proxy_file: PathBuf,
    target_url: String,
    list_state: ListState,
    should_quit: bool,
}

impl<A, S> SessionApp<A, S>
where
    A: ProxyApi,
    S: StreamSink,
{
    pub fn new(
        client: SessionClient<A, S, RecordingNotifier>,
        events: UnboundedReceiver<ServerEvent>,
        proxy_file: PathBuf,
        target_url: String,
    ) -> Self {
        let mut list_state = ListState::default();
        list_state.select(Some(0));

        Self {
            client,
            events,
            proxy_file,
            target_url,
            list_state,
            should_quit: false,
        }
    }

    /// Run the TUI application
    pub async fn run(&mut self) -> Result<()> {
        // Setup terminal
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let result = self.run_app(&mut terminal).await;

        // Restore terminal
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        terminal.show_cursor()?;

        result
    }

    async fn run_app<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        self.upload().await;

        loop {
            let view = self.client.controller().view();
            terminal.draw(|f| self.ui(f, &view))?;

            // Handle key events with a short timeout
            if event::poll(Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_input(key.code, view.rows.len()).await;
                        if self.should_quit {
                            break;
                        }
                    }
                }
            }

            self.client.drain(&mut self.events);
        }

        Ok(())
    }

    async fn upload(&mut self) {
        match tokio::fs::read(&self.proxy_file).await {
            Ok(bytes) => self.command(Command::Upload(bytes)).await,
            Err(e) => {
                tracing::error!(path = %self.proxy_file.display(), error = %e, "cannot read proxy file");
                let _ = self.client.controller_mut().apply_upload(Err(e.into()));
            }
        }
    }

    async fn command(&mut self, command: Command) {
        if let Err(e) = self.client.execute(command).await {
            tracing::debug!(error = %e, "command failed");
        }
    }

    async fn handle_input(&mut self, key: KeyCode, row_count: usize) {
        match key {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.should_quit = true;
            }
            KeyCode::Char('s') => {
                let target = self.target_url.clone();
                self.command(Command::Start(target)).await;
                self.list_state.select(Some(0));
            }
            KeyCode::Char('c') => self.command(Command::Cancel).await,
            KeyCode::Char('u') => self.upload().await,
            KeyCode::Char('x') => self.command(Command::Clear).await,
            KeyCode::Tab => {
                let next = self.client.controller().filter().cycle();
                self.command(Command::SetFilter(next)).await;
                self.list_state.select(Some(0));
            }
            KeyCode::Char('e') => self.command(Command::QuickExport).await,
            KeyCode::Char('v') => self.command(Command::Export(ExportKind::Valid)).await,
            KeyCode::Char('i') => self.command(Command::Export(ExportKind::Invalid)).await,
            KeyCode::Down => {
                let i = match self.list_state.selected() {
                    Some(i) if i + 1 < row_count => i + 1,
                    _ => 0,
                };
                self.list_state.select(Some(i));
            }
            KeyCode::Up => {
                let i = match self.list_state.selected() {
                    Some(0) | None => row_count.saturating_sub(1),
                    Some(i) => i - 1,
                };
                self.list_state.select(Some(i));
            }
            _ => {}
        }
    }

    fn ui(&mut self, f: &mut Frame, view: &SessionView) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(1)
            .constraints([
                Constraint::Length(3), // Title
                Constraint::Length(3), // Progress bar
                Constraint::Length(3), // Counters
                Constraint::Min(0),    // Results
                Constraint::Length(4), // Status bar
            ])
            .split(f.size());

        let title = format!(
            "Proxy Checker | {} proxies loaded | target: {}",
            view.uploaded_count,
            view.target_url.as_deref().unwrap_or(self.target_url.as_str())
        );
        let title = Paragraph::new(title)
            .style(Style::default().fg(Color::Cyan))
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL));
        f.render_widget(title, chunks[0]);

        let percent = view.progress.percent().round() as u16;
        let gauge = Gauge::default()
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!("Progress ({})", view.state)),
            )
            .gauge_style(Style::default().fg(Color::Green).bg(Color::Black))
            .percent(percent.min(100))
            .label(format!("{} ({}%)", view.progress.label(), percent));
        f.render_widget(gauge, chunks[1]);

        let counters = Paragraph::new(format!(
            "Valid: {}   Invalid: {}   Total: {}   Filter: {}",
            view.aggregate.valid_count, view.aggregate.invalid_count, view.aggregate.total, view.filter
        ))
        .block(Block::default().borders(Borders::ALL).title("Counters"));
        f.render_widget(counters, chunks[2]);

        Self::render_results(f, chunks[3], view, &mut self.list_state);

        let (status, color) = self.status_line(view);
        let status = Paragraph::new(format!("{}\n{}", status, KEY_HELP))
            .style(Style::default().fg(color))
            .wrap(Wrap { trim: true })
            .block(Block::default().borders(Borders::ALL).title("Status"));
        f.render_widget(status, chunks[4]);
    }

    fn status_line(&self, view: &SessionView) -> (String, Color) {
        let notifier = self.client.controller().notifier();
        match notifier.latest() {
            Some(notification) => {
                let color = match notification.level {
                    NotificationLevel::Success => Color::Green,
                    NotificationLevel::Error => Color::Red,
                    NotificationLevel::Warning => Color::Yellow,
                    NotificationLevel::Info => Color::Blue,
                };
                let line = format!("[{}] {}", notification.at.format("%H:%M:%S"), notification.message);
                (line, color)
            }
            None if view.state == JobState::Idle => ("Loading proxy file...".to_string(), Color::Yellow),
            None => (String::new(), Color::White),
        }
    }

    fn render_results(f: &mut Frame, area: Rect, view: &SessionView, list_state: &mut ListState) {
        let items: Vec<ListItem> = view.rows.iter().map(Self::row_item).collect();

        let title = match view.filter {
            FilterMode::All => format!("Results ({})", view.rows.len()),
            mode => format!("Results: {} ({})", mode, view.rows.len()),
        };

        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(title)
                    .border_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
            )
            .highlight_style(Style::default().bg(Color::DarkGray))
            .highlight_symbol(">> ");

        f.render_stateful_widget(list, area, list_state);
    }

    fn row_item(row: &ResultRow) -> ListItem<'static> {
        let color = if row.status == CheckStatus::Valid {
            Color::Green
        } else {
            Color::Red
        };

        let content = format!(
            "{:<10} {:<24} {:<7} {} {:<16} {:<14} {:>7} {:>4}",
            row.status_label,
            row.proxy,
            row.proxy_type,
            row.flag,
            row.country_name,
            row.city,
            row.response_time,
            row.status_code
        );
        ListItem::new(content).style(Style::default().fg(color))
    }
}
