//! Best-effort user notifications

use chrono::{DateTime, Local};
use std::collections::VecDeque;
use std::fmt;

/// Maximum number of notifications kept by [`RecordingNotifier`]
const MAX_HISTORY: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Error,
    Warning,
    Info,
}

impl fmt::Display for NotificationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotificationLevel::Success => write!(f, "success"),
            NotificationLevel::Error => write!(f, "error"),
            NotificationLevel::Warning => write!(f, "warning"),
            NotificationLevel::Info => write!(f, "info"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
    pub at: DateTime<Local>,
}

impl Notification {
    pub fn new(level: NotificationLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            at: Local::now(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Success, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Error, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Warning, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Info, message)
    }
}

/// Side channel for user feedback. Implementations must not fail.
pub trait Notifier: Send {
    fn notify(&mut self, notification: Notification);
}

fn log_notification(notification: &Notification) {
    match notification.level {
        NotificationLevel::Error => tracing::error!("{}", notification.message),
        NotificationLevel::Warning => tracing::warn!("{}", notification.message),
        NotificationLevel::Success | NotificationLevel::Info => {
            tracing::info!(level = %notification.level, "{}", notification.message)
        }
    }
}

/// Writes notifications to the tracing log only
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&mut self, notification: Notification) {
        log_notification(&notification);
    }
}

/// Logs notifications and keeps the most recent ones for display
#[derive(Debug, Default, Clone)]
pub struct RecordingNotifier {
    history: VecDeque<Notification>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn latest(&self) -> Option<&Notification> {
        self.history.back()
    }

    #[cfg(test)]
    pub fn messages(&self) -> Vec<&str> {
        self.history.iter().map(|n| n.message.as_str()).collect()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.history.len()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&mut self, notification: Notification) {
        log_notification(&notification);
        self.history.push_back(notification);
        if self.history.len() > MAX_HISTORY {
            self.history.pop_front();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_notifier_latest() {
        let mut notifier = RecordingNotifier::new();
        assert!(notifier.latest().is_none());

        notifier.notify(Notification::info("first"));
        notifier.notify(Notification::error("second"));

        let latest = notifier.latest().unwrap();
        assert_eq!(latest.level, NotificationLevel::Error);
        assert_eq!(latest.message, "second");
        assert_eq!(notifier.messages(), vec!["first", "second"]);
    }

    #[test]
    fn test_recording_notifier_is_bounded() {
        let mut notifier = RecordingNotifier::new();
        for i in 0..(MAX_HISTORY + 5) {
            notifier.notify(Notification::info(format!("n{}", i)));
        }

        assert_eq!(notifier.len(), MAX_HISTORY);
        assert_eq!(notifier.messages()[0], "n5");
    }
}
