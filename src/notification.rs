//! User-facing event reporting boundary.
//!
//! The core never renders UI. Frontends (tray icon, desktop notifications)
//! implement [`Notifier`]; the default implementation routes everything to
//! the log so headless runs still surface outcomes.

/// How urgent an event is. Frontends typically map this to a notification
/// icon or urgency hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// Sink for capture and export lifecycle events.
pub trait Notifier: Send + Sync {
    /// Deliver one event with a short title and message.
    fn notify(&self, severity: Severity, summary: &str, body: &str);
}

/// Default notifier: writes events to the log at the matching level.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, severity: Severity, summary: &str, body: &str) {
        match severity {
            Severity::Info => log::info!("{}: {}", summary, body),
            Severity::Warning => log::warn!("{}: {}", summary, body),
            Severity::Error => log::error!("{}: {}", summary, body),
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::{Notifier, Severity};
    use std::sync::Mutex;

    /// Test notifier that records every event.
    #[derive(Default)]
    pub struct RecordingNotifier {
        pub events: Mutex<Vec<(Severity, String, String)>>,
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, severity: Severity, summary: &str, body: &str) {
            self.events
                .lock()
                .unwrap()
                .push((severity, summary.to_string(), body.to_string()));
        }
    }
}
