use crossbeam::channel::{unbounded, Receiver, Sender};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// One user-facing message, the moral equivalent of the booth's modal
/// dialogs.
#[derive(Debug, Clone)]
pub struct Notice {
    pub title: String,
    pub message: String,
    pub severity: Severity,
}

/// Capability for user-facing messaging. The session controller never talks
/// to widgets directly; it pushes notices through this seam so tests can
/// observe them and the UI can render them as toasts.
pub trait Notifier: Send {
    fn notify(&mut self, title: &str, message: &str, severity: Severity);
}

/// Notifier that only logs; used headless and as a fallback.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&mut self, title: &str, message: &str, severity: Severity) {
        match severity {
            Severity::Info => log::info!("{}: {}", title, message),
            Severity::Warning => log::warn!("{}: {}", title, message),
            Severity::Error => log::error!("{}: {}", title, message),
        }
    }
}

/// Notifier feeding a channel drained by the UI (or by tests).
pub struct ChannelNotifier {
    sender: Sender<Notice>,
}

impl ChannelNotifier {
    pub fn new() -> (Self, Receiver<Notice>) {
        let (sender, receiver) = unbounded();
        (Self { sender }, receiver)
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&mut self, title: &str, message: &str, severity: Severity) {
        let notice = Notice {
            title: title.to_string(),
            message: message.to_string(),
            severity,
        };

        match severity {
            Severity::Info => log::info!("{}: {}", title, message),
            Severity::Warning => log::warn!("{}: {}", title, message),
            Severity::Error => log::error!("{}: {}", title, message),
        }

        // Receiver gone means the UI is shutting down; nothing to do
        let _ = self.sender.send(notice);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_notifier_delivers() {
        let (mut notifier, receiver) = ChannelNotifier::new();
        notifier.notify("Session Complete", "Photo session completed.", Severity::Info);

        let notice = receiver.try_recv().unwrap();
        assert_eq!(notice.title, "Session Complete");
        assert_eq!(notice.severity, Severity::Info);
        assert!(receiver.try_recv().is_err());
    }

    #[test]
    fn test_channel_notifier_survives_dropped_receiver() {
        let (mut notifier, receiver) = ChannelNotifier::new();
        drop(receiver);
        notifier.notify("Error", "Camera not detected.", Severity::Error);
    }
}
