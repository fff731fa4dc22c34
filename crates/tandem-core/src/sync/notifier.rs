//! Notification channel for conflict and error reporting

use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use tokio::sync::mpsc;

use crate::config::BackoffSettings;
use crate::error::Error;
use crate::models::Notice;
use crate::util::{compact_text, normalize_text_option};

pub const GENERIC_ERROR_MESSAGE: &str = "Something went wrong. Please try again.";
pub const CONTENT_TOO_LONG_MESSAGE: &str = "This note is too long to save.";
pub const NOTE_LOCKED_MESSAGE: &str = "Unlock the note first before deleting it.";

/// Receiving end of the notification channel
pub type NoticeReceiver = mpsc::UnboundedReceiver<Notice>;

/// Sends notices to the UI layer.
///
/// Quiet errors are only logged. Transient remote errors are paced by a
/// `NoticeBackoff` so a flapping connection does not flood the user.
#[derive(Clone)]
pub struct Notifier {
    sender: mpsc::UnboundedSender<Notice>,
    backoff: Arc<Mutex<NoticeBackoff>>,
}

impl Notifier {
    pub fn new(settings: BackoffSettings) -> (Self, NoticeReceiver) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let notifier = Self {
            sender,
            backoff: Arc::new(Mutex::new(NoticeBackoff::new(settings))),
        };
        (notifier, receiver)
    }

    pub fn notify(&self, notice: Notice) {
        tracing::debug!(severity = %notice.severity, "Notice: {}", notice.text);
        if self.sender.send(notice).is_err() {
            tracing::debug!("Notice dropped; no receiver");
        }
    }

    /// Surface an error according to its class.
    pub fn report(&self, error: &Error) {
        if error.is_quiet() {
            tracing::debug!("Quiet error: {error}");
            return;
        }

        if error.is_transient() {
            let show = self
                .backoff
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .should_notify(Instant::now());
            if !show {
                tracing::debug!("Transient error notice suppressed: {error}");
                return;
            }
            tracing::warn!("Transient remote error: {error}");
            self.notify(Notice::warning(user_message(error)));
            return;
        }

        tracing::warn!("Surfacing error: {error}");
        self.notify(Notice::error(user_message(error)));
    }
}

/// Best-effort user-facing text for an error.
///
/// Prefers an attached user message, then an upstream message, then the
/// error's own message, then a generic fallback.
pub fn user_message(error: &Error) -> String {
    let message = match error {
        Error::ContentTooLong { .. } => Some(CONTENT_TOO_LONG_MESSAGE.to_string()),
        Error::NoteLocked(_) => Some(NOTE_LOCKED_MESSAGE.to_string()),
        Error::Remote(remote) => normalize_text_option(remote.user_message.clone())
            .or_else(|| normalize_text_option(remote.upstream_message.clone()))
            .or_else(|| normalize_text_option(Some(remote.message.clone()))),
        other => normalize_text_option(Some(other.to_string())),
    };
    message.map_or_else(
        || GENERIC_ERROR_MESSAGE.to_string(),
        |message| compact_text(&message),
    )
}

/// Exponential pacing of repeated notices.
///
/// The first notice is shown at once. Each later one needs the current gap to
/// have elapsed since the last shown notice, and doubles the gap up to the
/// maximum. A quiet period without any error resets the gap.
#[derive(Debug)]
pub struct NoticeBackoff {
    settings: BackoffSettings,
    gap: Duration,
    last_shown: Option<Instant>,
    last_error: Option<Instant>,
}

impl NoticeBackoff {
    pub fn new(settings: BackoffSettings) -> Self {
        Self {
            gap: settings.initial(),
            settings,
            last_shown: None,
            last_error: None,
        }
    }

    /// Record an error at `now`; returns whether it should be shown.
    pub fn should_notify(&mut self, now: Instant) -> bool {
        if let Some(last_error) = self.last_error {
            if now.saturating_duration_since(last_error) >= self.settings.quiet_period() {
                self.gap = self.settings.initial();
                self.last_shown = None;
            }
        }
        self.last_error = Some(now);

        match self.last_shown {
            Some(shown) if now.saturating_duration_since(shown) < self.gap => false,
            Some(_) => {
                self.last_shown = Some(now);
                self.gap = (self.gap * 2).min(self.settings.max());
                true
            }
            None => {
                self.last_shown = Some(now);
                true
            }
        }
    }

    pub const fn current_gap(&self) -> Duration {
        self.gap
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RemoteError;
    use crate::models::{NoteId, Severity};

    fn settings() -> BackoffSettings {
        BackoffSettings {
            initial_ms: 100,
            max_ms: 300,
            quiet_period_ms: 1_000,
        }
    }

    #[test]
    fn backoff_doubles_up_to_max() {
        let start = Instant::now();
        let at = |ms: u64| start + Duration::from_millis(ms);
        let mut backoff = NoticeBackoff::new(settings());

        assert!(backoff.should_notify(at(0)));
        assert!(!backoff.should_notify(at(50)));
        assert!(backoff.should_notify(at(100)));
        assert_eq!(backoff.current_gap(), Duration::from_millis(200));
        assert!(!backoff.should_notify(at(250)));
        assert!(backoff.should_notify(at(300)));
        assert_eq!(backoff.current_gap(), Duration::from_millis(300));
        assert!(backoff.should_notify(at(600)));
        assert_eq!(backoff.current_gap(), Duration::from_millis(300));
    }

    #[test]
    fn backoff_resets_after_quiet_period() {
        let start = Instant::now();
        let at = |ms: u64| start + Duration::from_millis(ms);
        let mut backoff = NoticeBackoff::new(settings());

        assert!(backoff.should_notify(at(0)));
        assert!(backoff.should_notify(at(100)));
        assert_eq!(backoff.current_gap(), Duration::from_millis(200));

        assert!(backoff.should_notify(at(1_200)));
        assert_eq!(backoff.current_gap(), Duration::from_millis(100));
        assert!(!backoff.should_notify(at(1_250)));
    }

    #[test]
    fn message_extraction_prefers_user_message() {
        let error = Error::from(
            RemoteError::new("HTTP 500")
                .with_upstream_message("quota exceeded")
                .with_user_message("Your sync quota is used up."),
        );
        assert_eq!(user_message(&error), "Your sync quota is used up.");

        let error = Error::from(RemoteError::new("HTTP 500").with_upstream_message("quota exceeded"));
        assert_eq!(user_message(&error), "quota exceeded");

        let error = Error::from(RemoteError::new("HTTP 500").with_user_message("  "));
        assert_eq!(user_message(&error), "HTTP 500");

        let error = Error::from(RemoteError::new(""));
        assert_eq!(user_message(&error), GENERIC_ERROR_MESSAGE);
    }

    #[test]
    fn specific_messages_for_length_and_lock() {
        let too_long = Error::ContentTooLong {
            kind: "plain".into(),
            len: 10,
            max: 5,
        };
        assert_eq!(user_message(&too_long), CONTENT_TOO_LONG_MESSAGE);
        assert_eq!(
            user_message(&Error::NoteLocked(NoteId::new())),
            NOTE_LOCKED_MESSAGE
        );
    }

    #[test]
    fn quiet_errors_are_not_sent() {
        let (notifier, mut receiver) = Notifier::new(settings());
        notifier.report(&Error::Quiet("nothing to merge".into()));
        notifier.report(&Error::Database("disk full".into()));

        let notice = receiver.try_recv().unwrap();
        assert_eq!(notice.severity, Severity::Error);
        assert_eq!(notice.text, "Database error: disk full");
        assert!(receiver.try_recv().is_err());
    }

    #[test]
    fn repeated_transient_errors_are_paced() {
        let (notifier, mut receiver) = Notifier::new(settings());
        let error = Error::from(RemoteError::transient("connection reset"));
        notifier.report(&error);
        notifier.report(&error);

        let notice = receiver.try_recv().unwrap();
        assert_eq!(notice.severity, Severity::Warning);
        assert!(receiver.try_recv().is_err());
    }
}
