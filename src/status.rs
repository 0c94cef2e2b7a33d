use std::time::Duration;
use tokio::time::Instant;

pub const READY_LABEL: &str = "Siap";
pub const PROCESSING_LABEL: &str = "Memproses...";
pub const ERROR_LABEL: &str = "Error";
pub const CONNECTION_ERROR_LABEL: &str = "Kesalahan Koneksi";

pub const DEFAULT_ERROR_REVERT: Duration = Duration::from_millis(3000);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusCategory {
    Ready,
    Processing,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusState {
    pub label: String,
    pub category: StatusCategory,
}

impl StatusState {
    fn ready() -> Self {
        Self { label: READY_LABEL.to_string(), category: StatusCategory::Ready }
    }
}

/// Process-wide status label with a single pending auto-revert.
///
/// The revert is a deadline rather than a spawned timer: the controller loop
/// sleeps until [`StatusController::revert_deadline`] and then calls
/// [`StatusController::revert_if_due`]. Any update replaces the deadline, so
/// timers never stack.
#[derive(Debug)]
pub struct StatusController {
    state: StatusState,
    revert_at: Option<Instant>,
    revert_after: Duration,
}

impl StatusController {
    pub fn new(revert_after: Duration) -> Self {
        Self {
            state: StatusState::ready(),
            revert_at: None,
            revert_after,
        }
    }

    pub fn state(&self) -> &StatusState {
        &self.state
    }

    pub fn set(&mut self, label: impl Into<String>, category: StatusCategory) -> &StatusState {
        self.revert_at = None;
        self.state = StatusState { label: label.into(), category };
        &self.state
    }

    pub fn set_ready(&mut self) -> &StatusState {
        self.revert_at = None;
        self.state = StatusState::ready();
        &self.state
    }

    /// Switches to the error category and (re)starts the revert countdown.
    pub fn set_error(&mut self, label: impl Into<String>) -> &StatusState {
        self.state = StatusState { label: label.into(), category: StatusCategory::Error };
        self.revert_at = Some(Instant::now() + self.revert_after);
        &self.state
    }

    pub fn revert_deadline(&self) -> Option<Instant> {
        self.revert_at
    }

    /// Applies the pending revert if its deadline has passed.
    pub fn revert_if_due(&mut self, now: Instant) -> Option<&StatusState> {
        let due = matches!(self.revert_at, Some(deadline) if deadline <= now);
        if due { Some(self.set_ready()) } else { None }
    }
}

impl Default for StatusController {
    fn default() -> Self {
        Self::new(DEFAULT_ERROR_REVERT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_ready() {
        let status = StatusController::default();
        assert_eq!(status.state().label, READY_LABEL);
        assert_eq!(status.state().category, StatusCategory::Ready);
        assert!(status.revert_deadline().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn error_reverts_after_delay() {
        let mut status = StatusController::default();
        status.set_error("X");
        assert_eq!(status.state().category, StatusCategory::Error);

        tokio::time::advance(Duration::from_millis(2999)).await;
        assert!(status.revert_if_due(Instant::now()).is_none());
        assert_eq!(status.state().label, "X");

        tokio::time::advance(Duration::from_millis(1)).await;
        let reverted = status.revert_if_due(Instant::now()).cloned();
        assert_eq!(reverted, Some(StatusState::ready()));
        assert!(status.revert_deadline().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn second_error_restarts_window() {
        let mut status = StatusController::default();
        status.set_error("first");
        tokio::time::advance(Duration::from_millis(2000)).await;
        status.set_error("second");

        tokio::time::advance(Duration::from_millis(1500)).await;
        assert!(status.revert_if_due(Instant::now()).is_none());
        assert_eq!(status.state().label, "second");

        tokio::time::advance(Duration::from_millis(1500)).await;
        assert!(status.revert_if_due(Instant::now()).is_some());
        assert_eq!(status.state().category, StatusCategory::Ready);
    }

    #[tokio::test(start_paused = true)]
    async fn plain_update_cancels_pending_revert() {
        let mut status = StatusController::default();
        status.set_error("X");
        status.set(PROCESSING_LABEL, StatusCategory::Processing);
        assert!(status.revert_deadline().is_none());

        tokio::time::advance(Duration::from_millis(5000)).await;
        assert!(status.revert_if_due(Instant::now()).is_none());
        assert_eq!(status.state().label, PROCESSING_LABEL);
    }
}
