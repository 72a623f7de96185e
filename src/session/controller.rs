//! Session status poller
//!
//! Polls the service on a fixed interval, replaces the stored `SessionState`
//! wholesale on success, and notifies observers on every poll (changed or not).
//! A failed poll yields `Status::Unknown` and the loop carries on at the same
//! interval; there is no backoff.

use super::SessionState;
use crate::api::RemoteApi;
use crate::error::ApiError;
use crate::poll_loop::{self, Liveness, PollLoop};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Callback run synchronously inside each poll
pub type Observer = Box<dyn Fn(&SessionState) + Send + Sync>;

struct Shared<A> {
    api: Arc<A>,
    state: Mutex<Option<SessionState>>,
    observers: Mutex<Vec<Observer>>,
    /// Serializes interval ticks with on-demand polls
    poll_lock: tokio::sync::Mutex<()>,
}

impl<A: RemoteApi> Shared<A> {
    /// One poll. `liveness` is `None` for on-demand polls, which always apply.
    async fn poll(&self, liveness: Option<&Liveness>) -> Option<SessionState> {
        let _guard = self.poll_lock.lock().await;

        let result = self.api.status().await;

        if liveness.is_some_and(|l| !l.is_live()) {
            tracing::trace!("Discarding status poll from a stopped loop");
            return None;
        }

        let next = {
            let mut state = self.state.lock().expect("session state lock poisoned");
            let next = match result {
                Ok(response) => SessionState::from_response(&response),
                Err(e) => {
                    tracing::warn!("Status poll failed: {}", e);
                    SessionState::unknown_from(&state.clone().unwrap_or_default())
                }
            };
            *state = Some(next.clone());
            next
        };

        // Observers finish (dependent pollers decided) before this tick returns
        let observers = self.observers.lock().expect("observer lock poisoned");
        for observer in observers.iter() {
            observer(&next);
        }

        Some(next)
    }
}

/// Owns the status poll loop and the latest `SessionState`
pub struct SessionController<A> {
    shared: Arc<Shared<A>>,
    interval: Duration,
    poll_loop: Mutex<PollLoop>,
}

impl<A: RemoteApi> SessionController<A> {
    pub fn new(api: Arc<A>, interval: Duration) -> Self {
        Self {
            shared: Arc::new(Shared {
                api,
                state: Mutex::new(None),
                observers: Mutex::new(Vec::new()),
                poll_lock: tokio::sync::Mutex::new(()),
            }),
            interval,
            poll_loop: Mutex::new(PollLoop::new("session")),
        }
    }

    /// Register a callback invoked once per poll with the new state
    pub fn on_change(&self, observer: impl Fn(&SessionState) + Send + Sync + 'static) {
        self.shared
            .observers
            .lock()
            .expect("observer lock poisoned")
            .push(Box::new(observer));
    }

    /// Latest state, `None` before the first poll completes
    pub fn state(&self) -> Option<SessionState> {
        self.shared
            .state
            .lock()
            .expect("session state lock poisoned")
            .clone()
    }

    /// Issue one status request now and notify observers
    pub async fn poll(&self) -> SessionState {
        // On-demand polls carry no liveness token, so they always apply
        self.shared.poll(None).await.unwrap_or_default()
    }

    /// Poll immediately, then every interval. No-op if already running.
    pub fn start(&self) {
        let shared = self.shared.clone();
        let interval = self.interval;
        let started = self
            .poll_loop
            .lock()
            .expect("poll loop lock poisoned")
            .start(move |liveness| {
                poll_loop::every(interval, liveness, move |live| {
                    let shared = shared.clone();
                    async move {
                        shared.poll(Some(&live)).await;
                    }
                })
            });
        if started {
            tracing::info!("Status polling every {:?}", interval);
        }
    }

    /// Stop polling. Idempotent.
    pub fn stop(&self) {
        if self
            .poll_loop
            .lock()
            .expect("poll loop lock poisoned")
            .stop()
        {
            tracing::info!("Status polling stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.poll_loop
            .lock()
            .expect("poll loop lock poisoned")
            .is_running()
    }

    /// Start logging with the default trigger, then refresh
    pub async fn start_default(&self) -> Result<SessionState, ApiError> {
        let response = self.shared.api.start_default().await?;
        tracing::info!("Logger start requested: {}", response.status);
        Ok(self.poll().await)
    }

    /// Stop logging and clear schedules, then refresh
    pub async fn stop_and_clear(&self) -> Result<SessionState, ApiError> {
        let response = self.shared.api.stop_and_clear().await?;
        tracing::info!("Logger stop requested: {}", response.status);
        Ok(self.poll().await)
    }

    pub fn api(&self) -> &Arc<A> {
        &self.shared.api
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::FakeApi;
    use crate::api::StatusResponse;
    use crate::session::{Mode, Status};

    fn status(mode: &str, status: &str, last: Option<&str>) -> Result<StatusResponse, ApiError> {
        Ok(StatusResponse {
            mode: Some(mode.to_string()),
            status: Some(status.to_string()),
            last_updated: last.map(str::to_string),
            ..Default::default()
        })
    }

    fn recorder(controller: &SessionController<FakeApi>) -> Arc<Mutex<Vec<SessionState>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        controller.on_change(move |s| sink.lock().unwrap().push(s.clone()));
        seen
    }

    #[tokio::test]
    async fn test_poll_replaces_state_and_notifies() {
        let api = Arc::new(FakeApi::new());
        api.push_status(status("default", "logging", Some("2024-01-15T14:30:00")));
        let controller = SessionController::new(api, Duration::from_secs(5));
        let seen = recorder(&controller);

        let state = controller.poll().await;
        assert_eq!(state.status, Status::Logging);
        assert_eq!(controller.state(), Some(state.clone()));
        assert_eq!(seen.lock().unwrap().as_slice(), &[state]);
    }

    #[tokio::test]
    async fn test_unchanged_state_still_notifies() {
        let api = Arc::new(FakeApi::new());
        api.push_status(status("none", "idle", None));
        let controller = SessionController::new(api, Duration::from_secs(5));
        let seen = recorder(&controller);

        controller.poll().await;
        controller.poll().await;
        assert_eq!(seen.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_failure_becomes_unknown_and_keeps_mode() {
        let api = Arc::new(FakeApi::new());
        api.push_status(status("recurring", "logging", Some("2024-01-15T14:30:00")));
        api.push_status(Err(ApiError::Transient("connection refused".to_string())));
        let controller = SessionController::new(api, Duration::from_secs(5));
        let seen = recorder(&controller);

        let first = controller.poll().await;
        let second = controller.poll().await;

        assert_eq!(second.status, Status::Unknown);
        assert_eq!(second.mode, Mode::Recurring);
        assert_eq!(second.last_updated, first.last_updated);
        assert_eq!(seen.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_last_updated_tracks_logging_across_polls() {
        let api = Arc::new(FakeApi::new());
        api.push_status(status("default", "logging", Some("2024-01-15T14:30:00")));
        api.push_status(status("once", "scheduled", Some("2024-01-15T14:30:00")));
        api.push_status(status("default", "logging", Some("2024-01-15T15:00:00")));
        api.push_status(status("none", "idle", Some("2024-01-15T15:00:00")));
        let controller = SessionController::new(api, Duration::from_secs(5));

        for _ in 0..4 {
            let state = controller.poll().await;
            assert_eq!(
                state.last_updated.is_some(),
                state.status == Status::Logging,
                "{:?}",
                state
            );
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_loop_polls_on_interval_and_survives_failures() {
        let api = Arc::new(FakeApi::new());
        api.push_status(Err(ApiError::Transient("down".to_string())));
        api.push_status(Err(ApiError::Transient("down".to_string())));
        api.push_status(status("none", "idle", None));
        let controller = SessionController::new(api.clone(), Duration::from_secs(5));
        let seen = recorder(&controller);

        controller.start();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(api.count("status"), 1);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(api.count("status"), 3);
        assert_eq!(
            seen.lock().unwrap().last().map(|s| s.status),
            Some(Status::Idle)
        );

        controller.stop();
        controller.stop();
        assert!(!controller.is_running());
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(api.count("status"), 3);
    }

    #[tokio::test]
    async fn test_start_default_refreshes_immediately() {
        let api = Arc::new(FakeApi::new());
        api.push_status(status("default", "logging", Some("2024-01-15T14:30:00")));
        let controller = SessionController::new(api.clone(), Duration::from_secs(5));

        let state = controller.start_default().await.unwrap();
        assert_eq!(state.status, Status::Logging);
        assert_eq!(api.calls(), vec!["start_default", "status"]);
    }
}
