//! Readings poller whose lifecycle follows the session status
//!
//! `reconcile` is the only way the loop starts or stops: it runs while the
//! session is logging and is torn down (with the display reset to the empty
//! state) as soon as it is not. `Unknown` leaves everything as it is.

use super::{Readings, ReadingsView};
use crate::api::{RemoteApi, Settings};
use crate::poll_loop::{self, Liveness, PollLoop};
use crate::session::{SessionState, Status};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Settings key holding the logger's write interval in seconds
const LOG_INTERVAL_KEY: &str = "LOG_INTERVAL";

/// How often readings are refreshed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cadence {
    /// Upper bound on the refresh period
    pub max_interval: Duration,
}

impl Cadence {
    pub fn new(max_interval: Duration) -> Self {
        Self { max_interval }
    }

    /// Logger interval clamped to the bound; bound when unavailable or zero
    pub fn interval_for(&self, settings: Option<&Settings>) -> Duration {
        let configured = settings
            .and_then(|s| s.get(LOG_INTERVAL_KEY))
            .and_then(|v| {
                v.as_f64()
                    .or_else(|| v.as_str().and_then(|s| s.trim().parse().ok()))
            })
            .filter(|secs| secs.is_finite() && *secs > 0.0)
            .map(Duration::from_secs_f64);

        match configured {
            Some(interval) => interval.min(self.max_interval),
            None => self.max_interval,
        }
    }
}

/// Outcome of one `reconcile` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconcile {
    Started,
    Stopped,
    Unchanged,
}

type ViewListener = Box<dyn Fn(&ReadingsView) + Send + Sync>;

struct Display {
    view: Mutex<ReadingsView>,
    listener: Mutex<Option<ViewListener>>,
}

impl Display {
    fn new() -> Self {
        Self {
            view: Mutex::new(ReadingsView::NoData),
            listener: Mutex::new(None),
        }
    }

    fn set(&self, next: ReadingsView) {
        self.replace(next, || true);
    }

    /// As `set`, unless the loop behind `live` has been stopped. Checked under
    /// the view lock, and `PollLoop::stop` bumps the epoch before `reconcile`
    /// takes that lock, so a stopped loop cannot overwrite the empty state.
    fn set_if_live(&self, live: &Liveness, next: ReadingsView) {
        self.replace(next, || live.is_live());
    }

    fn replace(&self, next: ReadingsView, allowed: impl FnOnce() -> bool) {
        let mut view = self.view.lock().expect("readings view lock poisoned");
        if !allowed() || *view == next {
            return;
        }
        *view = next.clone();
        // Still under the view lock: listeners see changes in order
        if let Some(listener) = self
            .listener
            .lock()
            .expect("readings listener lock poisoned")
            .as_ref()
        {
            listener(&next);
        }
    }
}

/// Starts and stops the readings loop from session state
pub struct ReadingsSupervisor<A> {
    api: Arc<A>,
    cadence: Cadence,
    poll_loop: PollLoop,
    display: Arc<Display>,
}

impl<A: RemoteApi> ReadingsSupervisor<A> {
    pub fn new(api: Arc<A>, cadence: Cadence) -> Self {
        Self {
            api,
            cadence,
            poll_loop: PollLoop::new("readings"),
            display: Arc::new(Display::new()),
        }
    }

    /// Called with every view change
    pub fn on_update(&self, listener: impl Fn(&ReadingsView) + Send + Sync + 'static) {
        *self
            .display
            .listener
            .lock()
            .expect("readings listener lock poisoned") = Some(Box::new(listener));
    }

    pub fn view(&self) -> ReadingsView {
        self.display
            .view
            .lock()
            .expect("readings view lock poisoned")
            .clone()
    }

    pub fn is_running(&self) -> bool {
        self.poll_loop.is_running()
    }

    /// Stop the loop on shutdown; the display is left as it is
    pub fn stop(&mut self) {
        self.poll_loop.stop();
    }

    /// Bring the loop in line with `state`. Idempotent.
    pub fn reconcile(&mut self, state: &SessionState) -> Reconcile {
        match state.status {
            Status::Unknown => Reconcile::Unchanged,
            Status::Logging if self.poll_loop.is_running() => Reconcile::Unchanged,
            Status::Logging => {
                let api = self.api.clone();
                let cadence = self.cadence;
                let display = self.display.clone();
                self.poll_loop
                    .start(move |liveness| run(api, cadence, display, liveness));
                tracing::info!("Logging active, readings polling started");
                Reconcile::Started
            }
            _ => {
                let stopped = self.poll_loop.stop();
                // Also covers a loop that exited on its own and left a table behind
                self.display.set(ReadingsView::NoData);
                if stopped {
                    tracing::info!("Logging inactive, readings polling stopped");
                    Reconcile::Stopped
                } else {
                    Reconcile::Unchanged
                }
            }
        }
    }
}

/// Body of the readings loop: resolve the cadence once, then poll
async fn run<A: RemoteApi>(
    api: Arc<A>,
    cadence: Cadence,
    display: Arc<Display>,
    liveness: Liveness,
) {
    let settings = match api.settings().await {
        Ok(settings) => Some(settings),
        Err(e) => {
            tracing::debug!("Settings unavailable, using {:?}: {}", cadence.max_interval, e);
            None
        }
    };
    let interval = cadence.interval_for(settings.as_ref());
    tracing::debug!("Readings refresh every {:?}", interval);

    poll_loop::every(interval, liveness, move |live| {
        let api = api.clone();
        let display = display.clone();
        async move {
            match api.latest().await {
                Ok(raw) => match Readings::from_raw(&raw) {
                    Some(readings) => {
                        display.set_if_live(&live, ReadingsView::from_readings(&readings))
                    }
                    None => tracing::trace!("No readings yet"),
                },
                // Keep the last table; the next tick tries again
                Err(e) => tracing::warn!("Readings fetch failed: {}", e),
            }
        }
    })
    .await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::FakeApi;
    use crate::error::ApiError;
    use crate::session::Mode;
    use serde_json::json;

    fn state(status: Status) -> SessionState {
        SessionState {
            mode: if status == Status::Idle {
                Mode::None
            } else {
                Mode::Default
            },
            status,
            ..Default::default()
        }
    }

    fn api_with_readings() -> Arc<FakeApi> {
        let api = Arc::new(FakeApi::new());
        api.set_settings(Ok(json!({ "LOG_INTERVAL": 900 }).as_object().cloned().unwrap()));
        api.set_latest(Ok(json!({ "voltage_l1": 230.5 }).as_object().cloned().unwrap()));
        api
    }

    #[test]
    fn test_cadence_clamps_to_bound() {
        let cadence = Cadence::new(Duration::from_secs(5));
        let long = json!({ "LOG_INTERVAL": 900 }).as_object().cloned().unwrap();
        let short = json!({ "LOG_INTERVAL": 2 }).as_object().cloned().unwrap();
        let text = json!({ "LOG_INTERVAL": "3" }).as_object().cloned().unwrap();
        let zero = json!({ "LOG_INTERVAL": 0 }).as_object().cloned().unwrap();

        assert_eq!(cadence.interval_for(Some(&long)), Duration::from_secs(5));
        assert_eq!(cadence.interval_for(Some(&short)), Duration::from_secs(2));
        assert_eq!(cadence.interval_for(Some(&text)), Duration::from_secs(3));
        assert_eq!(cadence.interval_for(Some(&zero)), Duration::from_secs(5));
        assert_eq!(cadence.interval_for(None), Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reconcile_is_idempotent() {
        let api = api_with_readings();
        let mut supervisor = ReadingsSupervisor::new(api, Cadence::new(Duration::from_secs(5)));

        assert_eq!(supervisor.reconcile(&state(Status::Logging)), Reconcile::Started);
        assert_eq!(supervisor.reconcile(&state(Status::Logging)), Reconcile::Unchanged);
        assert!(supervisor.is_running());

        assert_eq!(supervisor.reconcile(&state(Status::Idle)), Reconcile::Stopped);
        assert_eq!(supervisor.reconcile(&state(Status::Idle)), Reconcile::Unchanged);
        assert!(!supervisor.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_keeps_loop_running() {
        let api = api_with_readings();
        let mut supervisor = ReadingsSupervisor::new(api, Cadence::new(Duration::from_secs(5)));

        supervisor.reconcile(&state(Status::Logging));
        assert_eq!(supervisor.reconcile(&state(Status::Unknown)), Reconcile::Unchanged);
        assert!(supervisor.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_logging_to_idle_clears_readings_in_one_call() {
        let api = api_with_readings();
        let mut supervisor =
            ReadingsSupervisor::new(api.clone(), Cadence::new(Duration::from_secs(5)));

        supervisor.reconcile(&state(Status::Logging));
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(matches!(supervisor.view(), ReadingsView::Table(_)));

        supervisor.reconcile(&state(Status::Idle));
        assert_eq!(supervisor.view(), ReadingsView::NoData);

        let fetched = api.count("latest");
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(api.count("latest"), fetched);
        assert_eq!(supervisor.view(), ReadingsView::NoData);
    }

    #[tokio::test(start_paused = true)]
    async fn test_polls_at_clamped_interval() {
        let api = api_with_readings();
        let mut supervisor =
            ReadingsSupervisor::new(api.clone(), Cadence::new(Duration::from_secs(5)));

        supervisor.reconcile(&state(Status::Logging));
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(api.count("latest"), 1);

        // 900 s configured, clamped to 5 s
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(api.count("latest"), 3);
        supervisor.reconcile(&state(Status::Idle));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_failure_keeps_last_table() {
        let api = api_with_readings();
        let mut supervisor =
            ReadingsSupervisor::new(api.clone(), Cadence::new(Duration::from_secs(5)));

        supervisor.reconcile(&state(Status::Logging));
        tokio::time::sleep(Duration::from_millis(10)).await;
        let before = supervisor.view();

        api.set_latest(Err(ApiError::Transient("timeout".to_string())));
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(supervisor.view(), before);
        supervisor.reconcile(&state(Status::Idle));
    }

    #[tokio::test(start_paused = true)]
    async fn test_listener_sees_table_then_empty_state() {
        let api = api_with_readings();
        let mut supervisor = ReadingsSupervisor::new(api, Cadence::new(Duration::from_secs(5)));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        supervisor.on_update(move |v| sink.lock().unwrap().push(v.clone()));

        supervisor.reconcile(&state(Status::Logging));
        tokio::time::sleep(Duration::from_millis(10)).await;
        supervisor.reconcile(&state(Status::Idle));

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert!(matches!(seen[0], ReadingsView::Table(_)));
        assert_eq!(seen[1], ReadingsView::NoData);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stopped_loop_cannot_overwrite_empty_state() {
        let mut poll = PollLoop::new("test");
        let (tx, rx) = tokio::sync::oneshot::channel::<Liveness>();
        poll.start(move |live| async move {
            let _ = tx.send(live);
        });
        let live = rx.await.unwrap();

        let display = Display::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        *display.listener.lock().unwrap() =
            Some(Box::new(move |v: &ReadingsView| sink.lock().unwrap().push(v.clone())));

        let raw = json!({ "voltage_l1": 230.5 }).as_object().cloned().unwrap();
        let table = ReadingsView::from_readings(&Readings::from_raw(&raw).unwrap());
        display.set_if_live(&live, table.clone());
        assert_eq!(*display.view.lock().unwrap(), table);

        // What reconcile does on leaving Logging, then a tick that was mid-flight
        poll.stop();
        display.set(ReadingsView::NoData);
        display.set_if_live(&live, table.clone());

        assert_eq!(*display.view.lock().unwrap(), ReadingsView::NoData);
        assert_eq!(*seen.lock().unwrap(), vec![table, ReadingsView::NoData]);
    }
}
