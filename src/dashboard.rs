//! Wiring between the session controller and the readings supervisor
//!
//! The supervisor is driven only from inside the controller's observer, so
//! the readings loop is decided (started or stopped) before the status tick
//! that triggered it returns. The UI never starts or stops it directly.

use crate::api::RemoteApi;
use crate::config::PollingConfig;
use crate::readings::{Cadence, ReadingsSupervisor, ReadingsView};
use crate::session::{SessionController, SessionState};
use std::sync::{Arc, Mutex};

pub struct Dashboard<A> {
    pub controller: Arc<SessionController<A>>,
    readings: Arc<Mutex<ReadingsSupervisor<A>>>,
}

impl<A: RemoteApi> Dashboard<A> {
    pub fn new(api: Arc<A>, polling: &PollingConfig) -> Self {
        let controller = Arc::new(SessionController::new(
            api.clone(),
            polling.status_interval(),
        ));
        let readings = Arc::new(Mutex::new(ReadingsSupervisor::new(
            api,
            Cadence::new(polling.readings_max_interval()),
        )));

        let supervisor = readings.clone();
        controller.on_change(move |state| {
            supervisor
                .lock()
                .expect("readings supervisor lock poisoned")
                .reconcile(state);
        });

        Self {
            controller,
            readings,
        }
    }

    /// Called with each new session state, after the readings loop is reconciled
    pub fn on_session(&self, observer: impl Fn(&SessionState) + Send + Sync + 'static) {
        self.controller.on_change(observer);
    }

    /// Called with every change of the readings display
    pub fn on_readings(&self, listener: impl Fn(&ReadingsView) + Send + Sync + 'static) {
        self.readings
            .lock()
            .expect("readings supervisor lock poisoned")
            .on_update(listener);
    }

    pub fn readings_view(&self) -> ReadingsView {
        self.readings
            .lock()
            .expect("readings supervisor lock poisoned")
            .view()
    }

    pub fn start(&self) {
        self.controller.start();
    }

    /// Stop both loops
    pub fn stop(&self) {
        self.controller.stop();
        self.readings
            .lock()
            .expect("readings supervisor lock poisoned")
            .stop();
    }
}
