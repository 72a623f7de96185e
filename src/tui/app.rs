// TUI application state
//
// App owns the dashboard (status + readings loops), the explorer navigator
// and all UI-only state. Background work never touches App directly: poll
// observers and spawned control requests report back as AppEvents on a
// channel that the event loop drains.

use super::components::Toast;
use super::modal::{Modal, ModalAction};
use crate::api::{FileSource, RemoteApi};
use crate::config::Config;
use crate::dashboard::Dashboard;
use crate::error::{ApiError, SubmitError};
use crate::explore::{Completion, ExploreMode, Navigator, Step, ViewKind};
use crate::logging::LogBuffer;
use crate::readings::ReadingsView;
use crate::schedule::{self, submit_schedule, ScheduleForm, ScheduleOutcome};
use crate::session::SessionState;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Session control requests issued from the keyboard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Start,
    Stop,
}

impl Control {
    fn done(&self) -> &'static str {
        match self {
            Control::Start => "Logging started",
            Control::Stop => "Logging stopped, schedules cleared",
        }
    }

    fn failed(&self) -> &'static str {
        match self {
            Control::Start => "Start failed",
            Control::Stop => "Stop failed",
        }
    }
}

/// Results delivered to the event loop from outside it
#[derive(Debug)]
pub enum AppEvent {
    Session(SessionState),
    Readings(ReadingsView),
    Control {
        action: Control,
        result: Result<SessionState, ApiError>,
    },
    Schedule(Result<ScheduleOutcome, SubmitError>),
}

pub struct App<A: RemoteApi> {
    pub dashboard: Dashboard<A>,
    pub navigator: Navigator<A>,

    /// Latest session state, `None` until the first poll lands
    pub session: Option<SessionState>,
    pub readings: ReadingsView,

    pub modal: Option<Modal>,
    pub toast: Option<Toast>,

    /// Highlighted row in the explorer's top frame
    pub cursor: usize,
    /// Address produced by a view/download selection
    pub link: Option<String>,

    pub show_logs: bool,
    pub log_buffer: LogBuffer,
    pub base_url: String,
    pub should_quit: bool,

    /// Schedule form contents, kept across openings of the form
    form: ScheduleForm,
    control_pending: bool,
    tx: mpsc::UnboundedSender<AppEvent>,
}

impl<A: RemoteApi> App<A> {
    pub fn new(
        api: Arc<A>,
        config: &Config,
        log_buffer: LogBuffer,
    ) -> (Self, mpsc::UnboundedReceiver<AppEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();

        let dashboard = Dashboard::new(api.clone(), &config.polling);
        let session_tx = tx.clone();
        dashboard.on_session(move |state| {
            let _ = session_tx.send(AppEvent::Session(state.clone()));
        });
        let readings_tx = tx.clone();
        dashboard.on_readings(move |view| {
            let _ = readings_tx.send(AppEvent::Readings(view.clone()));
        });

        let app = Self {
            dashboard,
            navigator: Navigator::new(api, config.explore.cache_frames),
            session: None,
            readings: ReadingsView::NoData,
            modal: None,
            toast: None,
            cursor: 0,
            link: None,
            show_logs: true,
            log_buffer,
            base_url: config.base_url.clone(),
            should_quit: false,
            form: ScheduleForm::new(),
            control_pending: false,
            tx,
        };
        (app, rx)
    }

    /// Begin status polling
    pub fn start(&self) {
        self.dashboard.start();
    }

    /// Stop every background task before the terminal is restored
    pub fn shutdown(&mut self) {
        self.dashboard.stop();
        self.navigator.close();
    }

    /// Periodic housekeeping on the redraw tick
    pub fn tick(&mut self) {
        if self.toast.as_ref().is_some_and(Toast::is_expired) {
            self.toast = None;
        }
    }

    pub fn show_toast(&mut self, message: impl Into<String>) {
        self.toast = Some(Toast::info(message));
    }

    pub fn show_error(&mut self, message: impl Into<String>) {
        self.toast = Some(Toast::error(message));
    }

    pub fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Session(state) => self.session = Some(state),
            AppEvent::Readings(view) => self.readings = view,
            AppEvent::Control { action, result } => {
                self.control_pending = false;
                match result {
                    Ok(_) => self.show_toast(action.done()),
                    Err(e) => self.show_error(format!("{}: {}", action.failed(), e)),
                }
            }
            AppEvent::Schedule(result) => self.on_schedule_result(result),
        }
    }

    /// Apply a navigator completion and keep the cursor on a real row
    pub fn on_completion(&mut self, completion: Completion) {
        if self.navigator.apply(completion) {
            self.clamp_cursor();
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Keyboard
    // ─────────────────────────────────────────────────────────────────────

    /// Layered dispatch: Modal → Global → Explorer
    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        if self.modal.is_some() {
            self.handle_modal_key(key.code);
            return;
        }
        if self.handle_global_key(key.code) {
            return;
        }
        self.handle_explorer_key(key.code);
    }

    fn handle_modal_key(&mut self, code: KeyCode) {
        let Some(modal) = self.modal.as_mut() else {
            return;
        };
        match modal.handle_input(code) {
            ModalAction::None => {}
            ModalAction::Close => {
                if let Some(Modal::Schedule(m)) = self.modal.take() {
                    self.form = m.form;
                }
            }
            ModalAction::SubmitSchedule => self.send_schedule(),
            ModalAction::RefineAnalysis {
                start_time,
                end_time,
            } => {
                self.modal = None;
                let step = self.navigator.refine_analysis(&start_time, &end_time);
                self.after_step(step);
            }
        }
    }

    fn handle_global_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char('q') | KeyCode::Char('Q') => self.should_quit = true,
            KeyCode::Char('?') => self.modal = Some(Modal::help()),
            KeyCode::Char('s') => self.control(Control::Start),
            KeyCode::Char('x') => self.control(Control::Stop),
            KeyCode::Char('c') => self.modal = Some(Modal::schedule(self.form.clone())),
            KeyCode::Char('g') => self.show_logs = !self.show_logs,
            KeyCode::Char('v') => self.open_explorer(ExploreMode::View, FileSource::Data),
            KeyCode::Char('V') => self.open_explorer(ExploreMode::View, FileSource::Logs),
            KeyCode::Char('a') => self.open_explorer(ExploreMode::Analyze, FileSource::Data),
            KeyCode::Char('z') => self.open_explorer(ExploreMode::Visualize, FileSource::Data),
            KeyCode::Char('d') => self.open_explorer(ExploreMode::Download, FileSource::Data),
            KeyCode::Char('D') => self.open_explorer(ExploreMode::Download, FileSource::Logs),
            _ => return false,
        }
        true
    }

    fn handle_explorer_key(&mut self, code: KeyCode) {
        let Some(top) = self.navigator.top() else {
            return;
        };
        let len = top.selectable_len();
        let analyzing =
            top.view == ViewKind::FileAction && top.mode() == Some(ExploreMode::Analyze);

        match code {
            KeyCode::Up | KeyCode::Char('k') => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Down | KeyCode::Char('j') => {
                if self.cursor + 1 < len {
                    self.cursor += 1;
                }
            }
            KeyCode::Enter => self.select(),
            KeyCode::Char(' ') => {
                self.navigator.toggle_column(self.cursor);
            }
            KeyCode::Backspace | KeyCode::Left => {
                if self.navigator.back() {
                    self.cursor = 0;
                    self.link = None;
                }
            }
            KeyCode::Esc => {
                self.navigator.close();
                self.cursor = 0;
                self.link = None;
            }
            KeyCode::Char('r') => {
                self.navigator.retry();
            }
            KeyCode::Char('w') if analyzing => self.modal = Some(Modal::analysis_window()),
            _ => {}
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Actions
    // ─────────────────────────────────────────────────────────────────────

    fn open_explorer(&mut self, mode: ExploreMode, source: FileSource) {
        self.navigator.open_with_source(mode, source);
        self.cursor = 0;
        self.link = None;
    }

    /// Enter on the explorer's top frame
    fn select(&mut self) {
        let Some(view) = self.navigator.top().map(|f| f.view) else {
            return;
        };
        let step = match view {
            ViewKind::FileList => self.navigator.select_file(self.cursor),
            ViewKind::FileAction => self.navigator.choose_visualization(self.cursor),
            ViewKind::Refinement => match self.navigator.submit_refinement() {
                Ok(step) => step,
                Err(e) => {
                    self.show_error(e.to_string());
                    return;
                }
            },
            ViewKind::Result => Step::Ignored,
        };
        self.after_step(step);
    }

    fn after_step(&mut self, step: Step) {
        match step {
            Step::Pushed => {
                self.cursor = 0;
                self.link = None;
            }
            Step::Navigate(url) => {
                tracing::info!("File available at {}", url);
                self.show_toast("Link ready");
                self.link = Some(url);
            }
            Step::Ignored => {}
        }
    }

    fn clamp_cursor(&mut self) {
        let len = self.navigator.top().map_or(0, |f| f.selectable_len());
        if self.cursor >= len {
            self.cursor = len.saturating_sub(1);
        }
    }

    /// Start or stop logging on a background task
    fn control(&mut self, action: Control) {
        if self.control_pending {
            self.show_toast("Request already in progress");
            return;
        }
        self.control_pending = true;

        let controller = self.dashboard.controller.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = match action {
                Control::Start => controller.start_default().await,
                Control::Stop => controller.stop_and_clear().await,
            };
            let _ = tx.send(AppEvent::Control { action, result });
        });
    }

    /// Validate the open form locally, then send it on a background task
    fn send_schedule(&mut self) {
        let Some(Modal::Schedule(modal)) = self.modal.as_mut() else {
            return;
        };
        let selection = modal.form.selection();
        self.form = modal.form.clone();

        if let Err(e) = schedule::validate(&selection) {
            modal.error = Some(e.to_string());
            return;
        }
        modal.error = None;
        modal.submitting = true;

        let controller = self.dashboard.controller.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = submit_schedule(&controller, &selection).await;
            let _ = tx.send(AppEvent::Schedule(result));
        });
    }

    fn on_schedule_result(&mut self, result: Result<ScheduleOutcome, SubmitError>) {
        match result {
            Ok(outcome) => {
                self.form = ScheduleForm::new();
                if matches!(self.modal, Some(Modal::Schedule(_))) {
                    self.modal = None;
                }
                self.show_toast(format!("Schedule accepted ({:?})", outcome.request.mode));
            }
            Err(e) => {
                // The form stays open and populated so the input can be fixed
                match self.modal.as_mut() {
                    Some(Modal::Schedule(modal)) => {
                        modal.submitting = false;
                        modal.error = Some(e.to_string());
                    }
                    _ => self.show_error(format!("Schedule failed: {}", e)),
                }
            }
        }
    }
}
