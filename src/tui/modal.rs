// Modal system for TUI overlays
//
// Self-contained modal dialogs that handle their own input and return actions.
// App just holds Option<Modal>, input routing acts on returned ModalAction.

use crate::schedule::{Field, ScheduleForm, ScheduleType, TriggerMode};
use crossterm::event::KeyCode;

/// Actions returned by modal input handling
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModalAction {
    /// Input consumed, no state change needed
    None,
    /// Close the modal
    Close,
    /// Validate and send the schedule form
    SubmitSchedule,
    /// Re-run the open analysis over the entered window
    RefineAnalysis { start_time: String, end_time: String },
}

/// Focusable rows of the schedule form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormFocus {
    Trigger,
    Type,
    Field(Field),
}

/// Schedule form overlay
#[derive(Debug, Clone, Default)]
pub struct ScheduleModal {
    pub form: ScheduleForm,
    focus: usize,
    /// Last validation error or remote rejection, shown under the form
    pub error: Option<String>,
    /// A submission is in flight
    pub submitting: bool,
}

impl ScheduleModal {
    pub fn new(form: ScheduleForm) -> Self {
        Self {
            form,
            ..Default::default()
        }
    }

    /// Rows in tab order for the current mode
    pub fn rows(&self) -> Vec<FormFocus> {
        let mut rows = vec![FormFocus::Trigger];
        if self.form.trigger() == TriggerMode::Scheduled {
            rows.push(FormFocus::Type);
        }
        rows.extend(self.form.visible_fields().iter().copied().map(FormFocus::Field));
        rows
    }

    pub fn focus(&self) -> FormFocus {
        let rows = self.rows();
        rows[self.focus.min(rows.len() - 1)]
    }

    fn move_focus(&mut self, forward: bool) {
        let len = self.rows().len();
        self.focus = if forward {
            (self.focus + 1) % len
        } else {
            (self.focus + len - 1) % len
        };
    }

    /// Left/Right/Space on a selector row flips it
    fn cycle(&mut self) {
        match self.focus() {
            FormFocus::Trigger => {
                let next = match self.form.trigger() {
                    TriggerMode::Default => TriggerMode::Scheduled,
                    TriggerMode::Scheduled => TriggerMode::Default,
                };
                self.form.set_trigger(next);
            }
            FormFocus::Type => {
                let next = match self.form.schedule_type() {
                    Some(ScheduleType::Once) => ScheduleType::Recurring,
                    _ => ScheduleType::Once,
                };
                self.form.set_schedule_type(next);
            }
            FormFocus::Field(_) => {}
        }
        self.focus = self.focus.min(self.rows().len() - 1);
    }

    fn handle_input(&mut self, key: KeyCode) -> ModalAction {
        if self.submitting {
            return match key {
                KeyCode::Esc => ModalAction::Close,
                _ => ModalAction::None,
            };
        }

        match (key, self.focus()) {
            (KeyCode::Esc, _) => return ModalAction::Close,
            (KeyCode::Enter, _) => return ModalAction::SubmitSchedule,
            (KeyCode::Tab | KeyCode::Down, _) => self.move_focus(true),
            (KeyCode::BackTab | KeyCode::Up, _) => self.move_focus(false),
            (
                KeyCode::Left | KeyCode::Right | KeyCode::Char(' '),
                FormFocus::Trigger | FormFocus::Type,
            ) => self.cycle(),
            (KeyCode::Char(c), FormFocus::Field(field)) => self.form.field_mut(field).push(c),
            (KeyCode::Backspace, FormFocus::Field(field)) => {
                self.form.field_mut(field).pop();
            }
            _ => {}
        }
        ModalAction::None
    }
}

/// Time window for refining an open analysis
#[derive(Debug, Clone, Default)]
pub struct WindowModal {
    pub start_time: String,
    pub end_time: String,
    /// false = start, true = end
    pub on_end: bool,
}

impl WindowModal {
    fn value_mut(&mut self) -> &mut String {
        if self.on_end {
            &mut self.end_time
        } else {
            &mut self.start_time
        }
    }

    fn handle_input(&mut self, key: KeyCode) -> ModalAction {
        match key {
            KeyCode::Esc => ModalAction::Close,
            KeyCode::Enter => ModalAction::RefineAnalysis {
                start_time: self.start_time.clone(),
                end_time: self.end_time.clone(),
            },
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
                self.on_end = !self.on_end;
                ModalAction::None
            }
            KeyCode::Backspace => {
                self.value_mut().pop();
                ModalAction::None
            }
            KeyCode::Char(c) => {
                self.value_mut().push(c);
                ModalAction::None
            }
            _ => ModalAction::None,
        }
    }
}

/// Available modal types
#[derive(Debug, Clone)]
pub enum Modal {
    /// Help overlay - shows keyboard shortcuts
    Help,
    Schedule(ScheduleModal),
    AnalysisWindow(WindowModal),
}

impl Modal {
    pub fn help() -> Self {
        Modal::Help
    }

    pub fn schedule(form: ScheduleForm) -> Self {
        Modal::Schedule(ScheduleModal::new(form))
    }

    pub fn analysis_window() -> Self {
        Modal::AnalysisWindow(WindowModal::default())
    }

    /// Handle keyboard input, return action for caller to execute
    pub fn handle_input(&mut self, key: KeyCode) -> ModalAction {
        match self {
            Modal::Help => match key {
                KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q') => ModalAction::Close,
                _ => ModalAction::None,
            },
            Modal::Schedule(form) => form.handle_input(key),
            Modal::AnalysisWindow(window) => window.handle_input(key),
        }
    }
}
