//! Exploration navigator
//!
//! Owns a stack of frames (file list → file action → refinement → result).
//! Every forward transition pushes a frame and issues that frame's request
//! on a spawned task. At most one request is in flight: a new transition
//! aborts the previous one, and each completion carries the sequence number
//! it was issued under so a late answer can never land on a newer frame.
//!
//! Back pops the top frame. The uncovered frame is shown from cache when it
//! finished loading and caching is on; otherwise its request is re-issued.

mod files;
mod frame;

pub use files::{newest_first, FileDescriptor, NO_TIME};
pub use frame::{
    encode_columns, params, request_for, Content, ExploreMode, Frame, Params, Request, ViewKind, CUSTOM_PLOT,
    P_COLUMNS, P_END, P_FILE, P_MODE, P_PLOT, P_SOURCE, P_START,
};

use crate::api::{FileSource, RemoteApi};
use crate::error::{ApiError, ValidationError};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Result of a request, tagged with the sequence number it was issued under
#[derive(Debug)]
pub struct Completion {
    seq: u64,
    result: Result<Content, ApiError>,
}

struct Pending {
    seq: u64,
    /// The frame was pushed for this request (as opposed to a reload)
    pushed: bool,
    handle: JoinHandle<()>,
}

/// Outcome of selecting something in the explorer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// A frame was pushed and its request issued
    Pushed,
    /// Leave the explorer for this address (view/download)
    Navigate(String),
    /// Selection did not apply to the current frame
    Ignored,
}

pub struct Navigator<A> {
    api: Arc<A>,
    cache_frames: bool,
    stack: Vec<Frame>,
    seq: u64,
    pending: Option<Pending>,
    tx: mpsc::UnboundedSender<Completion>,
    rx: mpsc::UnboundedReceiver<Completion>,
}

impl<A: RemoteApi> Navigator<A> {
    pub fn new(api: Arc<A>, cache_frames: bool) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            api,
            cache_frames,
            stack: Vec::new(),
            seq: 0,
            pending: None,
            tx,
            rx,
        }
    }

    pub fn top(&self) -> Option<&Frame> {
        self.stack.last()
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Enter the file list for `mode`, replacing whatever was open
    pub fn open(&mut self, mode: ExploreMode) {
        self.open_with_source(mode, FileSource::Data);
    }

    /// As `open`; view and download may list service logs instead of data files
    pub fn open_with_source(&mut self, mode: ExploreMode, source: FileSource) {
        self.cancel();
        self.stack.clear();
        self.push(
            ViewKind::FileList,
            params(&[
                (P_MODE, mode.as_str()),
                (P_SOURCE, mode.source(source).as_str()),
            ]),
        );
    }

    /// Drop every frame and any request in flight
    pub fn close(&mut self) {
        self.cancel();
        self.stack.clear();
    }

    /// Pick entry `index` of the file list
    pub fn select_file(&mut self, index: usize) -> Step {
        let Some(top) = self.target() else {
            return Step::Ignored;
        };
        let (ViewKind::FileList, Content::Files(files), Some(mode)) =
            (top.view, &top.content, top.mode())
        else {
            return Step::Ignored;
        };
        let Some(file) = files.get(index) else {
            return Step::Ignored;
        };
        let name = file.name.clone();

        if mode.is_direct() {
            let source = FileSource::from_str(top.param(P_SOURCE).unwrap_or_default());
            tracing::debug!("Opening {} directly", name);
            return Step::Navigate(self.api.file_url(source, &name));
        }

        let next = params(&[(P_MODE, mode.as_str()), (P_FILE, name.as_str())]);
        self.supersede();
        self.push(ViewKind::FileAction, next);
        Step::Pushed
    }

    /// Pick entry `index` of the visualization type list
    pub fn choose_visualization(&mut self, index: usize) -> Step {
        let Some(top) = self.target() else {
            return Step::Ignored;
        };
        let (ViewKind::FileAction, Content::PlotTypes(types), Some(file)) =
            (top.view, &top.content, top.param(P_FILE))
        else {
            return Step::Ignored;
        };
        let Some(plot) = types.get(index) else {
            return Step::Ignored;
        };

        let next = params(&[
            (P_MODE, ExploreMode::Visualize.as_str()),
            (P_FILE, file),
            (P_PLOT, plot.id.as_str()),
        ]);
        let view = if plot.id == CUSTOM_PLOT {
            ViewKind::Refinement
        } else {
            ViewKind::Result
        };
        self.supersede();
        self.push(view, next);
        Step::Pushed
    }

    /// Flip one column in the refinement frame. Local only.
    pub fn toggle_column(&mut self, index: usize) -> bool {
        match self.stack.last_mut() {
            Some(Frame {
                view: ViewKind::Refinement,
                content: Content::Columns { selected, .. },
                ..
            }) => match selected.get_mut(index) {
                Some(on) => {
                    *on = !*on;
                    true
                }
                None => false,
            },
            _ => false,
        }
    }

    /// Plot the selected columns. Nothing is sent when none are selected.
    pub fn submit_refinement(&mut self) -> Result<Step, ValidationError> {
        let Some(top) = self.target() else {
            return Ok(Step::Ignored);
        };
        let (ViewKind::Refinement, Content::Columns { columns, selected }) =
            (top.view, &top.content)
        else {
            return Ok(Step::Ignored);
        };

        let chosen: Vec<&str> = columns
            .iter()
            .zip(selected)
            .filter(|(_, on)| **on)
            .map(|(c, _)| c.as_str())
            .collect();
        if chosen.is_empty() {
            return Err(ValidationError::EmptySelection);
        }

        let next = params(&[
            (P_MODE, ExploreMode::Visualize.as_str()),
            (P_FILE, top.param(P_FILE).unwrap_or_default()),
            (P_PLOT, CUSTOM_PLOT),
            (P_COLUMNS, encode_columns(&chosen).as_str()),
        ]);
        self.supersede();
        self.push(ViewKind::Result, next);
        Ok(Step::Pushed)
    }

    /// Re-run the open analysis over a time window; blank bounds are open
    pub fn refine_analysis(&mut self, start_time: &str, end_time: &str) -> Step {
        let Some(top) = self.target() else {
            return Step::Ignored;
        };
        let (ViewKind::FileAction, Some(ExploreMode::Analyze), Some(file)) =
            (top.view, top.mode(), top.param(P_FILE))
        else {
            return Step::Ignored;
        };

        let mut next = params(&[(P_MODE, ExploreMode::Analyze.as_str()), (P_FILE, file)]);
        for (key, value) in [(P_START, start_time), (P_END, end_time)] {
            let value = value.trim();
            if !value.is_empty() {
                next.insert(key.to_string(), value.to_string());
            }
        }
        self.supersede();
        self.push(ViewKind::Result, next);
        Step::Pushed
    }

    /// Pop the top frame. Returns false at the root.
    pub fn back(&mut self) -> bool {
        if self.stack.len() <= 1 {
            return false;
        }
        self.cancel();
        self.stack.pop();

        let reload = match self.stack.last_mut() {
            Some(frame) if self.cache_frames && frame.is_ready() => false,
            Some(frame) => {
                frame.content = Content::Loading;
                true
            }
            None => false,
        };
        if reload {
            self.issue(false);
        }
        true
    }

    /// Re-issue the top frame's request, e.g. after an inline error
    pub fn retry(&mut self) -> bool {
        if self.pending.is_some() {
            return false;
        }
        match self.stack.last_mut() {
            Some(frame) => frame.content = Content::Loading,
            None => return false,
        }
        self.issue(false);
        true
    }

    /// Apply a completion if it belongs to the request in flight
    pub fn apply(&mut self, completion: Completion) -> bool {
        match &self.pending {
            Some(p) if p.seq == completion.seq => {}
            _ => {
                tracing::trace!("Discarding superseded response #{}", completion.seq);
                return false;
            }
        }
        self.pending = None;

        if let Some(frame) = self.stack.last_mut() {
            frame.content = match completion.result {
                Ok(content) => content,
                Err(e) => {
                    tracing::warn!("Explorer request failed: {}", e);
                    Content::Error(e.to_string())
                }
            };
        }
        true
    }

    /// Next completion, stale or not. Pending forever when idle.
    pub async fn next_completion(&mut self) -> Option<Completion> {
        self.rx.recv().await
    }

    /// Wait until no request is in flight
    pub async fn settle(&mut self) {
        while self.pending.is_some() {
            match self.rx.recv().await {
                Some(completion) => {
                    self.apply(completion);
                }
                None => break,
            }
        }
    }

    fn push(&mut self, view: ViewKind, params: Params) {
        self.stack.push(Frame::new(view, params));
        self.issue(true);
    }

    /// Spawn the top frame's request under a fresh sequence number
    fn issue(&mut self, pushed: bool) {
        let Some(frame) = self.stack.last_mut() else {
            return;
        };
        let Some(request) = frame.request() else {
            frame.content = Content::Error("Nothing to load for this view".to_string());
            return;
        };

        self.seq += 1;
        let seq = self.seq;
        tracing::debug!("Explorer request #{}: {:?}", seq, request);

        let api = self.api.clone();
        let tx = self.tx.clone();
        let handle = tokio::spawn(async move {
            let result = request.run(api.as_ref()).await;
            // Receiver gone means the navigator was dropped
            let _ = tx.send(Completion { seq, result });
        });
        self.pending = Some(Pending {
            seq,
            pushed,
            handle,
        });
    }

    /// Abort the request in flight, leaving frames as they are
    fn cancel(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.handle.abort();
        }
    }

    /// The frame a forward transition applies to: the top, or the frame under
    /// a pushed frame that is still loading, since superseding pops that one
    fn target(&self) -> Option<&Frame> {
        let n = self.stack.len();
        match &self.pending {
            Some(p) if p.pushed && n > 1 && self.stack[n - 1].content == Content::Loading => {
                self.stack.get(n - 2)
            }
            _ => self.stack.last(),
        }
    }

    /// Abort the request in flight and drop the frame it was pushed for.
    /// Only called once a transition is known to apply.
    fn supersede(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.handle.abort();
            let loading = matches!(self.stack.last(), Some(f) if f.content == Content::Loading);
            if pending.pushed && loading && self.stack.len() > 1 {
                self.stack.pop();
            }
        }
    }
}

impl<A> Drop for Navigator<A> {
    fn drop(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.handle.abort();
        }
    }
}
