//! Navigation frames and the requests behind them
//!
//! A frame is data: a `ViewKind`, immutable `Params`, and the content its
//! request produced. `request_for` maps kind + params to exactly one
//! `Request`, so re-issuing a frame's request is deterministic.

use super::files::{newest_first, FileDescriptor};
use crate::api::{AnalysisRange, FileSource, RemoteApi, VisualizationType};
use crate::error::ApiError;
use std::collections::BTreeMap;

/// Visualization type that goes through column selection first
pub const CUSTOM_PLOT: &str = "custom";
const CUSTOM_PLOT_NAME: &str = "Custom Selection";

// Param keys
pub const P_MODE: &str = "mode";
pub const P_SOURCE: &str = "source";
pub const P_FILE: &str = "file";
pub const P_PLOT: &str = "plot_type";
pub const P_COLUMNS: &str = "columns";
pub const P_START: &str = "start_time";
pub const P_END: &str = "end_time";

pub type Params = BTreeMap<String, String>;

/// What the user came to the explorer to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExploreMode {
    View,
    Analyze,
    Visualize,
    Download,
}

impl ExploreMode {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "view" => Some(Self::View),
            "analyze" => Some(Self::Analyze),
            "visualize" => Some(Self::Visualize),
            "download" => Some(Self::Download),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::View => "view",
            Self::Analyze => "analyze",
            Self::Visualize => "visualize",
            Self::Download => "download",
        }
    }

    /// View and download leave the explorer instead of pushing a frame
    pub fn is_direct(&self) -> bool {
        matches!(self, Self::View | Self::Download)
    }

    /// Only direct modes may browse service logs
    pub fn source(&self, requested: FileSource) -> FileSource {
        if self.is_direct() {
            requested
        } else {
            FileSource::Data
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewKind {
    FileList,
    FileAction,
    Refinement,
    Result,
}

/// A request a frame is built from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    ListFiles(FileSource),
    Analyze { file: String, range: AnalysisRange },
    VisualizationTypes,
    Columns { file: String },
    Visualize {
        file: String,
        plot_type: String,
        columns: Option<Vec<String>>,
    },
}

impl Request {
    /// Issue the request and shape the response into frame content
    pub async fn run<A: RemoteApi>(self, api: &A) -> Result<Content, ApiError> {
        match self {
            Self::ListFiles(source) => {
                let names = api.list_files(source).await?;
                Ok(Content::Files(newest_first(&names)))
            }
            Self::Analyze { file, range } => {
                let response = api.analyze(&file, &range).await?;
                Ok(Content::Analysis(response.analysis_text))
            }
            Self::VisualizationTypes => {
                let types = api.visualization_types().await?;
                Ok(Content::PlotTypes(with_custom(types)))
            }
            Self::Columns { file } => {
                let response = api.columns(&file).await?;
                Ok(Content::Columns {
                    selected: vec![false; response.columns.len()],
                    columns: response.columns,
                })
            }
            Self::Visualize {
                file,
                plot_type,
                columns,
            } => {
                let plots = api.visualize(&file, &plot_type, columns.as_deref()).await?;
                Ok(Content::Plots {
                    regular: absolute(api, &plots.regular_plot),
                    normalized: absolute(api, &plots.normalized_plot),
                })
            }
        }
    }
}

fn absolute<A: RemoteApi>(api: &A, url: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        api.resolve_url(url)
    }
}

/// Service types plus the column-picking entry, which is always offered
fn with_custom(mut types: Vec<VisualizationType>) -> Vec<VisualizationType> {
    if !types.iter().any(|t| t.id == CUSTOM_PLOT) {
        types.push(VisualizationType {
            id: CUSTOM_PLOT.to_string(),
            name: CUSTOM_PLOT_NAME.to_string(),
        });
    }
    types
}

/// The one request a frame with these params stands for
pub fn request_for(view: ViewKind, params: &Params) -> Option<Request> {
    let get = |key: &str| params.get(key).cloned();
    let mode = params.get(P_MODE).and_then(|m| ExploreMode::from_str(m))?;

    match (view, mode) {
        (ViewKind::FileList, _) => Some(Request::ListFiles(mode.source(
            params
                .get(P_SOURCE)
                .map(|s| FileSource::from_str(s))
                .unwrap_or_default(),
        ))),
        (ViewKind::FileAction, ExploreMode::Analyze) => Some(Request::Analyze {
            file: get(P_FILE)?,
            range: AnalysisRange::default(),
        }),
        (ViewKind::FileAction, ExploreMode::Visualize) => Some(Request::VisualizationTypes),
        (ViewKind::Refinement, ExploreMode::Visualize) => Some(Request::Columns {
            file: get(P_FILE)?,
        }),
        (ViewKind::Result, ExploreMode::Analyze) => Some(Request::Analyze {
            file: get(P_FILE)?,
            range: AnalysisRange {
                start_time: get(P_START),
                end_time: get(P_END),
            },
        }),
        (ViewKind::Result, ExploreMode::Visualize) => Some(Request::Visualize {
            file: get(P_FILE)?,
            plot_type: get(P_PLOT)?,
            columns: match params.get(P_COLUMNS) {
                Some(encoded) => Some(serde_json::from_str(encoded).ok()?),
                None => None,
            },
        }),
        _ => None,
    }
}

/// What a frame currently shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    Loading,
    Files(Vec<FileDescriptor>),
    Analysis(String),
    PlotTypes(Vec<VisualizationType>),
    Columns {
        columns: Vec<String>,
        selected: Vec<bool>,
    },
    Plots {
        regular: String,
        normalized: String,
    },
    /// Inline failure; the stack stays intact
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub view: ViewKind,
    params: Params,
    pub content: Content,
}

impl Frame {
    pub fn new(view: ViewKind, params: Params) -> Self {
        Self {
            view,
            params,
            content: Content::Loading,
        }
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    pub fn mode(&self) -> Option<ExploreMode> {
        self.param(P_MODE).and_then(ExploreMode::from_str)
    }

    pub fn request(&self) -> Option<Request> {
        request_for(self.view, &self.params)
    }

    pub fn is_ready(&self) -> bool {
        !matches!(self.content, Content::Loading | Content::Error(_))
    }

    pub fn title(&self) -> String {
        let mode = self.param(P_MODE).unwrap_or("explore");
        let file = self.param(P_FILE);
        match (self.view, file) {
            (ViewKind::FileList, _) => format!("Select a file to {}", mode),
            (ViewKind::FileAction, Some(f)) if mode == "analyze" => format!("Analysis: {}", f),
            (ViewKind::FileAction, Some(f)) => format!("Visualize: {}", f),
            (ViewKind::Refinement, Some(f)) => format!("Select parameters: {}", f),
            (ViewKind::Result, Some(f)) => match (self.param(P_START), self.param(P_END)) {
                (None, None) => format!("Result: {}", f),
                (start, end) => format!(
                    "Result: {} [{} .. {}]",
                    f,
                    start.unwrap_or("start"),
                    end.unwrap_or("end")
                ),
            },
            (_, None) => mode.to_string(),
        }
    }

    /// Number of entries a cursor can move over
    pub fn selectable_len(&self) -> usize {
        match &self.content {
            Content::Files(files) => files.len(),
            Content::PlotTypes(types) => types.len(),
            Content::Columns { columns, .. } => columns.len(),
            _ => 0,
        }
    }

    /// Display lines; pure and side-effect free
    pub fn render(&self) -> Vec<String> {
        match &self.content {
            Content::Loading => vec!["Loading...".to_string()],
            Content::Error(message) => vec![format!("Error: {}", message)],
            Content::Files(files) if files.is_empty() => vec!["No files found".to_string()],
            Content::Files(files) => files
                .iter()
                .map(|f| format!("{:<40} {}", f.name, f.created_label()))
                .collect(),
            Content::Analysis(text) => text.lines().map(str::to_string).collect(),
            Content::PlotTypes(types) => types.iter().map(|t| t.name.clone()).collect(),
            Content::Columns { columns, selected } => columns
                .iter()
                .zip(selected)
                .map(|(c, on)| format!("[{}] {}", if *on { "x" } else { " " }, c))
                .collect(),
            Content::Plots {
                regular,
                normalized,
            } => vec![
                format!("Regular plot:    {}", regular),
                format!("Normalized plot: {}", normalized),
            ],
        }
    }
}

/// Column selections are kept as a JSON array; CSV headers may contain commas
pub fn encode_columns(columns: &[&str]) -> String {
    serde_json::to_string(columns).unwrap_or_default()
}

/// Params builder
pub fn params(pairs: &[(&str, &str)]) -> Params {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}
