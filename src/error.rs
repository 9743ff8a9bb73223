use std::path::PathBuf;
use thiserror::Error;

/// Failures while reading an input document.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("File not found: {0:?}")]
    FileNotFound(PathBuf),

    #[error("Failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path:?}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("{path:?} is missing required columns: {}", .columns.join(", "))]
    MissingColumns { path: PathBuf, columns: Vec<String> },
}

impl LoadError {
    pub(crate) fn parse(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        LoadError::Parse {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

/// Failures that stop the pipeline.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Loading stakeholders failed: {0}")]
    Load(#[from] LoadError),

    #[error("Writing {path:?} failed: {source}")]
    Export {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV export error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Template rendering failed: {0}")]
    Template(#[from] askama::Error),
}

pub type PipelineResult<T> = Result<T, PipelineError>;

/// Why the optional route could not be drawn.
#[derive(Error, Debug)]
pub enum RouteError {
    #[error("no routing API key configured")]
    MissingApiKey,

    #[error("at least two stakeholders are needed for a route, found {0}")]
    NotEnoughStops(usize),

    #[error("routing request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("routing service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("unexpected routing response: {0}")]
    BadResponse(String),
}
