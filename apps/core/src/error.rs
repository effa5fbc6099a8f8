use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::config_state::ReadinessState;

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("failed to launch query tool {}: {source}", .executor.display())]
    Spawn {
        executor: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("query tool exited with {status}: {stderr}")]
    ExitStatus { status: String, stderr: String },

    #[error("query tool timed out after {0:?}")]
    Timeout(Duration),

    #[error("query tool output exceeded {0} bytes")]
    BufferExceeded(usize),

    #[error("query cancelled")]
    Cancelled,

    #[error("scratch copy failed: {0}")]
    Scratch(#[source] std::io::Error),

    #[error("query tool io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("failed to parse {what}: {message}")]
    ParseFailure { what: String, message: String },

    #[error(transparent)]
    ProcessFailure(#[from] QueryError),

    #[error("configured path does not exist: {}", .0.display())]
    ConfigInvalid(PathBuf),

    #[error("source `{id}` is not ready for extraction ({state:?})")]
    NotReady { id: String, state: ReadinessState },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl SourceError {
    pub fn parse(what: &str, message: impl ToString) -> Self {
        Self::ParseFailure {
            what: what.to_string(),
            message: message.to_string(),
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::SourceUnavailable(message.into())
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::ProcessFailure(QueryError::Cancelled))
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(value: serde_json::Error) -> Self {
        Self::parse("json", value)
    }
}

impl From<quick_xml::Error> for SourceError {
    fn from(value: quick_xml::Error) -> Self {
        Self::parse("xml", value)
    }
}
