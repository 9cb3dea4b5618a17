use std::path::{Path, PathBuf};
use thiserror::Error;

/// Top-level error type for the dotlink crate.
///
/// Every error is fatal to the run: the pipeline either produces a fully
/// transformed graph or nothing.
#[derive(Debug, Error)]
pub enum LinkError {
    #[error("DOT parse error: {0}")]
    DotParse(String),
    #[error("invalid graph: {0}")]
    InvalidGraph(String),
    #[error("config error: {0}")]
    Config(String),
    #[error("invalid pattern '{pattern}': {message}")]
    Pattern { pattern: String, message: String },
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("pass {index} ({name}) failed: {source}")]
    Pass {
        index: usize,
        name: String,
        #[source]
        source: Box<LinkError>,
    },
}

impl LinkError {
    pub fn pattern(pattern: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Pattern {
            pattern: pattern.into(),
            message: message.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn config_at(path: &Path, line: usize, message: impl Into<String>) -> Self {
        Self::Config(format!(
            "{} line {}: {}",
            path.display(),
            line,
            message.into()
        ))
    }

    pub(crate) fn in_pass(self, index: usize, name: &str) -> Self {
        Self::Pass {
            index,
            name: name.to_string(),
            source: Box::new(self),
        }
    }
}
