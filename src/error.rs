use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Everything that can abort a run. `Config` and `Geometry` errors are
/// detected before any simulation work; `TraceFormat` carries the 1-based
/// line number of the offending trace line.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("cannot open {}: {source}", path.display())]
    Config { path: PathBuf, source: io::Error },

    #[error("cannot write {}: {source}", path.display())]
    Output { path: PathBuf, source: io::Error },

    #[error("invalid cache geometry: {0}")]
    Geometry(String),

    #[error("trace line {line}: {reason}")]
    TraceFormat { line: usize, reason: String },
}

impl SimError {
    pub fn geometry(reason: impl Into<String>) -> Self {
        SimError::Geometry(reason.into())
    }

    pub fn trace(line: usize, reason: impl Into<String>) -> Self {
        SimError::TraceFormat {
            line,
            reason: reason.into(),
        }
    }
}
