//! Unified error handling for the clustering engine.
//!
//! Every fallible operation returns [`Result`]. All variants are fatal for
//! the run that produced them: the rewrite driver aborts instead of leaving
//! partial output behind.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors produced while loading, clustering, or rewriting observations.
#[derive(Debug, Error)]
pub enum ClusterError {
    /// A line of an observation file could not be decoded.
    #[error("{}:{line}: {message}", path.display())]
    Parse {
        path: PathBuf,
        /// 1-based line number
        line: usize,
        message: String,
    },

    /// Inputs and outputs don't line up, or a config value is unusable.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// A file could not be opened, read, written, or persisted.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Strict mode only: some clusters hit the refinement iteration bound.
    #[error("{clusters} cluster(s) did not converge within {max_iterations} iterations")]
    NonConvergence { clusters: usize, max_iterations: u32 },
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ClusterError>;

impl ClusterError {
    pub(crate) fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        ClusterError::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub(crate) fn parse(path: impl AsRef<Path>, line: usize, message: impl Into<String>) -> Self {
        ClusterError::Parse {
            path: path.as_ref().to_path_buf(),
            line,
            message: message.into(),
        }
    }

    /// Returns the offending line for parse errors.
    pub fn line(&self) -> Option<usize> {
        match self {
            ClusterError::Parse { line, .. } => Some(*line),
            _ => None,
        }
    }
}

/// Converts a missing piece of an observation line into a parse error.
pub trait OptionExt<T> {
    fn ok_or_parse(self, path: &Path, line: usize, message: &str) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_parse(self, path: &Path, line: usize, message: &str) -> Result<T> {
        self.ok_or_else(|| ClusterError::parse(path, line, message))
    }
}
