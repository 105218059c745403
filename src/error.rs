//! Error types for the evaluation pipelines.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our custom error.
pub type Result<T> = std::result::Result<T, EvalError>;

/// Errors that can occur while answering or scoring a benchmark.
#[derive(Error, Debug)]
pub enum EvalError {
    /// Error reading or writing files.
    #[error("I/O error for path '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The dataset file is missing or malformed.
    #[error("Invalid dataset '{path}': {reason}")]
    DatasetFormat { path: PathBuf, reason: String },

    /// A previously written result file could not be parsed.
    #[error("Corrupt result file '{path}': {reason}")]
    ResultStoreCorrupt { path: PathBuf, reason: String },

    /// An episode directory is missing or holds no frames.
    #[error("Episode not found or empty at '{0}'")]
    EpisodeNotFound(PathBuf),

    /// A frame image could not be decoded or encoded.
    #[error("Failed to decode frame '{path}': {reason}")]
    FrameDecode { path: PathBuf, reason: String },

    /// The model or API call failed.
    #[error("Model call failed: {0}")]
    AdapterCall(String),

    /// The judge output did not contain a usable mark.
    #[error("Invalid output string: {0}")]
    ScoreParse(String),

    /// HTTP request error.
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// Error during serialization/deserialization.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl EvalError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether tolerant (`--force`) mode may record this failure as a
    /// sentinel result instead of aborting the run.
    ///
    /// Score parsing failures are never tolerable: a defaulted mark would
    /// silently skew the aggregate.
    pub fn is_tolerable(&self) -> bool {
        matches!(
            self,
            EvalError::FrameDecode { .. } | EvalError::AdapterCall(_) | EvalError::Http(_)
        )
    }
}

impl From<reqwest::Error> for EvalError {
    fn from(err: reqwest::Error) -> Self {
        EvalError::Http(err.to_string())
    }
}

impl From<serde_json::Error> for EvalError {
    fn from(err: serde_json::Error) -> Self {
        EvalError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tolerable_variants() {
        assert!(EvalError::AdapterCall("boom".into()).is_tolerable());
        assert!(EvalError::Http("timeout".into()).is_tolerable());
        assert!(
            EvalError::FrameDecode {
                path: PathBuf::from("f.png"),
                reason: "truncated".into()
            }
            .is_tolerable()
        );
    }

    #[test]
    fn test_fatal_variants() {
        assert!(!EvalError::ScoreParse("no marker here".into()).is_tolerable());
        assert!(!EvalError::Config("missing key".into()).is_tolerable());
        assert!(!EvalError::EpisodeNotFound(PathBuf::from("ep")).is_tolerable());
    }

    #[test]
    fn test_score_parse_message() {
        let err = EvalError::ScoreParse("hello".into());
        assert_eq!(err.to_string(), "Invalid output string: hello");
    }
}
