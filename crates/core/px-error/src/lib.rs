//! Error types and classification for prefix-export.
//!
//! This crate provides:
//! - [`ExportError`] - Top-level error enum for discovery, listing and export errors
//! - [`ErrorKind`] for deciding whether an error ends the run, the job, or nothing
//! - A [`Result`] alias used across the workspace

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for prefix-export.
#[derive(Error, Debug)]
pub enum ExportError {
    /// Missing or invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// The object store could not enumerate a prefix
    #[error("Listing error: {0}")]
    Listing(String),

    /// An output target could not be created, written or closed
    #[error("Output target error for {}: {source}", path.display())]
    OutputTarget {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Unknown output format or a record that cannot be rendered/parsed
    #[error("Format error: {0}")]
    Format(String),

    /// The job queue has no receivers left
    #[error("Queue error: {0}")]
    Queue(String),

    /// Generic errors (wrapped anyhow)
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ExportError {
    /// Build an [`ExportError::OutputTarget`] for the given path.
    pub fn output_target(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::OutputTarget {
            path: path.into(),
            source,
        }
    }

    /// Classify the error by how far its effect reaches.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(_) | Self::Format(_) | Self::Queue(_) | Self::Other(_) => {
                ErrorKind::RunFatal
            }
            Self::OutputTarget { .. } => ErrorKind::JobFatal,
            Self::Listing(_) => ErrorKind::Degraded,
        }
    }
}

/// Reach of an error.
///
/// Discovery and listing errors degrade the output, output-target errors end a
/// single job, everything detected at startup ends the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Abort the whole run
    RunFatal,

    /// Abort the current job; sibling jobs continue
    JobFatal,

    /// Log and continue with partial results
    Degraded,
}

/// Result type alias using ExportError.
pub type Result<T> = std::result::Result<T, ExportError>;
