//! Error types for loudness matching

use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Duration;

use thiserror::Error;

/// A file could not be opened or decoded as audio.
#[derive(Error, Debug)]
#[error("Failed to decode {}: {message}", .path.display())]
pub struct DecodeError {
    pub path: PathBuf,
    pub message: String,
}

impl DecodeError {
    pub fn new(path: &std::path::Path, message: impl Into<String>) -> Self {
        Self {
            path: path.to_path_buf(),
            message: message.into(),
        }
    }
}

/// The external dynamics processor could not produce an output file.
#[derive(Error, Debug)]
pub enum ProcessorError {
    /// Binary missing or not executable
    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Process ran but exited unsuccessfully
    #[error("{program} exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: ExitStatus,
        stderr: String,
    },

    /// Process was killed after exceeding its time budget
    #[error("{program} timed out after {}s", .timeout.as_secs())]
    TimedOut { program: String, timeout: Duration },

    #[error("IO error while running processor: {0}")]
    Io(#[from] std::io::Error),
}

/// Invalid run configuration. Always fatal, raised before any file is touched.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{role} directory does not exist or is not a directory: {}", .path.display())]
    NotADirectory { role: &'static str, path: PathBuf },

    #[error("{role} suffix is invalid: {reason}")]
    InvalidSuffix {
        role: &'static str,
        reason: &'static str,
    },

    #[error("Output directory must differ from the target directory: {}", .0.display())]
    OutputIsTarget(PathBuf),

    #[error("Tolerance must be a finite, non-negative number of dB (got {0})")]
    InvalidTolerance(f64),

    #[error("Peak limit must lie between -36.12 and 0 dBFS (got {0})")]
    InvalidPeakLimit(f64),

    #[error("Failed to create output directory {}: {source}", .path.display())]
    CreateOutput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Anything that can go wrong while processing a single file pair.
///
/// Caught by the batch driver, logged, and recorded as a failed pair.
#[derive(Error, Debug)]
pub enum PairError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Processor(#[from] ProcessorError),

    #[error("Failed to copy {} to {}: {source}", .from.display(), .to.display())]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
