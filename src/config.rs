use std::path::PathBuf;

use crate::error::ConfigError;

pub const DEFAULT_SOURCE_SUFFIX: &str = "_ENG.wav";
pub const DEFAULT_TARGET_SUFFIX: &str = "_ITA.wav";
pub const DEFAULT_TOLERANCE_DB: f64 = 2.0;
pub const DEFAULT_PEAK_LIMIT_DB: f64 = -0.5;
/// Lowest ceiling the limiter can produce (linear 1/64).
pub const MIN_PEAK_LIMIT_DB: f64 = -36.123_599_479_677_74;
pub const DEFAULT_REPORT_FILENAME: &str = "loudness_report.csv";

/// Everything a matching run needs, fixed before the first file is touched.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchConfig {
    pub source_dir: PathBuf,
    pub target_dir: PathBuf,
    pub output_dir: PathBuf,
    pub source_suffix: String,
    pub target_suffix: String,
    pub tolerance_db: f64,
    pub peak_limit_db: f64,
    /// Descend into subdirectories of the target directory, mirroring them.
    pub recursive: bool,
}

impl MatchConfig {
    pub fn new(
        source_dir: impl Into<PathBuf>,
        target_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            source_dir: source_dir.into(),
            target_dir: target_dir.into(),
            output_dir: output_dir.into(),
            source_suffix: DEFAULT_SOURCE_SUFFIX.to_string(),
            target_suffix: DEFAULT_TARGET_SUFFIX.to_string(),
            tolerance_db: DEFAULT_TOLERANCE_DB,
            peak_limit_db: DEFAULT_PEAK_LIMIT_DB,
            recursive: false,
        }
    }

    pub fn default_report_path(&self) -> PathBuf {
        self.output_dir.join(DEFAULT_REPORT_FILENAME)
    }

    /// Check the configuration and create the output directory.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (role, dir) in [("Source", &self.source_dir), ("Target", &self.target_dir)] {
            if !dir.is_dir() {
                return Err(ConfigError::NotADirectory {
                    role,
                    path: dir.clone(),
                });
            }
        }

        validate_suffix("Source", &self.source_suffix)?;
        validate_suffix("Target", &self.target_suffix)?;

        if !self.tolerance_db.is_finite() || self.tolerance_db < 0.0 {
            return Err(ConfigError::InvalidTolerance(self.tolerance_db));
        }
        if !(MIN_PEAK_LIMIT_DB..=0.0).contains(&self.peak_limit_db) {
            return Err(ConfigError::InvalidPeakLimit(self.peak_limit_db));
        }

        if self.output_dir.exists() && self.output_dir.is_file() {
            return Err(ConfigError::NotADirectory {
                role: "Output",
                path: self.output_dir.clone(),
            });
        }
        if same_dir(&self.output_dir, &self.target_dir) {
            return Err(ConfigError::OutputIsTarget(self.output_dir.clone()));
        }

        std::fs::create_dir_all(&self.output_dir).map_err(|source| ConfigError::CreateOutput {
            path: self.output_dir.clone(),
            source,
        })
    }
}

fn validate_suffix(role: &'static str, suffix: &str) -> Result<(), ConfigError> {
    if suffix.is_empty() {
        return Err(ConfigError::InvalidSuffix {
            role,
            reason: "must not be empty",
        });
    }
    if suffix.contains('/') || suffix.contains('\\') {
        return Err(ConfigError::InvalidSuffix {
            role,
            reason: "must not contain path separators",
        });
    }
    Ok(())
}

fn same_dir(a: &std::path::Path, b: &std::path::Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}
