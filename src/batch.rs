//! Sequential per-pair driver: match, plan, process, verify.

use tracing::{error, info, warn};

use crate::analyzer;
use crate::config::MatchConfig;
use crate::error::{ConfigError, PairError};
use crate::models::{AdjustmentPlan, BatchSummary, FilePair, PairOutcome, PairStatus, SilentSide};
use crate::pairing;
use crate::planner;
use crate::processor::DynamicsProcessor;
use crate::verify;

pub struct BatchDriver<P> {
    config: MatchConfig,
    processor: P,
}

impl<P: DynamicsProcessor> BatchDriver<P> {
    /// Validate `config` up front; an invalid configuration aborts before any file is read.
    pub fn new(config: MatchConfig, processor: P) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config, processor })
    }

    /// Process every discovered target file, one at a time.
    ///
    /// Per-pair failures are logged and recorded; they never stop the batch.
    pub fn run(&self) -> BatchSummary {
        let pairs = pairing::discover_pairs(&self.config);
        let total = pairs.len();
        info!(
            total,
            target_dir = %self.config.target_dir.display(),
            "Starting loudness matching"
        );

        let mut summary = BatchSummary::default();
        for (i, pair) in pairs.into_iter().enumerate() {
            let name = pair.file_name();
            info!("[{}/{}] Matching: {}", i + 1, total, name);

            let status = if !pair.source_path.is_file() || !pair.target_path.is_file() {
                warn!(
                    file = %name,
                    source = %pair.source_path.display(),
                    "Missing matching file, skipping"
                );
                PairStatus::SkippedMissingPair
            } else {
                match self.process_pair(&pair) {
                    Ok(status) => status,
                    Err(e) => {
                        error!(file = %name, error = %e, "Failed to process pair");
                        PairStatus::Failed(e.to_string())
                    }
                }
            };

            summary.outcomes.push(PairOutcome { pair, status });
        }

        summary
    }

    fn process_pair(&self, pair: &FilePair) -> Result<PairStatus, PairError> {
        let name = pair.file_name();
        let source = analyzer::measure(&pair.source_path)?;
        let target = analyzer::measure(&pair.target_path)?;

        if let Some(parent) = pair.output_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let plan = planner::plan(
            &source,
            &target,
            self.config.tolerance_db,
            self.config.peak_limit_db,
        );

        match plan {
            AdjustmentPlan::Bypass => {
                info!(
                    file = %name,
                    rms_difference_db = source.rms_db - target.rms_db,
                    "Within tolerance, copying without processing"
                );
                copy_target(pair)?;
                Ok(PairStatus::Bypassed)
            }
            AdjustmentPlan::Passthrough(side) => {
                let which = match side {
                    SilentSide::Source => "source",
                    SilentSide::Target => "target",
                };
                warn!(file = %name, "The {} is digital silence, copying target unmodified", which);
                copy_target(pair)?;
                Ok(PairStatus::Passthrough(side))
            }
            AdjustmentPlan::Adjust(adjustment) => {
                info!(
                    file = %name,
                    gain_db = adjustment.gain_db,
                    threshold_db = adjustment.threshold_db,
                    ratio = adjustment.ratio,
                    peak_limit_db = adjustment.peak_limit_db,
                    "Applying compression, gain, and peak limiting"
                );
                let verification = verify::apply_with_verification(
                    &self.processor,
                    pair,
                    &source,
                    &target,
                    &adjustment,
                    self.config.tolerance_db,
                )?;
                info!(
                    file = %name,
                    output_rms_db = verification.row.output_rms_db,
                    rms_difference_db = verification.row.rms_difference_db,
                    attempts = verification.attempts,
                    "Processed"
                );
                Ok(PairStatus::Processed {
                    attempts: verification.attempts,
                })
            }
        }
    }
}

fn copy_target(pair: &FilePair) -> Result<(), PairError> {
    std::fs::copy(&pair.target_path, &pair.output_path)
        .map(|_| ())
        .map_err(|source| PairError::Copy {
            from: pair.target_path.clone(),
            to: pair.output_path.clone(),
            source,
        })
}
