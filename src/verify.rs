//! Process, re-measure, and correct once if the result missed the source level.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::analyzer;
use crate::error::PairError;
use crate::models::{Adjustment, FilePair, LoudnessMeasurement, ReportRow};
use crate::planner;
use crate::processor::DynamicsProcessor;

/// Upper bound on processor invocations for a single pair.
pub const MAX_ATTEMPTS: usize = 2;

#[derive(Debug, Clone, PartialEq)]
pub struct Verification {
    pub row: ReportRow,
    pub attempts: usize,
}

/// Sibling path the first-pass output is moved to while the corrective pass runs.
fn first_pass_path(output: &Path) -> PathBuf {
    let mut name = output
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".first-pass.wav");
    output.with_file_name(name)
}

/// Run the dynamics chain on `pair` and verify the output against `source`.
///
/// When the residual `source.rms_db - output.rms_db` is outside the tolerance,
/// exactly one corrective pass runs on the first-pass output. No further
/// attempts are made whatever the second residual is.
pub fn apply_with_verification(
    processor: &dyn DynamicsProcessor,
    pair: &FilePair,
    source: &LoudnessMeasurement,
    target: &LoudnessMeasurement,
    adjustment: &Adjustment,
    tolerance_db: f64,
) -> Result<Verification, PairError> {
    processor.process(&pair.target_path, &pair.output_path, adjustment)?;

    let result = verify_and_correct(processor, pair, source, target, adjustment, tolerance_db);
    if result.is_err() {
        // A failed pair leaves nothing in the output directory
        let _ = std::fs::remove_file(first_pass_path(&pair.output_path));
        let _ = std::fs::remove_file(&pair.output_path);
    }
    result
}

fn verify_and_correct(
    processor: &dyn DynamicsProcessor,
    pair: &FilePair,
    source: &LoudnessMeasurement,
    target: &LoudnessMeasurement,
    adjustment: &Adjustment,
    tolerance_db: f64,
) -> Result<Verification, PairError> {
    let mut attempts = 1;
    let mut output = analyzer::measure(&pair.output_path)?;

    let residual = source.rms_db - output.rms_db;
    if residual.abs() > tolerance_db && residual.is_finite() {
        info!(
            file = %pair.file_name(),
            residual_db = residual,
            "Output missed source level, reprocessing once"
        );
        let corrective = planner::retry(adjustment, residual);
        let first_pass = first_pass_path(&pair.output_path);
        std::fs::rename(&pair.output_path, &first_pass)?;

        let result = processor.process(&first_pass, &pair.output_path, &corrective);
        let _ = std::fs::remove_file(&first_pass);
        result?;

        attempts += 1;
        output = analyzer::measure(&pair.output_path)?;
    }
    debug_assert!(attempts <= MAX_ATTEMPTS);

    Ok(Verification {
        row: ReportRow::new(pair.file_name(), *source, Some(*target), output),
        attempts,
    })
}
