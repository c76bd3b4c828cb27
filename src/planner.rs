//! Decides whether a target needs processing and with which parameters.

use crate::models::{Adjustment, AdjustmentPlan, LoudnessMeasurement, SilentSide};

/// Valid compressor threshold range, in dB.
pub const MIN_THRESHOLD_DB: f64 = -40.0;
pub const MAX_THRESHOLD_DB: f64 = 0.0;

/// Compressor ratio used when the target must be raised.
pub const HEAVY_RATIO: f64 = 20.0;
/// Compressor ratio used when the target only needs attenuation.
pub const UNITY_RATIO: f64 = 1.0;
/// Fixed threshold for the attenuation branch.
pub const ATTENUATION_THRESHOLD_DB: f64 = -1.0;
/// Headroom below the inverted gain where compression starts.
const THRESHOLD_HEADROOM_DB: f64 = 2.0;

pub fn clamp_threshold(threshold_db: f64) -> f64 {
    threshold_db.clamp(MIN_THRESHOLD_DB, MAX_THRESHOLD_DB)
}

/// Choose how to bring `target` to the loudness of `source`.
///
/// The bypass comparison is inclusive: a difference of exactly
/// `tolerance_db` in either direction needs no processing.
pub fn plan(
    source: &LoudnessMeasurement,
    target: &LoudnessMeasurement,
    tolerance_db: f64,
    peak_limit_db: f64,
) -> AdjustmentPlan {
    match (source.is_silent(), target.is_silent()) {
        (true, true) => return AdjustmentPlan::Bypass,
        (true, false) => return AdjustmentPlan::Passthrough(SilentSide::Source),
        (false, true) => return AdjustmentPlan::Passthrough(SilentSide::Target),
        (false, false) => {}
    }

    let difference = source.rms_db - target.rms_db;

    if difference.abs() <= tolerance_db {
        return AdjustmentPlan::Bypass;
    }

    if difference < 0.0 {
        // Target is too loud: gain and limiter only, compressor at unity
        AdjustmentPlan::Adjust(Adjustment {
            gain_db: difference,
            threshold_db: ATTENUATION_THRESHOLD_DB,
            ratio: UNITY_RATIO,
            peak_limit_db,
        })
    } else {
        AdjustmentPlan::Adjust(Adjustment {
            gain_db: difference,
            threshold_db: clamp_threshold(-difference - THRESHOLD_HEADROOM_DB),
            ratio: HEAVY_RATIO,
            peak_limit_db,
        })
    }
}

/// Corrective pass applied to the first-pass output when it missed the source level.
pub fn retry(previous: &Adjustment, residual_db: f64) -> Adjustment {
    Adjustment {
        gain_db: residual_db,
        threshold_db: clamp_threshold(-residual_db),
        ratio: previous.ratio,
        peak_limit_db: previous.peak_limit_db,
    }
}
