use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// RMS and peak level of a whole file, in dBFS. Either may be `-inf`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoudnessMeasurement {
    #[serde(with = "db_value")]
    pub rms_db: f64,
    #[serde(with = "db_value")]
    pub peak_db: f64,
}

impl LoudnessMeasurement {
    pub fn is_silent(&self) -> bool {
        self.rms_db == f64::NEG_INFINITY
    }
}

/// A target file together with the source it must match and where the result goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePair {
    pub source_path: PathBuf,
    pub target_path: PathBuf,
    pub output_path: PathBuf,
}

impl FilePair {
    /// File name of the output, used as the report key.
    pub fn file_name(&self) -> String {
        self.output_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.output_path.display().to_string())
    }
}

/// Parameters for one pass of the compressor → gain → limiter chain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Adjustment {
    pub gain_db: f64,
    pub threshold_db: f64,
    pub ratio: f64,
    pub peak_limit_db: f64,
}

/// Which side of a pair is digital silence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SilentSide {
    Source,
    Target,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AdjustmentPlan {
    /// Already within tolerance: copy the target verbatim.
    Bypass,
    /// Run the dynamics chain with these parameters.
    Adjust(Adjustment),
    /// One side is silent so no finite gain exists; copy the target unmodified.
    Passthrough(SilentSide),
}

/// One line of the loudness report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    pub file_name: String,
    #[serde(with = "db_value")]
    pub source_rms_db: f64,
    #[serde(with = "db_value")]
    pub source_peak_db: f64,
    #[serde(default, with = "opt_db_value")]
    pub target_rms_db: Option<f64>,
    #[serde(default, with = "opt_db_value")]
    pub target_peak_db: Option<f64>,
    #[serde(with = "db_value")]
    pub output_rms_db: f64,
    #[serde(with = "db_value")]
    pub output_peak_db: f64,
    #[serde(with = "db_value")]
    pub rms_difference_db: f64,
}

impl ReportRow {
    pub fn new(
        file_name: String,
        source: LoudnessMeasurement,
        target: Option<LoudnessMeasurement>,
        output: LoudnessMeasurement,
    ) -> Self {
        Self {
            file_name,
            source_rms_db: source.rms_db,
            source_peak_db: source.peak_db,
            target_rms_db: target.map(|t| t.rms_db),
            target_peak_db: target.map(|t| t.peak_db),
            output_rms_db: output.rms_db,
            output_peak_db: output.peak_db,
            rms_difference_db: source.rms_db - output.rms_db,
        }
    }
}

/// Terminal state of one discovered target file.
#[derive(Debug, Clone, PartialEq)]
pub enum PairStatus {
    Bypassed,
    Passthrough(SilentSide),
    Processed { attempts: usize },
    SkippedMissingPair,
    Failed(String),
}

impl PairStatus {
    /// Whether this pair left a file in the output directory.
    pub fn produced_output(&self) -> bool {
        matches!(
            self,
            PairStatus::Bypassed | PairStatus::Passthrough(_) | PairStatus::Processed { .. }
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PairOutcome {
    pub pair: FilePair,
    pub status: PairStatus,
}

/// Everything the batch driver did in one run, in visiting order.
#[derive(Debug, Clone, Default)]
pub struct BatchSummary {
    pub outcomes: Vec<PairOutcome>,
}

impl BatchSummary {
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    fn count(&self, pred: impl Fn(&PairStatus) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(&o.status)).count()
    }

    pub fn processed(&self) -> usize {
        self.count(|s| matches!(s, PairStatus::Processed { .. }))
    }

    pub fn bypassed(&self) -> usize {
        self.count(|s| matches!(s, PairStatus::Bypassed))
    }

    pub fn passthrough(&self) -> usize {
        self.count(|s| matches!(s, PairStatus::Passthrough(_)))
    }

    pub fn skipped(&self) -> usize {
        self.count(|s| matches!(s, PairStatus::SkippedMissingPair))
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, PairStatus::Failed(_)))
    }

    /// Pairs whose output file should exist, for the report compiler.
    pub fn produced_pairs(&self) -> Vec<FilePair> {
        self.outcomes
            .iter()
            .filter(|o| o.status.produced_output())
            .map(|o| o.pair.clone())
            .collect()
    }
}

/// Audio stream properties read from the container header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioInfo {
    pub sample_rate: u32,
    pub bits_per_sample: Option<u32>,
    pub channels: usize,
    pub frames: Option<u64>,
    pub duration_secs: f64,
}

/// One file found by the inventory scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryEntry {
    pub file_name: String,
    pub counterpart_name: String,
    pub short_name: String,
    pub folder: String,
    pub duration_secs: f64,
    pub bits_per_sample: Option<u32>,
    pub sample_rate: u32,
}

/// JSON has no infinity, so non-finite levels are written as `"-inf"` / `"inf"`.
pub(crate) mod db_value {
    use serde::de::{self, Deserializer, Visitor};
    use serde::Serializer;
    use std::fmt;

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_finite() {
            serializer.serialize_f64(*value)
        } else if *value < 0.0 {
            serializer.serialize_str("-inf")
        } else {
            serializer.serialize_str("inf")
        }
    }

    struct DbVisitor;

    impl<'de> Visitor<'de> for DbVisitor {
        type Value = f64;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a dB value or \"-inf\"")
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<f64, E> {
            Ok(v)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<f64, E> {
            Ok(v as f64)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<f64, E> {
            Ok(v as f64)
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<f64, E> {
            match v {
                "-inf" => Ok(f64::NEG_INFINITY),
                "inf" => Ok(f64::INFINITY),
                other => other.parse().map_err(E::custom),
            }
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        deserializer.deserialize_any(DbVisitor)
    }
}

pub(crate) mod opt_db_value {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(v) => super::db_value::serialize(v, serializer),
            None => serializer.serialize_none(),
        }
    }

    #[derive(Deserialize)]
    struct Wrapper(#[serde(with = "super::db_value")] f64);

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<f64>, D::Error> {
        Ok(Option::<Wrapper>::deserialize(deserializer)?.map(|w| w.0))
    }
}
