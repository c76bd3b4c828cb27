//! External dynamics processing (compressor → gain → limiter).

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::debug;

use crate::error::ProcessorError;
use crate::models::Adjustment;

/// Compressor attack, in milliseconds.
pub const ATTACK_MS: u32 = 5;
/// Compressor release, in milliseconds.
pub const RELEASE_MS: u32 = 50;
/// Codec every processed output is written with.
pub const OUTPUT_CODEC: &str = "pcm_s24le";

/// Something that can render `input` through the dynamics chain into `output`.
pub trait DynamicsProcessor {
    /// Overwrites `output` if it exists. On error no output file is left behind.
    fn process(&self, input: &Path, output: &Path, adjustment: &Adjustment)
        -> Result<(), ProcessorError>;
}

impl<T: DynamicsProcessor + ?Sized> DynamicsProcessor for &T {
    fn process(&self, input: &Path, output: &Path, adjustment: &Adjustment) -> Result<(), ProcessorError> {
        (**self).process(input, output, adjustment)
    }
}

/// Linear output ceiling for a limit given in dBFS.
pub fn limiter_level(peak_limit_db: f64) -> f64 {
    10f64.powf(peak_limit_db / 20.0)
}

/// The ffmpeg filter graph for one adjustment.
pub fn filter_chain(adjustment: &Adjustment) -> String {
    format!(
        "acompressor=threshold={}dB:ratio={}:attack={}:release={}, \
         volume={}dB, \
         alimiter=level_in=1:level_out={}:limit=1",
        adjustment.threshold_db,
        adjustment.ratio,
        ATTACK_MS,
        RELEASE_MS,
        adjustment.gain_db,
        limiter_level(adjustment.peak_limit_db),
    )
}

/// Runs the chain through an `ffmpeg` binary, one process per call.
#[derive(Debug, Clone)]
pub struct FfmpegProcessor {
    program: PathBuf,
    timeout: Option<Duration>,
}

impl FfmpegProcessor {
    pub fn new(program: impl Into<PathBuf>, timeout: Option<Duration>) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    fn program_name(&self) -> String {
        self.program.display().to_string()
    }

    fn command(&self, input: &Path, output: &Path, adjustment: &Adjustment) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(["-hide_banner", "-nostdin", "-loglevel", "error", "-y", "-i"])
            .arg(input)
            .arg("-filter_complex")
            .arg(filter_chain(adjustment))
            .arg("-c:a")
            .arg(OUTPUT_CODEC)
            .arg(output)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    /// Blocks on a private current-thread runtime so callers stay synchronous.
    fn run(&self, input: &Path, output: &Path, adjustment: &Adjustment) -> Result<(), ProcessorError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        runtime.block_on(self.run_async(input, output, adjustment))
    }

    async fn run_async(
        &self,
        input: &Path,
        output: &Path,
        adjustment: &Adjustment,
    ) -> Result<(), ProcessorError> {
        let child = self
            .command(input, output, adjustment)
            .spawn()
            .map_err(|source| ProcessorError::Spawn {
                program: self.program_name(),
                source,
            })?;

        // The deadline covers the stderr capture too; dropping the child kills it
        let finished = match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, child.wait_with_output())
                .await
                .map_err(|_| ProcessorError::TimedOut {
                    program: self.program_name(),
                    timeout,
                })??,
            None => child.wait_with_output().await?,
        };

        if !finished.status.success() {
            return Err(ProcessorError::Failed {
                program: self.program_name(),
                status: finished.status,
                stderr: String::from_utf8_lossy(&finished.stderr).trim().to_string(),
            });
        }

        Ok(())
    }
}

impl DynamicsProcessor for FfmpegProcessor {
    fn process(&self, input: &Path, output: &Path, adjustment: &Adjustment) -> Result<(), ProcessorError> {
        debug!(
            input = %input.display(),
            output = %output.display(),
            chain = %filter_chain(adjustment),
            "Invoking ffmpeg"
        );
        let result = self.run(input, output, adjustment);
        if result.is_err() && output.exists() {
            let _ = std::fs::remove_file(output);
        }
        result
    }
}
