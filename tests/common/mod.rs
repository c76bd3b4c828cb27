#![allow(dead_code)]

use std::cell::Cell;
use std::path::{Path, PathBuf};

use loudmatch::error::ProcessorError;
use loudmatch::models::Adjustment;
use loudmatch::processor::DynamicsProcessor;

/// Generate a mono WAV holding a sine wave whose RMS level is `rms_db` dBFS.
pub fn generate_sine_wav(
    dir: &Path,
    filename: &str,
    frequency: f64,
    rms_db: f64,
    duration_secs: f64,
    sample_rate: u32,
    bits_per_sample: u16,
) -> PathBuf {
    // A sine's RMS sits 3.01 dB below its peak
    let amplitude = 10f64.powf((rms_db + 20.0 * 2f64.sqrt().log10()) / 20.0);
    let num_samples = (sample_rate as f64 * duration_secs) as usize;
    let samples: Vec<f64> = (0..num_samples)
        .map(|i| {
            let t = i as f64 / sample_rate as f64;
            amplitude * (2.0 * std::f64::consts::PI * frequency * t).sin()
        })
        .collect();
    write_wav(dir, filename, &samples, sample_rate, bits_per_sample)
}

/// Generate a mono WAV of digital silence.
pub fn generate_silence_wav(dir: &Path, filename: &str, duration_secs: f64) -> PathBuf {
    let samples = vec![0.0; (48000.0 * duration_secs) as usize];
    write_wav(dir, filename, &samples, 48000, 16)
}

/// Write normalized [-1, 1] samples as integer PCM.
pub fn write_wav(
    dir: &Path,
    filename: &str,
    samples: &[f64],
    sample_rate: u32,
    bits_per_sample: u16,
) -> PathBuf {
    let path = dir.join(filename);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample,
        sample_format: hound::SampleFormat::Int,
    };
    let full_scale = ((1i64 << (bits_per_sample - 1)) - 1) as f64;
    let mut writer = hound::WavWriter::create(&path, spec).unwrap();
    for &s in samples {
        let v = (s.clamp(-1.0, 1.0) * full_scale).round() as i32;
        match bits_per_sample {
            16 => writer.write_sample(v as i16).unwrap(),
            _ => writer.write_sample(v).unwrap(),
        }
    }
    writer.finalize().unwrap();
    path
}

/// Read an integer PCM WAV back as normalized samples.
pub fn read_wav(path: &Path) -> (Vec<f64>, u32) {
    let mut reader = hound::WavReader::open(path).unwrap();
    let spec = reader.spec();
    let full_scale = (1i64 << (spec.bits_per_sample - 1)) as f64;
    let samples = reader
        .samples::<i32>()
        .map(|s| s.unwrap() as f64 / full_scale)
        .collect();
    (samples, spec.sample_rate)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FakeBehavior {
    /// Apply the requested gain exactly, then clamp to the ceiling.
    Accurate,
    /// Apply only this fraction of the requested gain.
    Undershoot(f64),
    /// Ignore the parameters and pass the input through.
    Stuck,
    /// Fail as if the binary were missing.
    Unavailable,
    /// Report success but leave a file that is not audio.
    Garbage,
}

/// In-process stand-in for ffmpeg: gain plus a hard ceiling, written at 24-bit.
pub struct FakeProcessor {
    pub behavior: FakeBehavior,
    pub calls: Cell<usize>,
    pub inputs: std::cell::RefCell<Vec<PathBuf>>,
}

impl FakeProcessor {
    pub fn new(behavior: FakeBehavior) -> Self {
        Self {
            behavior,
            calls: Cell::new(0),
            inputs: Default::default(),
        }
    }
}

impl DynamicsProcessor for FakeProcessor {
    fn process(&self, input: &Path, output: &Path, adjustment: &Adjustment) -> Result<(), ProcessorError> {
        self.calls.set(self.calls.get() + 1);
        self.inputs.borrow_mut().push(input.to_path_buf());

        let gain_db = match self.behavior {
            FakeBehavior::Accurate => adjustment.gain_db,
            FakeBehavior::Undershoot(fraction) => adjustment.gain_db * fraction,
            FakeBehavior::Stuck => 0.0,
            FakeBehavior::Unavailable => {
                return Err(ProcessorError::Spawn {
                    program: "ffmpeg".to_string(),
                    source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
                })
            }
            FakeBehavior::Garbage => {
                std::fs::write(output, b"not audio").unwrap();
                return Ok(());
            }
        };

        let gain = 10f64.powf(gain_db / 20.0);
        let ceiling = 10f64.powf(adjustment.peak_limit_db / 20.0);
        let (samples, sample_rate) = read_wav(input);
        let processed: Vec<f64> = samples
            .iter()
            .map(|s| (s * gain).clamp(-ceiling, ceiling))
            .collect();

        let dir = output.parent().unwrap();
        let name = output.file_name().unwrap().to_str().unwrap();
        write_wav(dir, name, &processed, sample_rate, 24);
        Ok(())
    }
}

pub fn approx(a: f64, b: f64, tol: f64) -> bool {
    (a - b).abs() <= tol
}
