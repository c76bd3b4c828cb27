use std::fs::File;
use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{CodecParameters, DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::error::DecodeError;
use crate::models::{AudioInfo, LoudnessMeasurement};

const AUDIO_EXTENSIONS: &[&str] = &[
    "flac", "mp3", "wav", "ogg", "m4a", "opus", "wv", "aif", "aiff",
];

/// Full-scale magnitude used to normalize decoded samples into [-1, 1].
const FULL_SCALE: f64 = i32::MAX as f64;

/// Check if a path has a recognized audio file extension.
pub fn is_audio_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| AUDIO_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Convert a linear amplitude to dBFS.
pub fn db_fs(linear: f64) -> f64 {
    if linear <= 0.0 {
        -f64::INFINITY
    } else {
        20.0 * linear.log10()
    }
}

/// Running RMS/peak statistics over a flat sequence of samples.
///
/// Channels are not separated: interleaved frames are treated as one
/// sequence of values.
#[derive(Debug, Default)]
struct LevelAccumulator {
    sum_sq: f64,
    count: u64,
    peak: f64,
}

impl LevelAccumulator {
    fn push_samples(&mut self, samples: &[i32]) {
        for &s in samples {
            let v = s as f64 / FULL_SCALE;
            self.sum_sq += v * v;
            let abs_v = v.abs();
            if abs_v > self.peak {
                self.peak = abs_v;
            }
        }
        self.count += samples.len() as u64;
    }

    /// An empty stream measures as digital silence.
    fn finalize(self) -> LoudnessMeasurement {
        let rms = if self.count == 0 {
            0.0
        } else {
            (self.sum_sq / self.count as f64).sqrt()
        };
        LoudnessMeasurement {
            rms_db: db_fs(rms),
            peak_db: db_fs(self.peak),
        }
    }
}

/// Compute levels directly from 32-bit samples.
pub fn measure_samples(samples: &[i32]) -> LoudnessMeasurement {
    let mut acc = LevelAccumulator::default();
    acc.push_samples(samples);
    acc.finalize()
}

fn open_format(path: &Path) -> Result<Box<dyn FormatReader>, DecodeError> {
    let file = File::open(path).map_err(|e| DecodeError::new(path, e.to_string()))?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| DecodeError::new(path, format!("probe failed: {}", e)))?;

    Ok(probed.format)
}

fn default_track(format: &dyn FormatReader, path: &Path) -> Result<(u32, CodecParameters), DecodeError> {
    format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .map(|t| (t.id, t.codec_params.clone()))
        .ok_or_else(|| DecodeError::new(path, "no audio track found"))
}

/// Decode a whole file and measure its RMS and peak level.
///
/// Every call re-reads the file; nothing is cached.
pub fn measure(path: &Path) -> Result<LoudnessMeasurement, DecodeError> {
    let mut format = open_format(path)?;
    let (track_id, codec_params) = default_track(format.as_ref(), path)?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(|e| DecodeError::new(path, format!("failed to create decoder: {}", e)))?;

    let mut acc = LevelAccumulator::default();
    let mut sample_buf: Option<SampleBuffer<i32>> = None;
    let mut sample_buf_capacity: u64 = 0;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(DecodeError::new(path, e.to_string())),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(SymphoniaError::DecodeError(_)) => continue,
            Err(e) => return Err(DecodeError::new(path, e.to_string())),
        };

        let spec = *decoded.spec();
        let num_frames = decoded.frames() as u64;

        // Reuse the buffer across packets; only reallocate when it is too small
        if sample_buf_capacity < num_frames {
            sample_buf = None;
            sample_buf_capacity = num_frames;
        }
        let buf = sample_buf.get_or_insert_with(|| SampleBuffer::new(num_frames, spec));

        buf.copy_interleaved_ref(decoded);
        acc.push_samples(buf.samples());
    }

    Ok(acc.finalize())
}

/// Read stream properties from the container header without decoding.
pub fn probe(path: &Path) -> Result<AudioInfo, DecodeError> {
    let format = open_format(path)?;
    let (_, params) = default_track(format.as_ref(), path)?;

    let sample_rate = params
        .sample_rate
        .ok_or_else(|| DecodeError::new(path, "unknown sample rate"))?;
    let channels = params.channels.map(|c| c.count()).unwrap_or(0);
    let duration_secs = params
        .n_frames
        .map(|n| n as f64 / sample_rate as f64)
        .unwrap_or(0.0);

    Ok(AudioInfo {
        sample_rate,
        bits_per_sample: params.bits_per_sample,
        channels,
        frames: params.n_frames,
        duration_secs,
    })
}
