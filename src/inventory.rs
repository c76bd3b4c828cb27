//! Recursive listing of audio files with their stream properties.

use std::path::Path;

use tracing::warn;
use walkdir::WalkDir;

use crate::analyzer;
use crate::models::InventoryEntry;

/// Walk `dir` recursively and describe every audio file found, sorted by path.
///
/// `source_suffix` / `target_suffix` are used to name each file's counterpart
/// and its short name. Files that cannot be probed are logged and skipped.
pub fn scan(dir: &Path, source_suffix: &str, target_suffix: &str) -> Vec<InventoryEntry> {
    let mut paths: Vec<_> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| analyzer::is_audio_file(p))
        .collect();
    paths.sort();

    paths
        .iter()
        .filter_map(|path| {
            let info = match analyzer::probe(path) {
                Ok(info) => info,
                Err(e) => {
                    warn!(error = %e, "Skipping unreadable file");
                    return None;
                }
            };

            let file_name = path.file_name()?.to_string_lossy().to_string();
            let folder = path
                .parent()
                .and_then(|p| p.strip_prefix(dir).ok())
                .map(|p| p.to_string_lossy().replace('\\', "/"))
                .unwrap_or_default();

            Some(InventoryEntry {
                counterpart_name: counterpart_name(&file_name, source_suffix, target_suffix),
                short_name: short_name(&file_name, &[source_suffix, target_suffix]),
                file_name,
                folder,
                duration_secs: info.duration_secs,
                bits_per_sample: info.bits_per_sample,
                sample_rate: info.sample_rate,
            })
        })
        .collect()
}

/// Swap one language suffix for the other; names with neither are returned unchanged.
pub fn counterpart_name(file_name: &str, source_suffix: &str, target_suffix: &str) -> String {
    if let Some(base) = file_name.strip_suffix(source_suffix) {
        format!("{}{}", base, target_suffix)
    } else if let Some(base) = file_name.strip_suffix(target_suffix) {
        format!("{}{}", base, source_suffix)
    } else {
        file_name.to_string()
    }
}

/// Take markers that may sit between a scene name and its language suffix.
const TAKE_VARIANTS: [&str; 6] = ["a", "b", "c", "d", "e", "f"];

/// The file name without its language suffix and take marker (or just its extension).
///
/// `s1_b_ENG.wav` and `s1_ENG.wav` both shorten to `s1`.
pub fn short_name(file_name: &str, suffixes: &[&str]) -> String {
    if let Some(base) = suffixes.iter().find_map(|s| file_name.strip_suffix(s)) {
        return strip_take_variant(base).to_string();
    }
    Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(file_name)
        .to_string()
}

fn strip_take_variant(base: &str) -> &str {
    match base.rsplit_once('_') {
        Some((stem, take)) if !stem.is_empty() && TAKE_VARIANTS.contains(&take) => stem,
        _ => base,
    }
}
