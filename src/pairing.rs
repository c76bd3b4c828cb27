//! Target-file discovery and source/output path derivation by filename suffix.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::config::MatchConfig;
use crate::models::FilePair;

/// Files under `dir` whose name ends with `suffix`, sorted by path.
///
/// With `recursive`, subdirectories are searched too.
pub fn scan_suffix_files(dir: &Path, suffix: &str, recursive: bool) -> Vec<PathBuf> {
    let matches_suffix = |p: &Path| {
        p.file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.ends_with(suffix) && n.len() > suffix.len())
            .unwrap_or(false)
    };

    let mut files: Vec<PathBuf> = if recursive {
        WalkDir::new(dir)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .filter(|p| matches_suffix(p))
            .collect()
    } else {
        std::fs::read_dir(dir)
            .into_iter()
            .flatten()
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_file() && matches_suffix(p))
            .collect()
    };
    files.sort();
    files
}

/// Strip `suffix` from a file name, returning the shared base name.
pub fn base_name<'a>(file_name: &'a str, suffix: &str) -> Option<&'a str> {
    file_name.strip_suffix(suffix).filter(|b| !b.is_empty())
}

/// Derive the source and output paths for one target file.
pub fn pair_for_target(config: &MatchConfig, target_path: &Path) -> Option<FilePair> {
    let file_name = target_path.file_name()?.to_str()?;
    let base = base_name(file_name, &config.target_suffix)?;

    let relative_dir = target_path
        .parent()
        .and_then(|p| p.strip_prefix(&config.target_dir).ok())
        .unwrap_or_else(|| Path::new(""));

    let source_name = format!("{}{}", base, config.source_suffix);
    Some(FilePair {
        source_path: config.source_dir.join(relative_dir).join(source_name),
        target_path: target_path.to_path_buf(),
        output_path: config.output_dir.join(relative_dir).join(file_name),
    })
}

/// Enumerate all candidate pairs for a run, in sorted target order.
pub fn discover_pairs(config: &MatchConfig) -> Vec<FilePair> {
    scan_suffix_files(&config.target_dir, &config.target_suffix, config.recursive)
        .iter()
        .filter_map(|target| pair_for_target(config, target))
        .collect()
}
