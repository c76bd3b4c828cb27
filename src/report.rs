use std::io;
use std::path::Path;

use tracing::warn;

use crate::analyzer;
use crate::format;
use crate::models::{FilePair, InventoryEntry, ReportRow};

/// Re-measure every produced output against its source.
///
/// Values computed during processing are not reused, so drift introduced by
/// the processor shows up here. Pairs whose output is missing or unreadable
/// are left out of the report.
pub fn compile(pairs: &[FilePair]) -> Vec<ReportRow> {
    pairs.iter().filter_map(compile_row).collect()
}

fn compile_row(pair: &FilePair) -> Option<ReportRow> {
    let name = pair.file_name();
    if !pair.output_path.is_file() {
        warn!(file = %name, "Output missing, omitting from report");
        return None;
    }

    let measured = analyzer::measure(&pair.source_path)
        .and_then(|source| analyzer::measure(&pair.output_path).map(|output| (source, output)));
    let (source, output) = match measured {
        Ok(m) => m,
        Err(e) => {
            warn!(file = %name, error = %e, "Could not re-measure, omitting from report");
            return None;
        }
    };

    let target = if pair.target_path.is_file() {
        analyzer::measure(&pair.target_path).ok()
    } else {
        None
    };

    Some(ReportRow::new(name, source, target, output))
}

/// Serialize rows in the format implied by the report path's extension:
/// `.json`, `.txt`, or CSV for anything else.
pub fn render_report(path: &Path, rows: &[ReportRow]) -> String {
    match extension(path).as_deref() {
        Some("json") => format::format_json(rows),
        Some("txt") => format::format_table(rows),
        _ => format::format_csv(rows),
    }
}

/// Persist the loudness report to `path`, creating parent directories.
pub fn save_report(path: &Path, rows: &[ReportRow]) -> io::Result<()> {
    write_file(path, &render_report(path, rows))
}

/// Persist an inventory listing to `path`, format chosen by extension.
pub fn save_inventory(path: &Path, entries: &[InventoryEntry]) -> io::Result<()> {
    let content = match extension(path).as_deref() {
        Some("json") => format::format_inventory_json(entries),
        Some("txt") => format::format_inventory_table(entries),
        _ => format::format_inventory_csv(entries),
    };
    write_file(path, &content)
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}

fn write_file(path: &Path, content: &str) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)
}
