use crate::models::{InventoryEntry, LoudnessMeasurement, ReportRow};

pub const REPORT_HEADERS: [&str; 8] = [
    "File Name",
    "Source RMS (dB)",
    "Source Peak (dB)",
    "Target RMS (dB)",
    "Target Peak (dB)",
    "Output RMS (dB)",
    "Output Peak (dB)",
    "RMS Difference (dB)",
];

pub const INVENTORY_HEADERS: [&str; 7] = [
    "File Name",
    "Counterpart File Name",
    "Short Name",
    "Folder",
    "File Length",
    "Bit Depth",
    "Sample Rate",
];

/// Format a dB value with two decimals; non-finite values become `-inf` / `inf`.
pub fn format_db(value: f64) -> String {
    if value.is_finite() {
        format!("{:.2}", value)
    } else if value < 0.0 {
        "-inf".to_string()
    } else {
        "inf".to_string()
    }
}

fn format_opt_db(value: Option<f64>) -> String {
    value.map(format_db).unwrap_or_default()
}

/// Format a duration in seconds as "M:SS.mmm".
pub fn format_duration(secs: f64) -> String {
    let total_ms = (secs * 1000.0).round() as u64;
    let minutes = total_ms / 60_000;
    let seconds = (total_ms / 1000) % 60;
    let millis = total_ms % 1000;
    format!("{}:{:02}.{:03}", minutes, seconds, millis)
}

/// Quote a CSV field if it contains a separator, quote, or newline.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Format a single measurement as a short table.
pub fn format_measurement(name: &str, m: &LoudnessMeasurement) -> String {
    let separator = "\u{2500}".repeat(40);
    format!(
        "{:>10} {:>10}  {}\n\
         {}\n\
         {:>7} dB {:>7} dB  {}",
        "RMS", "Peak", "File",
        separator,
        format_db(m.rms_db),
        format_db(m.peak_db),
        name,
    )
}

/// Format report rows as an aligned text table.
pub fn format_table(rows: &[ReportRow]) -> String {
    let separator = "\u{2500}".repeat(82);
    let mut output = String::new();

    output.push_str(&format!(
        "{:>9} {:>9} {:>9} {:>9} {:>9} {:>9} {:>9}  {}\n",
        "Src RMS", "Src Peak", "Tgt RMS", "Tgt Peak", "Out RMS", "Out Peak", "Diff", "File"
    ));
    output.push_str(&separator);
    output.push('\n');

    for row in rows {
        output.push_str(&format!(
            "{:>9} {:>9} {:>9} {:>9} {:>9} {:>9} {:>9}  {}\n",
            format_db(row.source_rms_db),
            format_db(row.source_peak_db),
            format_opt_db(row.target_rms_db),
            format_opt_db(row.target_peak_db),
            format_db(row.output_rms_db),
            format_db(row.output_peak_db),
            format_db(row.rms_difference_db),
            row.file_name,
        ));
    }

    output.push_str(&separator);
    output.push('\n');
    output.push_str(&format!("Number of files: {}", rows.len()));

    output
}

/// Format report rows as pretty-printed JSON.
pub fn format_json(rows: &[ReportRow]) -> String {
    serde_json::to_string_pretty(rows).unwrap_or_else(|_| "[]".to_string())
}

/// Format a single measurement as pretty-printed JSON.
pub fn format_json_single(m: &LoudnessMeasurement) -> String {
    serde_json::to_string_pretty(m).unwrap_or_else(|_| "{}".to_string())
}

/// Format report rows as CSV with a header row.
pub fn format_csv(rows: &[ReportRow]) -> String {
    let mut output = REPORT_HEADERS.join(",");
    output.push('\n');
    for row in rows {
        output.push_str(&format!(
            "{},{},{},{},{},{},{},{}\n",
            csv_field(&row.file_name),
            format_db(row.source_rms_db),
            format_db(row.source_peak_db),
            format_opt_db(row.target_rms_db),
            format_opt_db(row.target_peak_db),
            format_db(row.output_rms_db),
            format_db(row.output_peak_db),
            format_db(row.rms_difference_db),
        ));
    }
    output
}

pub fn format_inventory_csv(entries: &[InventoryEntry]) -> String {
    let mut output = INVENTORY_HEADERS.join(",");
    output.push('\n');
    for e in entries {
        output.push_str(&format!(
            "{},{},{},{},{},{},{}\n",
            csv_field(&e.file_name),
            csv_field(&e.counterpart_name),
            csv_field(&e.short_name),
            csv_field(&e.folder),
            format_duration(e.duration_secs),
            e.bits_per_sample.map(|b| b.to_string()).unwrap_or_default(),
            e.sample_rate,
        ));
    }
    output
}

pub fn format_inventory_table(entries: &[InventoryEntry]) -> String {
    let mut output = format!(
        "{:>12} {:>5} {:>7}  {}\n",
        "Length", "Bits", "Rate", "File"
    );
    output.push_str(&"\u{2500}".repeat(58));
    output.push('\n');
    for e in entries {
        let path = if e.folder.is_empty() {
            e.file_name.clone()
        } else {
            format!("{}/{}", e.folder, e.file_name)
        };
        output.push_str(&format!(
            "{:>12} {:>5} {:>7}  {}\n",
            format_duration(e.duration_secs),
            e.bits_per_sample.map(|b| b.to_string()).unwrap_or_else(|| "-".into()),
            e.sample_rate,
            path,
        ));
    }
    output.push_str(&format!("Number of files: {}", entries.len()));
    output
}

pub fn format_inventory_json(entries: &[InventoryEntry]) -> String {
    serde_json::to_string_pretty(entries).unwrap_or_else(|_| "[]".to_string())
}
