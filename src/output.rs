use std::io::{self, Write};
use std::path::Path;

use serde::Serialize;
use tempfile::NamedTempFile;

use crate::report::AnalysisReport;

const RULE: &str = "============================================================";

/// Writes `value` as 2-space indented JSON.
///
/// The data goes to a temporary file next to `path` that is renamed into place, so
/// a failed write leaves any previous file untouched and never a partial one.
pub fn write_json_pretty<T: Serialize + ?Sized>(path: &Path, value: &T) -> io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut staged = NamedTempFile::new_in(dir)?;
    serde_json::to_writer_pretty(&mut staged, value)?;
    staged.write_all(b"\n")?;
    staged.flush()?;
    staged.persist(path).map_err(|err| err.error)?;
    Ok(())
}

/// The downloadable report body.
pub fn report_json(report: &AnalysisReport) -> serde_json::Result<String> {
    serde_json::to_string_pretty(report)
}

pub fn format_summary(report: &AnalysisReport) -> String {
    format!(
        "🌸 RESULTS\n\
         {RULE}\n\
         Total Flowers Detected: {count}\n\
         \n\
         📊 SUMMARY\n\
         {RULE}\n\
         Total flowers: {count}\n\
         Average flower area: {average:.1} px²\n\
         Min flower area: {min:.1} px²\n\
         Max flower area: {max:.1} px²\n\
         Total coverage: {total:.1} px²\n\
         Coverage of image: {coverage:.1}%",
        count = report.flower_count,
        average = report.average_area,
        min = report.min_area,
        max = report.max_area,
        total = report.total_area,
        coverage = report.coverage_percent,
    )
}
