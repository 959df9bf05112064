//! Console, CSV and JSON output of a scan.

use std::borrow::Cow;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use tm_core::profile::MatchResult;
use tm_match::scanner::ProfileSet;

/// CSV header, one column per [`MatchResult`] field.
pub const CSV_HEADER: [&str; 7] = [
    "File 1",
    "File 2",
    "Tempo 1 (BPM)",
    "Tempo 2 (BPM)",
    "Tempo Difference",
    "Tempo Variation Difference",
    "Beat Consistency Difference",
];

/// Human-readable match list: tempos with 2 decimals, differences with 4.
///
/// # Errors
/// Propagates write errors from `out`.
pub fn write_console(out: &mut impl Write, matches: &[MatchResult]) -> std::io::Result<()> {
    writeln!(out, "Matching Files Based on Tempo:")?;
    if matches.is_empty() {
        writeln!(out, "\nNo match found.")?;
    }
    for m in matches {
        writeln!(out, "\nMatch found:")?;
        writeln!(out, "File 1: {}", m.file1)?;
        writeln!(out, "File 2: {}", m.file2)?;
        writeln!(out, "Tempos: {:.2} BPM, {:.2} BPM", m.tempo1, m.tempo2)?;
        writeln!(out, "Match Details:")?;
        writeln!(out, "  {}: {:.4}", CSV_HEADER[4], m.tempo_diff)?;
        writeln!(out, "  {}: {:.4}", CSV_HEADER[5], m.std_diff)?;
        writeln!(out, "  {}: {:.4}", CSV_HEADER[6], m.beat_diff)?;
    }
    Ok(())
}

/// Quote a field when it holds a separator, a quote or a line break.
fn csv_field(value: &str) -> Cow<'_, str> {
    if value.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}

/// One CSV line per match, header first. Full float precision.
#[must_use]
pub fn csv_rows(matches: &[MatchResult]) -> Vec<String> {
    let mut rows = Vec::with_capacity(matches.len() + 1);
    rows.push(CSV_HEADER.join(","));
    for m in matches {
        rows.push(format!(
            "{},{},{:?},{:?},{:?},{:?},{:?}",
            csv_field(&m.file1),
            csv_field(&m.file2),
            m.tempo1,
            m.tempo2,
            m.tempo_diff,
            m.std_diff,
            m.beat_diff
        ));
    }
    rows
}

/// Write the match table to `path`. The header is written even without
/// matches.
///
/// # Errors
/// Returns an error if the file cannot be created or written.
pub fn write_csv(path: &Path, matches: &[MatchResult]) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Création du CSV impossible : {}", path.display()))?;
    let mut w = BufWriter::new(file);
    for line in csv_rows(matches) {
        writeln!(w, "{line}")?;
    }
    w.flush()?;
    Ok(())
}

/// Write every profile as pretty JSON, in scan order.
///
/// # Errors
/// Returns an error if serialisation or the write fails.
pub fn dump_profiles(path: &Path, profiles: &ProfileSet) -> Result<()> {
    let entries = profiles
        .iter()
        .map(|(file, profile)| {
            Ok(serde_json::json!({
                "file": file,
                "profile": serde_json::to_value(profile)?,
            }))
        })
        .collect::<Result<Vec<_>, serde_json::Error>>()?;
    let file = File::create(path)
        .with_context(|| format!("Création du JSON impossible : {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), &entries)?;
    Ok(())
}
