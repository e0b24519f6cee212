//! File formats for whole-crawl output
//!
//! Each writer takes the flattened rows and an optional path. Without a
//! path the output goes to stdout.

use crate::extract::Record;
use serde_json::Value;
use std::collections::BTreeSet;
use std::fs;
use std::io::{self, Write};
use std::path::Path;

/// Writes rows as a pretty-printed JSON array
pub fn save_json(rows: &[Record], path: Option<&Path>) -> anyhow::Result<bool> {
    let contents = serde_json::to_string_pretty(rows)?;
    write_output(path, &contents)?;
    Ok(true)
}

/// Writes rows as CSV
///
/// CSV needs a file; without an output path the rows are written to stdout
/// as JSON instead.
pub fn save_csv(rows: &[Record], path: Option<&Path>) -> anyhow::Result<bool> {
    let Some(path) = path else {
        tracing::warn!("CSV output requires an output path. Writing JSON to stdout instead.");
        return save_json(rows, None);
    };

    let contents = to_csv_string(rows)?;
    write_output(Some(path), &contents)?;
    Ok(true)
}

/// Writes rows as a YAML sequence
pub fn save_yaml(rows: &[Record], path: Option<&Path>) -> anyhow::Result<bool> {
    let contents = serde_yaml::to_string(rows)?;
    write_output(path, &contents)?;
    Ok(true)
}

/// Formats rows as CSV
///
/// The header is the sorted union of every row's field names; fields a row
/// lacks are left empty. Strings are written as-is, other values as JSON.
pub fn to_csv_string(rows: &[Record]) -> anyhow::Result<String> {
    let maps: Vec<_> = rows.iter().map(Record::to_map).collect();
    let headers: BTreeSet<&str> = maps
        .iter()
        .flat_map(|map| map.keys().map(String::as_str))
        .collect();

    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record(&headers)?;

    for map in &maps {
        let record: Vec<String> = headers
            .iter()
            .map(|header| map.get(*header).map(csv_cell).unwrap_or_default())
            .collect();
        writer.write_record(&record)?;
    }

    Ok(String::from_utf8(writer.into_inner()?)?)
}

fn csv_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn write_output(path: Option<&Path>, contents: &str) -> io::Result<()> {
    match path {
        Some(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent)?;
                }
            }
            fs::write(path, contents)?;
            tracing::info!("Output written to {}", path.display());
            Ok(())
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(contents.as_bytes())?;
            if !contents.ends_with('\n') {
                stdout.write_all(b"\n")?;
            }
            stdout.flush()
        }
    }
}
