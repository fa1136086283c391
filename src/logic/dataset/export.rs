use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use thiserror::Error;

use super::record::Reading;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Get the base directory for exported results
pub fn get_export_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("coldchain")
        .join("results")
}

/// Timestamped file path under the export directory
pub fn default_export_path(extension: &str) -> PathBuf {
    get_export_dir().join(format!("results_{}.{}", Utc::now().format("%Y%m%d_%H%M%S"), extension))
}

fn create_parent(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent),
        _ => Ok(()),
    }
}

/// Write labeled readings as CSV (header + one row per reading)
/// Returns the number of rows written
pub fn to_csv(path: &Path, readings: &[Reading]) -> Result<usize, ExportError> {
    create_parent(path)?;
    let mut writer = csv::Writer::from_path(path)?;

    for reading in readings {
        writer.serialize(reading)?;
    }

    writer.flush()?;
    log::info!("Exported {} readings to {}", readings.len(), path.display());
    Ok(readings.len())
}

/// Write labeled readings as JSONL (one object per line)
pub fn to_jsonl(path: &Path, readings: &[Reading]) -> Result<usize, ExportError> {
    create_parent(path)?;
    let mut output = BufWriter::new(File::create(path)?);

    for reading in readings {
        serde_json::to_writer(&mut output, reading)?;
        output.write_all(b"\n")?;
    }

    output.flush()?;
    log::info!("Exported {} readings to {}", readings.len(), path.display());
    Ok(readings.len())
}

/// Pick the format from the file extension (`.jsonl` / `.json` → JSONL, else CSV)
pub fn to_path(path: &Path, readings: &[Reading]) -> Result<usize, ExportError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("jsonl") | Some("json") => to_jsonl(path, readings),
        _ => to_csv(path, readings),
    }
}
