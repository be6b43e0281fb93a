// SPDX-FileCopyrightText: 2026 Sequin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! CSV export of query results.
//!
//! Rows are JSON objects that may not share a key set, so the header is the
//! sorted union of every key and missing cells are written empty. Each
//! export lands in a timestamped file under the output directory, and old
//! exports are rotated away once the directory exceeds its cap.

use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use sequin_core::traits::Exporter;
use sequin_core::{Row, SequinError};

const FILE_PREFIX: &str = "sequin_export_";

/// Filesystem CSV exporter with rotation.
pub struct CsvExporter {
    output_dir: PathBuf,
    /// Newest exports kept on disk; older ones are deleted after each write.
    max_files: usize,
}

impl CsvExporter {
    pub fn new(output_dir: impl Into<PathBuf>, max_files: usize) -> Self {
        Self {
            output_dir: output_dir.into(),
            max_files: max_files.max(1),
        }
    }

    fn io_error(message: &str, e: impl std::error::Error + Send + Sync + 'static) -> SequinError {
        SequinError::Export {
            message: message.to_string(),
            source: Some(Box::new(e)),
        }
    }

    /// Write `rows` to a fresh CSV file and return its absolute path.
    fn write_csv(&self, rows: &[Row]) -> Result<PathBuf, SequinError> {
        fs::create_dir_all(&self.output_dir)
            .map_err(|e| Self::io_error("failed to create output directory", e))?;

        // Header: sorted union of keys across all rows.
        let mut columns: Vec<&str> = rows
            .iter()
            .flat_map(|row| row.keys().map(String::as_str))
            .collect();
        columns.sort_unstable();
        columns.dedup();

        let filename = format!(
            "{FILE_PREFIX}{}_{}.csv",
            Utc::now().format("%Y%m%d_%H%M%S"),
            &Uuid::new_v4().to_string()[..8]
        );
        let path = self.output_dir.join(filename);

        let mut writer = csv::Writer::from_path(&path)
            .map_err(|e| Self::io_error("failed to create export file", e))?;
        writer
            .write_record(&columns)
            .map_err(|e| Self::io_error("failed to write header", e))?;
        for row in rows {
            let record: Vec<String> = columns
                .iter()
                .map(|col| row.get(*col).map(render_cell).unwrap_or_default())
                .collect();
            writer
                .write_record(&record)
                .map_err(|e| Self::io_error("failed to write row", e))?;
        }
        writer
            .flush()
            .map_err(|e| Self::io_error("failed to flush export file", e))?;

        // Prefer the absolute path as the download reference.
        Ok(path.canonicalize().unwrap_or(path))
    }

    /// Delete the oldest exports beyond the cap. Rotation failures are
    /// logged, never surfaced: the new export already exists.
    fn rotate(&self) {
        let entries = match fs::read_dir(&self.output_dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(error = %e, "failed to scan export directory for rotation");
                return;
            }
        };
        // Order by modification time; names only break ties within the
        // filesystem's timestamp resolution.
        let mut exports: Vec<(std::time::SystemTime, PathBuf)> = entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| is_export_file(path))
            .map(|path| {
                let modified = fs::metadata(&path)
                    .and_then(|meta| meta.modified())
                    .unwrap_or(std::time::SystemTime::UNIX_EPOCH);
                (modified, path)
            })
            .collect();
        exports.sort();

        if exports.len() <= self.max_files {
            return;
        }
        let excess = exports.len() - self.max_files;
        for (_, stale) in &exports[..excess] {
            match fs::remove_file(stale) {
                Ok(()) => info!(path = %stale.display(), "rotated out old export"),
                Err(e) => warn!(path = %stale.display(), error = %e, "failed to rotate export"),
            }
        }
    }
}

#[async_trait]
impl Exporter for CsvExporter {
    async fn export(&self, rows: &[Row]) -> Result<String, SequinError> {
        if rows.is_empty() {
            return Err(SequinError::Export {
                message: "nothing to export".to_string(),
                source: None,
            });
        }
        let path = self.write_csv(rows)?;
        self.rotate();
        info!(path = %path.display(), rows = rows.len(), "export written");
        Ok(path.display().to_string())
    }
}

fn is_export_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "csv")
        && path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with(FILE_PREFIX))
}

/// Scalars render bare (strings unquoted, numbers as printed); composite
/// values fall back to compact JSON.
fn render_cell(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(pairs: &[(&str, serde_json::Value)]) -> Row {
        let mut row = Row::new();
        for (key, value) in pairs {
            row.insert(key.to_string(), value.clone());
        }
        row
    }

    #[tokio::test]
    async fn export_writes_sorted_union_header() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = CsvExporter::new(dir.path(), 10);
        let rows = vec![
            row(&[("installs", json!(10)), ("app_name", json!("Weather Now"))]),
            row(&[("country", json!("US")), ("app_name", json!("Maps"))]),
        ];
        let reference = exporter.export(&rows).await.unwrap();
        let content = fs::read_to_string(&reference).unwrap();
        let mut lines = content.lines();
        assert_eq!(lines.next().unwrap(), "app_name,country,installs");
        assert_eq!(lines.next().unwrap(), "Weather Now,,10");
        assert_eq!(lines.next().unwrap(), "Maps,US,");
    }

    #[tokio::test]
    async fn export_reference_is_absolute() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = CsvExporter::new(dir.path(), 10);
        let reference = exporter
            .export(&[row(&[("a", json!(1))])])
            .await
            .unwrap();
        assert!(Path::new(&reference).is_absolute());
        assert!(Path::new(&reference).exists());
    }

    #[tokio::test]
    async fn empty_rows_are_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = CsvExporter::new(dir.path(), 10);
        let err = exporter.export(&[]).await.unwrap_err();
        assert!(matches!(err, SequinError::Export { .. }));
    }

    #[tokio::test]
    async fn null_and_composite_cells_render() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = CsvExporter::new(dir.path(), 10);
        let rows = vec![row(&[
            ("a", json!(null)),
            ("b", json!([1, 2])),
            ("c", json!(1.5)),
        ])];
        let reference = exporter.export(&rows).await.unwrap();
        let content = fs::read_to_string(&reference).unwrap();
        assert!(content.contains("\"[1,2]\",1.5"));
    }

    #[tokio::test]
    async fn rotation_keeps_newest() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = CsvExporter::new(dir.path(), 2);
        let rows = vec![row(&[("a", json!(1))])];
        let mut references = Vec::new();
        for _ in 0..4 {
            references.push(exporter.export(&rows).await.unwrap());
        }
        let remaining: Vec<PathBuf> = fs::read_dir(dir.path())
            .unwrap()
            .flatten()
            .map(|entry| entry.path())
            .collect();
        assert_eq!(remaining.len(), 2);
        // The latest export always survives its own rotation.
        assert!(Path::new(references.last().unwrap()).exists());
    }

    #[tokio::test]
    async fn foreign_files_are_not_rotated() {
        let dir = tempfile::tempdir().unwrap();
        let foreign = dir.path().join("notes.csv");
        fs::write(&foreign, "keep me").unwrap();
        let exporter = CsvExporter::new(dir.path(), 1);
        let rows = vec![row(&[("a", json!(1))])];
        exporter.export(&rows).await.unwrap();
        exporter.export(&rows).await.unwrap();
        assert!(foreign.exists());
    }

    #[tokio::test]
    async fn output_dir_created_on_demand() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let exporter = CsvExporter::new(&nested, 5);
        exporter.export(&[row(&[("a", json!(1))])]).await.unwrap();
        assert!(nested.exists());
    }
}
