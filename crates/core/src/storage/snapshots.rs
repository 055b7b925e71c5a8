use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("permission denied writing to {path}")]
    PermissionDenied { path: PathBuf },

    #[error("path not found: {path}")]
    NotFound { path: PathBuf },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize snapshot: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl ExportError {
    fn from_io(path: &Path, source: std::io::Error) -> Self {
        let path = path.to_path_buf();
        match source.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            std::io::ErrorKind::NotFound => Self::NotFound { path },
            _ => Self::Io { path, source },
        }
    }
}

/// Result of one export attempt. Failures are reported here, never returned as `Err`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ExportOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExportOutcome {
    fn saved(path: PathBuf) -> Self {
        Self {
            success: true,
            path: Some(path),
            error: None,
        }
    }

    fn failed(err: &ExportError) -> Self {
        Self {
            success: false,
            path: None,
            error: Some(err.to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SnapshotExporter {
    dir: PathBuf,
}

impl SnapshotExporter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn default_dir() -> PathBuf {
        if cfg!(windows) {
            PathBuf::from(r"G:\My Drive\Stock Reports")
        } else {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("Google Drive")
                .join("My Drive")
                .join("Stock Reports")
        }
    }

    pub async fn save<T: Serialize>(&self, rows: &[T]) -> ExportOutcome {
        self.save_at(rows, Utc::now()).await
    }

    pub async fn save_at<T: Serialize>(&self, rows: &[T], now: DateTime<Utc>) -> ExportOutcome {
        match self.write(rows, now).await {
            Ok(path) => {
                tracing::info!(path = %path.display(), count = rows.len(), "snapshot exported");
                ExportOutcome::saved(path)
            }
            Err(err) => {
                tracing::error!(dir = %self.dir.display(), error = %err, "snapshot export failed");
                ExportOutcome::failed(&err)
            }
        }
    }

    async fn write<T: Serialize>(
        &self,
        rows: &[T],
        now: DateTime<Utc>,
    ) -> Result<PathBuf, ExportError> {
        let body = serde_json::to_string_pretty(rows)?;
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| ExportError::from_io(&self.dir, e))?;
        let path = self.dir.join(snapshot_file_name(now));
        tokio::fs::write(&path, body)
            .await
            .map_err(|e| ExportError::from_io(&path, e))?;
        Ok(path)
    }
}

/// `stock-snapshot-2024-05-01T13-45-07-123Z.json`
pub fn snapshot_file_name(now: DateTime<Utc>) -> String {
    format!(
        "stock-snapshot-{}.json",
        now.format("%Y-%m-%dT%H-%M-%S-%3fZ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::{json, Value};

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 13, 45, 7).unwrap() + chrono::Duration::milliseconds(123)
    }

    #[test]
    fn file_name_replaces_colons_and_dots() {
        assert_eq!(
            snapshot_file_name(fixed_now()),
            "stock-snapshot-2024-05-01T13-45-07-123Z.json"
        );
    }

    #[tokio::test]
    async fn save_creates_directory_and_writes_pretty_array() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = SnapshotExporter::new(dir.path().join("reports").join("daily"));
        let rows = vec![json!({"ticker": "AAPL", "rank": 1}), json!({"ticker": "MSFT", "rank": 2})];

        let outcome = exporter.save_at(&rows, fixed_now()).await;
        assert!(outcome.success, "{outcome:?}");
        let path = outcome.path.unwrap();
        assert!(path.ends_with("stock-snapshot-2024-05-01T13-45-07-123Z.json"));

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("\n  {"));
        let parsed: Value = serde_json::from_str(&written).unwrap();
        assert_eq!(parsed, Value::Array(rows));
    }

    #[tokio::test]
    async fn empty_collection_is_an_empty_array() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = SnapshotExporter::new(dir.path());
        let outcome = exporter.save_at::<Value>(&[], fixed_now()).await;
        let written = std::fs::read_to_string(outcome.path.unwrap()).unwrap();
        assert_eq!(written, "[]");
    }

    #[tokio::test]
    async fn failure_is_reported_not_thrown() {
        let dir = tempfile::tempdir().unwrap();
        // A regular file where the directory should be.
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "x").unwrap();
        let exporter = SnapshotExporter::new(blocker.join("reports"));

        let outcome = exporter.save_at(&[json!({"ticker": "AAPL"})], fixed_now()).await;
        assert!(!outcome.success);
        assert!(outcome.path.is_none());
        assert!(outcome.error.is_some());
    }

    #[test]
    fn io_errors_are_classified() {
        let p = Path::new("/x");
        let denied = ExportError::from_io(p, std::io::ErrorKind::PermissionDenied.into());
        assert!(matches!(denied, ExportError::PermissionDenied { .. }));
        assert_eq!(denied.to_string(), "permission denied writing to /x");
        let missing = ExportError::from_io(p, std::io::ErrorKind::NotFound.into());
        assert!(matches!(missing, ExportError::NotFound { .. }));
    }

    #[test]
    fn outcome_serializes_without_empty_fields() {
        let v = serde_json::to_value(ExportOutcome::saved(PathBuf::from("/r/a.json"))).unwrap();
        assert_eq!(v, json!({"success": true, "path": "/r/a.json"}));
    }
}
