//! JSON metrics documents and the alert log under the reports directory

use crate::alerting::JsonlAlertLog;
use crate::error::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, info};

pub const DRIFT_METRICS_FILE: &str = "drift_metrics.json";
pub const COST_METRICS_FILE: &str = "cost_metrics.json";
pub const PERFORMANCE_METRICS_FILE: &str = "performance_metrics.json";

const SECONDS_PER_DAY: u64 = 86_400;

/// Reads and writes report documents inside one directory
#[derive(Debug, Clone)]
pub struct ReportStore {
    dir: PathBuf,
}

impl ReportStore {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    /// Write `value` as pretty JSON, replacing any previous document
    pub fn write_json<T: Serialize>(&self, name: &str, value: &T) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path(name);
        fs::write(&path, serde_json::to_string_pretty(value)?)?;
        info!(path = %path.display(), "Report written");
        Ok(path)
    }

    /// Read a document, `None` when it has not been written yet
    pub fn read_json<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>> {
        let path = self.path(name);
        if !path.exists() {
            debug!(path = %path.display(), "Report not found");
            return Ok(None);
        }
        let raw = fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&raw)?))
    }

    /// Open the append-only alert log kept alongside the reports
    pub fn alert_log(&self, file_name: &str) -> Result<JsonlAlertLog> {
        JsonlAlertLog::open(self.path(file_name))
    }
}

/// Whole days since the file was last modified, `None` if it does not exist
pub fn model_age_days<P: AsRef<Path>>(path: P) -> Result<Option<u64>> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(None);
    }
    let modified = fs::metadata(path)?.modified()?;
    // mtime in the future counts as fresh
    let age = SystemTime::now()
        .duration_since(modified)
        .unwrap_or_default()
        .as_secs();
    Ok(Some(age / SECONDS_PER_DAY))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerting::AlertLog;
    use crate::types::alert::{Alert, AlertType, Severity};
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Doc {
        drift_count: usize,
    }

    #[test]
    fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let store = ReportStore::new(dir.path().join("reports"));

        let path = store.write_json(DRIFT_METRICS_FILE, &Doc { drift_count: 3 }).unwrap();

        assert!(path.ends_with("reports/drift_metrics.json"));
        let doc: Option<Doc> = store.read_json(DRIFT_METRICS_FILE).unwrap();
        assert_eq!(doc, Some(Doc { drift_count: 3 }));
    }

    #[test]
    fn test_absent_document_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = ReportStore::new(dir.path());
        let doc: Option<Doc> = store.read_json(PERFORMANCE_METRICS_FILE).unwrap();
        assert!(doc.is_none());
    }

    #[test]
    fn test_alert_log_lives_in_reports_dir() {
        let dir = tempfile::tempdir().unwrap();
        let store = ReportStore::new(dir.path().join("reports"));

        let log = store.alert_log("alerts.json").unwrap();
        log.append(&Alert::new(AlertType::SystemStatus, Severity::Critical, "offline"))
            .unwrap();

        assert!(dir.path().join("reports/alerts.json").exists());
    }

    #[test]
    fn test_model_age() {
        let dir = tempfile::tempdir().unwrap();
        let model = dir.path().join("model.onnx");

        assert_eq!(model_age_days(&model).unwrap(), None);

        fs::write(&model, b"onnx").unwrap();
        assert_eq!(model_age_days(&model).unwrap(), Some(0));
    }
}
