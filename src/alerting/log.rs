//! Append-only alert sinks

use crate::error::Result;
use crate::types::alert::{Alert, Severity};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};
use tracing::{debug, warn};

/// Destination for fired alerts. Records are only ever appended.
pub trait AlertLog: Send + Sync {
    fn append(&self, alert: &Alert) -> Result<()>;

    /// Every record written so far, oldest first
    fn entries(&self) -> Result<Vec<Alert>>;
}

/// One JSON object per line, appended to a file that survives restarts
pub struct JsonlAlertLog {
    path: PathBuf,
    file: Mutex<File>,
}

impl JsonlAlertLog {
    /// Open (or create) the log for appending; existing lines are kept
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        debug!(path = %path.display(), "Alert log opened");
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AlertLog for JsonlAlertLog {
    fn append(&self, alert: &Alert) -> Result<()> {
        let mut line = serde_json::to_vec(alert)?;
        line.push(b'\n');

        // a poisoned lock still holds a valid handle
        let mut file = self.file.lock().unwrap_or_else(|e| e.into_inner());
        file.write_all(&line)?;
        file.flush()?;
        Ok(())
    }

    fn entries(&self) -> Result<Vec<Alert>> {
        let reader = BufReader::new(File::open(&self.path)?);
        let mut alerts = Vec::new();
        for (number, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str(&line) {
                Ok(alert) => alerts.push(alert),
                Err(e) => warn!(line = number + 1, error = %e, "Skipping malformed alert record"),
            }
        }
        Ok(alerts)
    }
}

/// In-process log, for tests and embedding
#[derive(Default)]
pub struct MemoryAlertLog {
    alerts: RwLock<Vec<Alert>>,
}

impl MemoryAlertLog {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AlertLog for MemoryAlertLog {
    fn append(&self, alert: &Alert) -> Result<()> {
        self.alerts
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(alert.clone());
        Ok(())
    }

    fn entries(&self) -> Result<Vec<Alert>> {
        Ok(self
            .alerts
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone())
    }
}

/// Counts per severity plus the most recent records
#[derive(Debug, Clone, Default)]
pub struct AlertLogSummary {
    pub total: usize,
    pub critical: usize,
    pub warning: usize,
    pub info: usize,
    pub recent: Vec<Alert>,
}

impl AlertLogSummary {
    pub fn from_entries(entries: &[Alert], recent: usize) -> Self {
        let count = |severity: Severity| entries.iter().filter(|a| a.severity == severity).count();
        Self {
            total: entries.len(),
            critical: count(Severity::Critical),
            warning: count(Severity::Warning),
            info: count(Severity::Info),
            recent: entries[entries.len().saturating_sub(recent)..].to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::alert::AlertType;
    use std::sync::Arc;

    fn drift_alert() -> Alert {
        Alert::new(AlertType::DataDrift, Severity::Warning, "Data drift detected in 1 features")
            .with_details(serde_json::json!({ "drifted_features": ["amount"] }))
    }

    #[test]
    fn test_jsonl_one_record_per_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports").join("alerts.json");

        let log = JsonlAlertLog::open(&path).unwrap();
        log.append(&drift_alert()).unwrap();
        log.append(&Alert::new(AlertType::SystemStatus, Severity::Critical, "offline"))
            .unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = raw.lines().collect();
        assert_eq!(lines.len(), 2);
        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["type"], "Data Drift");
        assert_eq!(first["severity"], "WARNING");
    }

    #[test]
    fn test_jsonl_reopen_keeps_history() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("alerts.json");

        JsonlAlertLog::open(&path).unwrap().append(&drift_alert()).unwrap();
        let reopened = JsonlAlertLog::open(&path).unwrap();
        reopened.append(&drift_alert()).unwrap();

        let entries = reopened.entries().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].details["drifted_features"][0], "amount");
    }

    #[test]
    fn test_concurrent_appends_do_not_interleave() {
        let dir = tempfile::tempdir().unwrap();
        let log = Arc::new(JsonlAlertLog::open(dir.path().join("alerts.json")).unwrap());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let log = Arc::clone(&log);
                std::thread::spawn(move || {
                    for _ in 0..25 {
                        log.append(&drift_alert()).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(log.entries().unwrap().len(), 200);
    }

    #[test]
    fn test_memory_log() {
        let log = MemoryAlertLog::new();
        log.append(&drift_alert()).unwrap();
        log.append(&drift_alert()).unwrap();
        assert_eq!(log.entries().unwrap().len(), 2);
    }

    #[test]
    fn test_summary_counts_and_recent() {
        let entries = vec![
            drift_alert(),
            Alert::new(AlertType::SystemStatus, Severity::Critical, "offline"),
            Alert::new(AlertType::HighBlockRate, Severity::Warning, "high"),
        ];

        let summary = AlertLogSummary::from_entries(&entries, 2);

        assert_eq!(summary.total, 3);
        assert_eq!(summary.critical, 1);
        assert_eq!(summary.warning, 2);
        assert_eq!(summary.info, 0);
        assert_eq!(summary.recent.len(), 2);
        assert_eq!(summary.recent[1].alert_type, AlertType::HighBlockRate);
    }
}
