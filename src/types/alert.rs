//! Monitoring alert data structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Alert severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
            Severity::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Condition that raised the alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlertType {
    #[serde(rename = "Data Drift")]
    DataDrift,
    #[serde(rename = "High Block Rate")]
    HighBlockRate,
    #[serde(rename = "System Status")]
    SystemStatus,
}

impl AlertType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertType::DataDrift => "Data Drift",
            AlertType::HighBlockRate => "High Block Rate",
            AlertType::SystemStatus => "System Status",
        }
    }
}

impl fmt::Display for AlertType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Monitoring alert. Written once to the alert log and never modified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    /// Creation time
    pub timestamp: DateTime<Utc>,

    #[serde(rename = "type")]
    pub alert_type: AlertType,

    pub severity: Severity,

    /// Human readable summary
    pub message: String,

    /// Structured context (drifted feature names, measured rate, ...)
    pub details: serde_json::Value,
}

impl Alert {
    /// Create a new alert stamped with the current time and empty details
    pub fn new(alert_type: AlertType, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            alert_type,
            severity,
            message: message.into(),
            details: serde_json::Value::Object(serde_json::Map::new()),
        }
    }

    /// Attach structured details to the alert
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = details;
        self
    }
}
