//! Tabular transaction dataset loaded from CSV.
//!
//! Every numeric column other than the label, identifier and probability
//! columns is treated as a feature. Empty cells are kept as NaN so row
//! alignment survives; per-feature consumers drop them.

use crate::config::DatasetConfig;
use crate::error::{MonitorError, Result};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{debug, info};

/// Column-major numeric dataset
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    ids: Vec<String>,
    labels: Option<Vec<u8>>,
    probabilities: Option<Vec<f64>>,
    feature_names: Vec<String>,
    columns: Vec<Vec<f64>>,
}

impl Dataset {
    /// Build a dataset from named feature columns of equal length
    pub fn from_columns(columns: Vec<(String, Vec<f64>)>) -> Result<Self> {
        let rows = columns.first().map_or(0, |(_, c)| c.len());
        if let Some((name, _)) = columns.iter().find(|(_, c)| c.len() != rows) {
            return Err(MonitorError::missing(format!(
                "column '{name}' does not have {rows} rows"
            )));
        }
        let (feature_names, columns): (Vec<String>, Vec<Vec<f64>>) = columns.into_iter().unzip();
        Ok(Self {
            ids: (0..rows).map(|i| i.to_string()).collect(),
            labels: None,
            probabilities: None,
            feature_names,
            columns,
        })
    }

    /// Attach ground-truth labels, which must be 0 or 1
    pub fn with_labels(mut self, labels: Vec<u8>) -> Result<Self> {
        if labels.len() != self.len() {
            return Err(MonitorError::invalid_labels(format!(
                "{} labels for {} rows",
                labels.len(),
                self.len()
            )));
        }
        if let Some(bad) = labels.iter().find(|&&l| l > 1) {
            return Err(MonitorError::invalid_labels(format!(
                "labels must be 0 or 1, found {bad}"
            )));
        }
        self.labels = Some(labels);
        Ok(self)
    }

    /// Attach pre-computed fraud probabilities
    pub fn with_probabilities(mut self, probabilities: Vec<f64>) -> Result<Self> {
        if probabilities.len() != self.len() {
            return Err(MonitorError::missing(format!(
                "{} probabilities for {} rows",
                probabilities.len(),
                self.len()
            )));
        }
        self.probabilities = Some(probabilities);
        Ok(self)
    }

    /// Load a CSV file
    pub fn from_csv_path<P: AsRef<Path>>(path: P, layout: &DatasetConfig) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(MonitorError::missing(format!(
                "dataset {}",
                path.display()
            )));
        }
        let file = File::open(path)?;
        let dataset = Self::from_csv_reader(BufReader::new(file), layout)?;
        info!(
            path = %path.display(),
            rows = dataset.len(),
            features = dataset.feature_names.len(),
            "Dataset loaded"
        );
        Ok(dataset)
    }

    /// Parse CSV from any reader
    pub fn from_csv_reader<R: Read>(reader: R, layout: &DatasetConfig) -> Result<Self> {
        let mut reader = csv::Reader::from_reader(reader);
        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

        let mut raw: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
        for record in reader.records() {
            let record = record?;
            for (col, cell) in raw.iter_mut().zip(record.iter()) {
                col.push(cell.trim().to_string());
            }
        }
        let rows = raw.first().map_or(0, Vec::len);

        let position = |name: &str| headers.iter().position(|h| h == name);

        let ids = match position(&layout.id_column) {
            Some(idx) => raw[idx].clone(),
            None => (0..rows).map(|i| i.to_string()).collect(),
        };

        let labels = position(&layout.label_column)
            .map(|idx| parse_labels(&raw[idx]))
            .transpose()?;

        let probabilities = position(&layout.probability_column)
            .and_then(|idx| parse_numeric(&raw[idx]));

        let mut feature_names = Vec::new();
        let mut columns = Vec::new();
        for (name, cells) in headers.iter().zip(&raw) {
            if name == &layout.label_column
                || name == &layout.id_column
                || name == &layout.probability_column
            {
                continue;
            }
            match parse_numeric(cells) {
                Some(values) => {
                    feature_names.push(name.clone());
                    columns.push(values);
                }
                None => debug!(column = %name, "Skipping non-numeric column"),
            }
        }

        Ok(Self {
            ids,
            labels,
            probabilities,
            feature_names,
            columns,
        })
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Raw column including NaN cells
    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.feature_names
            .iter()
            .position(|n| n == name)
            .map(|idx| self.columns[idx].as_slice())
    }

    /// Column values with missing cells dropped
    pub fn feature_values(&self, name: &str) -> Option<Vec<f64>> {
        self.column(name)
            .map(|col| col.iter().copied().filter(|v| !v.is_nan()).collect())
    }

    /// Ground-truth labels, required by the cost analysis
    pub fn labels(&self) -> Result<&[u8]> {
        self.labels
            .as_deref()
            .ok_or_else(|| MonitorError::missing("label column"))
    }

    /// Pre-computed probabilities, if the file carried them
    pub fn probabilities(&self) -> Option<&[f64]> {
        self.probabilities.as_deref()
    }

    /// Number of rows labelled as fraud
    pub fn fraud_count(&self) -> usize {
        self.labels
            .as_ref()
            .map_or(0, |l| l.iter().filter(|&&v| v == 1).count())
    }

    /// One row of features in column order, as model input
    pub fn row(&self, index: usize) -> Vec<f32> {
        self.columns.iter().map(|col| col[index] as f32).collect()
    }

    /// Split into (reference, current) windows: the first
    /// `floor(len * reference_fraction)` rows and the remainder.
    pub fn split(&self, reference_fraction: f64) -> (Dataset, Dataset) {
        let cut = ((self.len() as f64) * reference_fraction).floor() as usize;
        let cut = cut.min(self.len());
        (self.slice(0, cut), self.slice(cut, self.len()))
    }

    fn slice(&self, start: usize, end: usize) -> Dataset {
        Dataset {
            ids: self.ids[start..end].to_vec(),
            labels: self.labels.as_ref().map(|l| l[start..end].to_vec()),
            probabilities: self.probabilities.as_ref().map(|p| p[start..end].to_vec()),
            feature_names: self.feature_names.clone(),
            columns: self
                .columns
                .iter()
                .map(|c| c[start..end].to_vec())
                .collect(),
        }
    }
}

/// Numeric column: every non-empty cell parses as f64, empty cells become NaN
fn parse_numeric(cells: &[String]) -> Option<Vec<f64>> {
    let mut seen_value = false;
    let mut values = Vec::with_capacity(cells.len());
    for cell in cells {
        if cell.is_empty() {
            values.push(f64::NAN);
            continue;
        }
        values.push(cell.parse::<f64>().ok()?);
        seen_value = true;
    }
    seen_value.then_some(values)
}

fn parse_labels(cells: &[String]) -> Result<Vec<u8>> {
    cells
        .iter()
        .map(|cell| match cell.parse::<f64>() {
            Ok(v) if v == 0.0 => Ok(0),
            Ok(v) if v == 1.0 => Ok(1),
            _ => Err(MonitorError::invalid_labels(format!(
                "labels must be 0 or 1, found '{cell}'"
            ))),
        })
        .collect()
}
