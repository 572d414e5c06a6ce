//! Result collection and the persisted CSV report.

use std::{
    fs,
    path::{Path, PathBuf},
};

use chrono::Local;
use log::info;
use thiserror::Error;

use crate::labels::ChannelLabels;

/// One entry per channel visit.
#[derive(Clone, Debug)]
pub struct MeasurementRecord {
    /// Channel index, 0..=7.
    pub index: usize,
    /// Measured voltage. Not-a-number when the reading failed or was unusable.
    pub value: f64,
    /// Lower limit of the pass/fail window.
    pub lower: f64,
    /// Upper limit of the pass/fail window.
    pub upper: f64,
    /// Program-side verdict. Always `false` when `value` is not a number.
    pub passed: bool,
    /// Error text for this visit: the device error when one occurred, `"NaN"` for an unusable
    /// reading without a more specific cause, `None` otherwise.
    pub error: Option<String>,
}

/// Errors while persisting the report.
#[derive(Debug, Error)]
pub enum ReportError {
    /// The report file could not be written.
    #[error(transparent)]
    Csv(#[from] csv::Error),
    /// The report directory could not be created or the file could not be flushed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Collects one [`MeasurementRecord`] per channel visit and writes the report.
///
/// The report is a UTF-8 CSV file named by a timestamp taken when the log is created, one file
/// per sweep. Data rows carry the resolved channel label, the value formatted to six decimals
/// (empty when not a number), the window, `PASS`/`FAIL`, and the error text. After a blank
/// separator row follow the summary rows: `Total`, `Fail`, `Max`, `Min`, `Average`, `Std Dev`
/// (statistics over the real-numbered values only, blank when there are none), and the constant
/// `CPK,None` placeholder (a process capability index is not computed here).
pub struct SweepLog {
    rows: Vec<MeasurementRecord>,
    labels: ChannelLabels,
    log_dir: PathBuf,
    stamp: String,
}

impl SweepLog {
    /// Create an empty log that will write its report into the given directory.
    pub fn new(log_dir: impl Into<PathBuf>, labels: ChannelLabels) -> Self {
        SweepLog {
            rows: Vec::new(),
            labels,
            log_dir: log_dir.into(),
            stamp: Local::now().format("%Y%m%d_%H%M%S").to_string(),
        }
    }

    /// Append one record. Records are kept in insertion order.
    pub fn add_row(&mut self, record: MeasurementRecord) {
        self.rows.push(record);
    }

    /// The records collected so far, in visit order.
    pub fn rows(&self) -> &[MeasurementRecord] {
        &self.rows
    }

    /// The path the report will be written to.
    pub fn csv_path(&self) -> PathBuf {
        self.log_dir.join(format!("{}.csv", self.stamp))
    }

    /// Write the report and return its path.
    pub fn save_csv(&self) -> Result<PathBuf, ReportError> {
        fs::create_dir_all(&self.log_dir)?;
        let path = self.csv_path();
        self.write_csv(&path)?;
        info!("Report written to {}", path.display());
        Ok(path)
    }

    fn write_csv(&self, path: &Path) -> Result<(), ReportError> {
        let mut buf = {
            let mut writer = csv::Writer::from_writer(Vec::new());
            writer.write_record(["Pin", "Value", "Lower", "Upper", "Result", "Error"])?;
            for row in &self.rows {
                let value = if row.value.is_nan() {
                    String::new()
                } else {
                    format!("{:.6}", row.value)
                };
                writer.write_record([
                    self.labels.name(row.index),
                    value,
                    row.lower.to_string(),
                    row.upper.to_string(),
                    if row.passed { "PASS" } else { "FAIL" }.to_string(),
                    row.error.clone().unwrap_or_default(),
                ])?;
            }
            writer
                .into_inner()
                .map_err(csv::IntoInnerError::into_error)?
        };

        // Blank separator row between the data and the summary.
        buf.push(b'\n');

        let values: Vec<f64> = self
            .rows
            .iter()
            .map(|row| row.value)
            .filter(|value| !value.is_nan())
            .collect();
        let total = self.rows.len().to_string();
        let fail = self
            .rows
            .iter()
            .filter(|row| !row.passed)
            .count()
            .to_string();
        let max = fmt_stat(values.iter().copied().reduce(f64::max));
        let min = fmt_stat(values.iter().copied().reduce(f64::min));
        let average = fmt_stat(mean(&values));
        let std_dev = fmt_stat(pstdev(&values));

        let summary = {
            let mut writer = csv::Writer::from_writer(Vec::new());
            writer.write_record(["Total", total.as_str()])?;
            writer.write_record(["Fail", fail.as_str()])?;
            writer.write_record(["Max", max.as_str()])?;
            writer.write_record(["Min", min.as_str()])?;
            writer.write_record(["Average", average.as_str()])?;
            writer.write_record(["Std Dev", std_dev.as_str()])?;
            writer.write_record(["CPK", "None"])?;
            writer
                .into_inner()
                .map_err(csv::IntoInnerError::into_error)?
        };
        buf.extend_from_slice(&summary);

        fs::write(path, buf)?;
        Ok(())
    }
}

/// Arithmetic mean, `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population standard deviation, `None` for an empty slice.
pub fn pstdev(values: &[f64]) -> Option<f64> {
    let mean = mean(values)?;
    let variance =
        values.iter().map(|value| (value - mean).powi(2)).sum::<f64>() / values.len() as f64;
    Some(variance.sqrt())
}

fn fmt_stat(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.6}")).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(index: usize, value: f64, passed: bool) -> MeasurementRecord {
        MeasurementRecord {
            index,
            value,
            lower: -10.0,
            upper: 10.0,
            passed,
            error: None,
        }
    }

    #[test]
    fn test_mean_and_pstdev() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_eq!(mean(&values), Some(5.0));
        assert_eq!(pstdev(&values), Some(2.0));
    }

    #[test]
    fn test_stats_blank_without_values() {
        assert_eq!(mean(&[]), None);
        assert_eq!(pstdev(&[]), None);
        assert_eq!(fmt_stat(None), "");
    }

    #[test]
    fn test_report_layout() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = SweepLog::new(dir.path(), ChannelLabels::default());
        log.add_row(record(0, 1.5, true));
        log.add_row(MeasurementRecord {
            error: Some("NaN".to_string()),
            passed: false,
            ..record(1, f64::NAN, false)
        });

        let path = log.save_csv().unwrap();
        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();

        assert_eq!(lines[0], "Pin,Value,Lower,Upper,Result,Error");
        assert_eq!(lines[1], "Y0,1.500000,-10,10,PASS,");
        assert_eq!(lines[2], "Y1,,-10,10,FAIL,NaN");
        assert_eq!(lines[3], "");
        assert_eq!(lines[4], "Total,2");
        assert_eq!(lines[5], "Fail,1");
        assert_eq!(lines[6], "Max,1.500000");
        assert_eq!(lines[7], "Min,1.500000");
        assert_eq!(lines[8], "Average,1.500000");
        assert_eq!(lines[9], "Std Dev,0.000000");
        assert_eq!(lines[10], "CPK,None");
    }

    #[test]
    fn test_report_blank_stats_when_all_nan() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = SweepLog::new(dir.path(), ChannelLabels::default());
        log.add_row(record(0, f64::NAN, false));

        let path = log.save_csv().unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("Max,\n"));
        assert!(content.contains("Average,\n"));
        assert!(content.contains("Std Dev,\n"));
    }
}
