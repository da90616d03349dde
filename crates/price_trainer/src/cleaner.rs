//! Data cleaning
//!
//! Turns raw CSV rows into validated [`Record`]s:
//! 1. Parse Arrival_Date; rows that do not parse are dropped
//! 2. Per price column, values outside the IQR fences become missing
//! 3. Missing prices are imputed with the column median computed after step 2
//!
//! Columns are handled independently; Min/Modal/Max are never compared or
//! reordered against each other.

use agri_price_core::stats;
use agri_price_core::Record;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::CleaningConfig;
use crate::dataset::RawRecord;

/// The three price columns, in record order
pub const PRICE_COLUMNS: [&str; 3] = ["Min Price", "Max Price", "Modal Price"];

/// Counters describing one cleaning pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleaningReport {
    pub input_rows: usize,
    pub dropped_bad_date: usize,
    /// Rows lost because a price column had no observed value to impute from
    pub dropped_unimputable: usize,
    /// Per price column, in [`PRICE_COLUMNS`] order
    pub outliers: [usize; 3],
    /// Per price column, in [`PRICE_COLUMNS`] order
    pub imputed: [usize; 3],
    pub output_rows: usize,
}

/// Inclusive outlier fences of one column
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fences {
    pub lower: f64,
    pub upper: f64,
}

impl Fences {
    /// `[Q1 - k*IQR, Q3 + k*IQR]` over the finite values, `None` if there are none
    pub fn from_values(values: &[f64], multiplier: f64) -> Option<Self> {
        let sorted = stats::sorted_finite(values);
        let q1 = stats::quantile_sorted(&sorted, 0.25)?;
        let q3 = stats::quantile_sorted(&sorted, 0.75)?;
        let iqr = q3 - q1;
        Some(Self {
            lower: q1 - multiplier * iqr,
            upper: q3 + multiplier * iqr,
        })
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && value <= self.upper
    }
}

/// Cleans raw rows into training records
#[derive(Debug, Clone)]
pub struct DataCleaner {
    iqr_multiplier: f64,
    date_format: String,
}

impl Default for DataCleaner {
    fn default() -> Self {
        Self::new(&CleaningConfig::default())
    }
}

impl DataCleaner {
    pub fn new(config: &CleaningConfig) -> Self {
        Self {
            iqr_multiplier: config.iqr_multiplier,
            date_format: config.date_format.clone(),
        }
    }

    /// Clean `raw` without touching it; returns the surviving rows in input order
    pub fn clean(&self, raw: &[RawRecord]) -> (Vec<Record>, CleaningReport) {
        let mut report = CleaningReport {
            input_rows: raw.len(),
            ..Default::default()
        };

        let mut dated: Vec<(&RawRecord, NaiveDate)> = Vec::with_capacity(raw.len());
        for (i, row) in raw.iter().enumerate() {
            match NaiveDate::parse_from_str(row.arrival_date.trim(), &self.date_format) {
                Ok(date) => dated.push((row, date)),
                Err(e) => {
                    debug!(row = i, date = %row.arrival_date, "dropping row: {e}");
                    report.dropped_bad_date += 1;
                }
            }
        }

        // Missing is NaN from here on
        let mut columns: [Vec<f64>; 3] = [
            dated.iter().map(|(r, _)| missing_as_nan(r.min_price)).collect(),
            dated.iter().map(|(r, _)| missing_as_nan(r.max_price)).collect(),
            dated.iter().map(|(r, _)| missing_as_nan(r.modal_price)).collect(),
        ];

        let mut unimputable = false;
        for (col, values) in columns.iter_mut().enumerate() {
            report.outliers[col] = self.suppress_outliers(values);
            match stats::median(values) {
                Some(median) => {
                    for v in values.iter_mut().filter(|v| v.is_nan()) {
                        *v = median;
                        report.imputed[col] += 1;
                    }
                }
                None if !values.is_empty() => {
                    warn!(column = PRICE_COLUMNS[col], "no observed values to impute from");
                    unimputable = true;
                }
                None => {}
            }
        }

        let records: Vec<Record> = if unimputable {
            report.dropped_unimputable = dated.len();
            Vec::new()
        } else {
            dated
                .iter()
                .enumerate()
                .map(|(i, (row, date))| Record {
                    state: row.state.clone(),
                    district: row.district.clone(),
                    market: row.market.clone(),
                    commodity: row.commodity.clone(),
                    variety: row.variety.clone(),
                    grade: row.grade.clone(),
                    arrival_date: *date,
                    min_price: columns[0][i],
                    max_price: columns[1][i],
                    modal_price: columns[2][i],
                })
                .collect()
        };

        report.output_rows = records.len();
        info!(
            input = report.input_rows,
            output = report.output_rows,
            bad_dates = report.dropped_bad_date,
            outliers = ?report.outliers,
            imputed = ?report.imputed,
            "cleaned dataset"
        );
        (records, report)
    }

    /// Replace values outside the fences by NaN, returning how many were replaced
    fn suppress_outliers(&self, values: &mut [f64]) -> usize {
        let Some(fences) = Fences::from_values(values, self.iqr_multiplier) else {
            return 0;
        };
        let mut suppressed = 0;
        for v in values.iter_mut().filter(|v| v.is_finite()) {
            if !fences.contains(*v) {
                *v = f64::NAN;
                suppressed += 1;
            }
        }
        suppressed
    }
}

fn missing_as_nan(value: Option<f64>) -> f64 {
    match value {
        Some(v) if v.is_finite() => v,
        _ => f64::NAN,
    }
}
