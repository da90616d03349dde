//! Feature engineering for the price models
//!
//! Feature vector layout (13 columns, fixed order):
//! 0-5. Encoded State, District, Market, Commodity, Variety, Grade
//! 6. Month (1-12)
//! 7. Year
//! 8. DayOfWeek (Monday = 0)
//! 9. Min Price
//! 10. Max Price
//! 11. Rolling mean of the modal price within the commodity group
//! 12. Rolling standard deviation of the modal price within the commodity group
//!
//! The order is part of every trained model's contract.

use crate::encoder::CategoryEncoders;
use crate::errors::{CoreError, Result};
use crate::record::{Categorical, CategoricalField, QueryRow, Record};
use crate::stats;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use tracing::debug;

/// Number of columns in a feature vector
pub const FEATURE_COUNT: usize = 13;

/// Column names in feature order
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "State_Encoded",
    "District_Encoded",
    "Market_Encoded",
    "Commodity_Encoded",
    "Variety_Encoded",
    "Grade_Encoded",
    "Month",
    "Year",
    "DayOfWeek",
    "Min Price",
    "Max Price",
    "Price_Rolling_Mean",
    "Price_Rolling_Std",
];

pub const MONTH: usize = 6;
pub const YEAR: usize = 7;
pub const DAY_OF_WEEK: usize = 8;
pub const MIN_PRICE: usize = 9;
pub const MAX_PRICE: usize = 10;
pub const ROLLING_MEAN: usize = 11;
pub const ROLLING_STD: usize = 12;

/// Default trailing window for the rolling statistics
pub const DEFAULT_ROLLING_WINDOW: usize = 3;

/// One model input row
pub type FeatureVector = [f64; FEATURE_COUNT];

/// Month, year and day-of-week derived from an arrival date
pub fn calendar_features(date: NaiveDate) -> [f64; 3] {
    [
        f64::from(date.month()),
        f64::from(date.year()),
        f64::from(date.weekday().num_days_from_monday()),
    ]
}

/// Assemble a feature vector from its parts in the fixed column order
pub fn assemble(
    codes: [i64; 6],
    date: NaiveDate,
    min_price: f64,
    max_price: f64,
    rolling_mean: f64,
    rolling_std: f64,
) -> FeatureVector {
    let mut row = [0.0; FEATURE_COUNT];
    for (slot, code) in row.iter_mut().zip(codes.iter()) {
        *slot = *code as f64;
    }
    let [month, year, dow] = calendar_features(date);
    row[MONTH] = month;
    row[YEAR] = year;
    row[DAY_OF_WEEK] = dow;
    row[MIN_PRICE] = min_price;
    row[MAX_PRICE] = max_price;
    row[ROLLING_MEAN] = rolling_mean;
    row[ROLLING_STD] = rolling_std;
    row
}

/// Rolling statistics for a single ad-hoc row.
///
/// No price history is available at inference time, so the trailing window
/// is approximated by the two quoted prices: the mean is their midpoint and
/// the deviation is the sample standard deviation of the pair. Training rows
/// use real history, so this is a known source of train/serve skew.
pub fn approximate_rolling(min_price: f64, max_price: f64) -> (f64, f64) {
    let mean = (min_price + max_price) / 2.0;
    let std = stats::sample_std(&[min_price, max_price]);
    (mean, std)
}

/// Trailing mean and sample deviation of `target` per group, in row order.
///
/// Windows hold at most `window` values and at least one, so the first rows
/// of each group use partial windows. A single-value window has an undefined
/// deviation and yields `NaN`.
pub fn rolling_by_group<K>(keys: &[K], target: &[f64], window: usize) -> Vec<(f64, f64)>
where
    K: std::hash::Hash + Eq,
{
    let window = window.max(1);
    let mut history: HashMap<&K, VecDeque<f64>> = HashMap::new();

    keys.iter()
        .zip(target.iter())
        .map(|(key, &value)| {
            let trail = history.entry(key).or_default();
            trail.push_back(value);
            if trail.len() > window {
                trail.pop_front();
            }
            let values: Vec<f64> = trail.iter().copied().collect();
            let mean = values.iter().sum::<f64>() / values.len() as f64;
            (mean, stats::sample_std(&values))
        })
        .collect()
}

/// Replace non-finite cells by the median of the finite cells of their column.
///
/// Returns the medians used, one per column (0.0 for a column without any
/// finite value).
pub fn impute_non_finite(rows: &mut [FeatureVector]) -> [f64; FEATURE_COUNT] {
    let mut medians = [0.0; FEATURE_COUNT];
    for (col, median) in medians.iter_mut().enumerate() {
        let column: Vec<f64> = rows.iter().map(|r| r[col]).collect();
        if column.iter().all(|v| v.is_finite()) {
            continue;
        }
        *median = stats::median(&column).unwrap_or(0.0);
        let mut replaced = 0usize;
        for row in rows.iter_mut() {
            if !row[col].is_finite() {
                row[col] = *median;
                replaced += 1;
            }
        }
        debug!(
            column = FEATURE_NAMES[col],
            replaced,
            median = *median,
            "imputed non-finite feature values"
        );
    }
    medians
}

/// Output of [`FeatureBuilder::build`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureMatrix {
    pub rows: Vec<FeatureVector>,
    pub targets: Vec<f64>,
    pub encoders: CategoryEncoders,
}

impl FeatureMatrix {
    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Check that rows and targets line up and every cell is finite
    pub fn validate(&self) -> Result<()> {
        if self.rows.len() != self.targets.len() {
            return Err(CoreError::ShapeMismatch(format!(
                "{} feature rows but {} targets",
                self.rows.len(),
                self.targets.len()
            )));
        }
        if let Some(i) = self.rows.iter().position(|r| r.iter().any(|v| !v.is_finite())) {
            return Err(CoreError::ValidationFailed(format!(
                "row {i} contains a non-finite feature"
            )));
        }
        Ok(())
    }
}

/// Builds model inputs from cleaned records
#[derive(Debug, Clone)]
pub struct FeatureBuilder {
    rolling_window: usize,
    reference: Vec<QueryRow>,
}

impl Default for FeatureBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_ROLLING_WINDOW)
    }
}

impl FeatureBuilder {
    pub fn new(rolling_window: usize) -> Self {
        Self {
            rolling_window: rolling_window.max(1),
            reference: Vec::new(),
        }
    }

    /// Extra rows whose categorical values must receive codes even though
    /// they are not part of the training data.
    pub fn with_reference_rows(mut self, rows: Vec<QueryRow>) -> Self {
        self.reference = rows;
        self
    }

    /// Derive features, fit encoders and compute rolling statistics
    pub fn build(&self, records: &[Record]) -> FeatureMatrix {
        let encoders = CategoryEncoders::fit(records, &self.reference);

        let commodities: Vec<&str> = records.iter().map(|r| r.commodity.as_str()).collect();
        let targets: Vec<f64> = records.iter().map(|r| r.modal_price).collect();
        let rolling = rolling_by_group(&commodities, &targets, self.rolling_window);

        let mut rows: Vec<FeatureVector> = records
            .iter()
            .zip(rolling.iter())
            .map(|(record, &(mean, std))| {
                let mut codes = [0i64; 6];
                for field in CategoricalField::ALL {
                    // Fitted on these very records, so every value has a code.
                    codes[field.index()] = encoders
                        .encode(field, record.category(field))
                        .unwrap_or_default();
                }
                assemble(
                    codes,
                    record.arrival_date,
                    record.min_price,
                    record.max_price,
                    mean,
                    std,
                )
            })
            .collect();

        impute_non_finite(&mut rows);

        debug!(
            rows = rows.len(),
            window = self.rolling_window,
            "built feature matrix"
        );

        FeatureMatrix {
            rows,
            targets,
            encoders,
        }
    }
}
