//! Market observation records
//!
//! A [`Record`] is one cleaned market observation. A [`QueryRow`] is the
//! inference-time input: the same schema without the modal price, with the
//! arrival date still in its raw textual form.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Date format used by the market price exports (`15-01-2024`)
pub const ARRIVAL_DATE_FORMAT: &str = "%d-%m-%Y";

/// Alternative date format accepted for ad-hoc queries (`2024-01-15`)
pub const ISO_DATE_FORMAT: &str = "%Y-%m-%d";

/// The six categorical columns, in feature order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CategoricalField {
    State,
    District,
    Market,
    Commodity,
    Variety,
    Grade,
}

impl CategoricalField {
    /// All categorical fields in the order they appear in a feature vector
    pub const ALL: [CategoricalField; 6] = [
        CategoricalField::State,
        CategoricalField::District,
        CategoricalField::Market,
        CategoricalField::Commodity,
        CategoricalField::Variety,
        CategoricalField::Grade,
    ];

    /// Column header as it appears in the input CSV
    pub fn column_name(self) -> &'static str {
        match self {
            CategoricalField::State => "State",
            CategoricalField::District => "District",
            CategoricalField::Market => "Market",
            CategoricalField::Commodity => "Commodity",
            CategoricalField::Variety => "Variety",
            CategoricalField::Grade => "Grade",
        }
    }

    /// Position of this field inside [`CategoricalField::ALL`]
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for CategoricalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

/// Anything that carries the six categorical columns
pub trait Categorical {
    fn category(&self, field: CategoricalField) -> &str;
}

/// A cleaned market observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub state: String,
    pub district: String,
    pub market: String,
    pub commodity: String,
    pub variety: String,
    pub grade: String,
    pub arrival_date: NaiveDate,
    pub min_price: f64,
    pub max_price: f64,
    /// Training target
    pub modal_price: f64,
}

impl Categorical for Record {
    fn category(&self, field: CategoricalField) -> &str {
        match field {
            CategoricalField::State => &self.state,
            CategoricalField::District => &self.district,
            CategoricalField::Market => &self.market,
            CategoricalField::Commodity => &self.commodity,
            CategoricalField::Variety => &self.variety,
            CategoricalField::Grade => &self.grade,
        }
    }
}

/// Single-row inference input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRow {
    pub state: String,
    pub district: String,
    pub market: String,
    pub commodity: String,
    pub variety: String,
    pub grade: String,
    /// `dd-mm-yyyy` or `yyyy-mm-dd`
    pub arrival_date: String,
    pub min_price: f64,
    pub max_price: f64,
}

impl QueryRow {
    /// Parse the arrival date, accepting the export format first and ISO second
    pub fn parse_arrival_date(&self) -> Option<NaiveDate> {
        let text = self.arrival_date.trim();
        NaiveDate::parse_from_str(text, ARRIVAL_DATE_FORMAT)
            .or_else(|_| NaiveDate::parse_from_str(text, ISO_DATE_FORMAT))
            .ok()
    }
}

impl Categorical for QueryRow {
    fn category(&self, field: CategoricalField) -> &str {
        match field {
            CategoricalField::State => &self.state,
            CategoricalField::District => &self.district,
            CategoricalField::Market => &self.market,
            CategoricalField::Commodity => &self.commodity,
            CategoricalField::Variety => &self.variety,
            CategoricalField::Grade => &self.grade,
        }
    }
}

impl From<&Record> for QueryRow {
    fn from(record: &Record) -> Self {
        Self {
            state: record.state.clone(),
            district: record.district.clone(),
            market: record.market.clone(),
            commodity: record.commodity.clone(),
            variety: record.variety.clone(),
            grade: record.grade.clone(),
            arrival_date: record.arrival_date.format(ARRIVAL_DATE_FORMAT).to_string(),
            min_price: record.min_price,
            max_price: record.max_price,
        }
    }
}
