//! CSV dataset loading
//!
//! Reads market price exports with the columns State, District, Market,
//! Commodity, Variety, Grade, Arrival_Date, Min Price, Max Price and
//! Modal Price. Prices that are empty or not numeric load as missing; the
//! arrival date stays as raw text until the cleaner parses it.

use agri_price_core::record::ARRIVAL_DATE_FORMAT;
use agri_price_core::Record;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use std::path::Path;
use tracing::debug;

use crate::errors::{Result, TrainerError};

/// Column headers every input file must carry
pub const REQUIRED_COLUMNS: [&str; 10] = [
    "State",
    "District",
    "Market",
    "Commodity",
    "Variety",
    "Grade",
    "Arrival_Date",
    "Min Price",
    "Max Price",
    "Modal Price",
];

/// One unvalidated row of the input file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    #[serde(rename = "State")]
    pub state: String,
    #[serde(rename = "District")]
    pub district: String,
    #[serde(rename = "Market")]
    pub market: String,
    #[serde(rename = "Commodity")]
    pub commodity: String,
    #[serde(rename = "Variety")]
    pub variety: String,
    #[serde(rename = "Grade")]
    pub grade: String,
    #[serde(rename = "Arrival_Date")]
    pub arrival_date: String,
    #[serde(rename = "Min Price", deserialize_with = "csv::invalid_option")]
    pub min_price: Option<f64>,
    #[serde(rename = "Max Price", deserialize_with = "csv::invalid_option")]
    pub max_price: Option<f64>,
    #[serde(rename = "Modal Price", deserialize_with = "csv::invalid_option")]
    pub modal_price: Option<f64>,
}

impl From<&Record> for RawRecord {
    fn from(record: &Record) -> Self {
        Self {
            state: record.state.clone(),
            district: record.district.clone(),
            market: record.market.clone(),
            commodity: record.commodity.clone(),
            variety: record.variety.clone(),
            grade: record.grade.clone(),
            arrival_date: record.arrival_date.format(ARRIVAL_DATE_FORMAT).to_string(),
            min_price: Some(record.min_price),
            max_price: Some(record.max_price),
            modal_price: Some(record.modal_price),
        }
    }
}

/// Load all rows from a CSV file
pub fn load_csv<P: AsRef<Path>>(path: P) -> Result<Vec<RawRecord>> {
    let path = path.as_ref();
    let file = std::fs::File::open(path).map_err(|e| {
        TrainerError::Dataset(format!("failed to open {}: {e}", path.display()))
    })?;
    let records = from_reader(file)?;
    debug!(rows = records.len(), "loaded {}", path.display());
    Ok(records)
}

/// Load all rows from any CSV source
pub fn from_reader<R: Read>(reader: R) -> Result<Vec<RawRecord>> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|col| !headers.iter().any(|h| h == *col))
        .collect();
    if !missing.is_empty() {
        return Err(TrainerError::Dataset(format!(
            "missing required columns: {}",
            missing.join(", ")
        )));
    }

    let mut records = Vec::new();
    for (i, row) in rdr.deserialize::<RawRecord>().enumerate() {
        let record = row.map_err(|e| {
            // +2: one for the header line, one for 1-based numbering
            TrainerError::Dataset(format!("line {}: {e}", i + 2))
        })?;
        records.push(record);
    }
    Ok(records)
}

/// Write rows back out in the input schema
pub fn write_csv<W: Write>(writer: W, records: &[RawRecord]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for record in records {
        wtr.serialize(record)?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;
    use tempfile::NamedTempFile;

    const HEADER: &str =
        "State,District,Market,Commodity,Variety,Grade,Arrival_Date,Min Price,Max Price,Modal Price";

    #[test]
    fn test_load_csv() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        writeln!(file, "{HEADER}")?;
        writeln!(file, "Kerala,Kollam,Punalur,Banana,Nendra,FAQ,01-03-2024,3000,3400,3200")?;
        writeln!(file, "Kerala,Kollam,Punalur,Banana,Nendra,FAQ,02-03-2024,,n/a,3300")?;
        file.flush()?;

        let records = load_csv(file.path())?;
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].commodity, "Banana");
        assert_eq!(records[0].arrival_date, "01-03-2024");
        assert_eq!(records[0].modal_price, Some(3200.0));
        assert_eq!(records[1].min_price, None);
        assert_eq!(records[1].max_price, None);
        Ok(())
    }

    #[test]
    fn test_quoted_fields_and_whitespace() -> Result<()> {
        let data = format!(
            "{HEADER}\n\"Tamil Nadu\", Salem ,\"Salem(Uzhavar Sandhai)\",\"Onion, Small\",Local,FAQ,05-01-2024,40,60,50\n"
        );
        let records = from_reader(data.as_bytes())?;
        assert_eq!(records[0].state, "Tamil Nadu");
        assert_eq!(records[0].district, "Salem");
        assert_eq!(records[0].commodity, "Onion, Small");
        Ok(())
    }

    #[test]
    fn test_missing_column_is_rejected() {
        let data = "State,District,Market,Commodity,Variety,Grade,Arrival_Date,Min Price,Max Price\n";
        let err = from_reader(data.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("Modal Price"));
    }

    #[test]
    fn test_write_then_read() -> Result<()> {
        let data = format!("{HEADER}\nA,B,C,D,E,F,09-09-2023,1.5,2.25,\n");
        let records = from_reader(data.as_bytes())?;

        let mut out = Vec::new();
        write_csv(&mut out, &records)?;
        assert_eq!(from_reader(out.as_slice())?, records);
        Ok(())
    }
}
