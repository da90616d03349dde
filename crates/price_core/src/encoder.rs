//! Label encoding for categorical columns
//!
//! Each [`CategoryEncoder`] maps the distinct strings of one column to dense
//! integer codes in sorted string order. The six encoders of a training run
//! are bundled into a versioned [`CategoryEncoders`] object that must be
//! persisted together with the models trained on its codes.

use crate::record::{Categorical, CategoricalField, QueryRow, Record};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Current on-disk format of [`CategoryEncoders`]
pub const ENCODER_FORMAT_VERSION: u32 = 1;

/// Dense string → code mapping for one categorical column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryEncoder {
    pub field: CategoricalField,
    codes: BTreeMap<String, i64>,
    /// Code of the most frequent value seen at fit time
    mode_code: i64,
}

impl CategoryEncoder {
    /// Fit an encoder over every value of a column.
    ///
    /// Codes are assigned in sorted order, so the same set of values always
    /// produces the same mapping.
    pub fn fit<'a, I>(field: CategoricalField, values: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for value in values {
            *counts.entry(value.to_string()).or_default() += 1;
        }

        let mut codes = BTreeMap::new();
        let mut mode_code = 0;
        let mut mode_count = 0;
        for (code, (value, count)) in counts.into_iter().enumerate() {
            let code = code as i64;
            if count > mode_count {
                mode_count = count;
                mode_code = code;
            }
            codes.insert(value, code);
        }

        Self {
            field,
            codes,
            mode_code,
        }
    }

    /// Code for `value`, or `None` if it was not seen at fit time
    pub fn encode(&self, value: &str) -> Option<i64> {
        self.codes.get(value).copied()
    }

    /// Code used in place of unseen values when the fallback policy is active
    pub fn fallback_code(&self) -> i64 {
        self.mode_code
    }

    /// Number of distinct values
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

/// The fitted encoders of one training run, one per categorical field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryEncoders {
    pub version: u32,
    encoders: Vec<CategoryEncoder>,
}

impl CategoryEncoders {
    /// Fit all six encoders over the training records plus any reference
    /// rows whose values must also receive codes.
    pub fn fit(records: &[Record], reference: &[QueryRow]) -> Self {
        let encoders = CategoricalField::ALL
            .iter()
            .map(|&field| {
                let values = records
                    .iter()
                    .map(|r| r.category(field))
                    .chain(reference.iter().map(|q| q.category(field)));
                CategoryEncoder::fit(field, values)
            })
            .collect();

        Self {
            version: ENCODER_FORMAT_VERSION,
            encoders,
        }
    }

    /// Encoder for a single field
    pub fn get(&self, field: CategoricalField) -> &CategoryEncoder {
        &self.encoders[field.index()]
    }

    /// Encode one value of a field
    pub fn encode(&self, field: CategoricalField, value: &str) -> Option<i64> {
        self.get(field).encode(value)
    }

    /// Check the bundle has one encoder per field in feature order
    pub fn is_well_formed(&self) -> bool {
        self.version == ENCODER_FORMAT_VERSION
            && self.encoders.len() == CategoricalField::ALL.len()
            && self
                .encoders
                .iter()
                .zip(CategoricalField::ALL.iter())
                .all(|(encoder, field)| encoder.field == *field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_follow_sorted_order() {
        let encoder = CategoryEncoder::fit(
            CategoricalField::Commodity,
            ["Tomato", "Banana", "Onion", "Banana"],
        );
        assert_eq!(encoder.len(), 3);
        assert_eq!(encoder.encode("Banana"), Some(0));
        assert_eq!(encoder.encode("Onion"), Some(1));
        assert_eq!(encoder.encode("Tomato"), Some(2));
        assert_eq!(encoder.encode("Potato"), None);
    }

    #[test]
    fn test_same_value_same_code_regardless_of_order() {
        let a = CategoryEncoder::fit(CategoricalField::Grade, ["FAQ", "Medium", "FAQ"]);
        let b = CategoryEncoder::fit(CategoricalField::Grade, ["Medium", "FAQ"]);
        assert_eq!(a.encode("Medium"), b.encode("Medium"));
        assert_eq!(a.encode("FAQ"), b.encode("FAQ"));
    }

    #[test]
    fn test_fallback_is_most_frequent() {
        let encoder = CategoryEncoder::fit(
            CategoricalField::Market,
            ["Azadpur", "Vashi", "Vashi", "Bowenpally"],
        );
        assert_eq!(encoder.fallback_code(), encoder.encode("Vashi").unwrap());
    }

    #[test]
    fn test_reference_rows_extend_vocabulary() {
        let reference = vec![QueryRow {
            state: "Goa".into(),
            district: "North Goa".into(),
            market: "Mapusa".into(),
            commodity: "Cashew".into(),
            variety: "Other".into(),
            grade: "FAQ".into(),
            arrival_date: "01-01-2024".into(),
            min_price: 1.0,
            max_price: 2.0,
        }];
        let encoders = CategoryEncoders::fit(&[], &reference);
        assert!(encoders.is_well_formed());
        assert_eq!(encoders.encode(CategoricalField::Commodity, "Cashew"), Some(0));
        assert_eq!(encoders.get(CategoricalField::State).len(), 1);
    }
}
