//! Property tests for the data cleaner

use agri_price_trainer::{DataCleaner, RawRecord};
use chrono::{Days, NaiveDate};
use proptest::prelude::*;

/// An evenly spaced price column in random order, with a few cells
/// overwritten by missing values and by far outliers.
///
/// At most `n / 20` cells of each kind are damaged. Recleaning is only a
/// no-op while the imputed block stays that small: a large block of values
/// at the median shrinks the IQR enough for the second pass to cut genuine
/// values (see the cleaner's heavy-imputation unit test).
fn price_column(n: usize) -> impl Strategy<Value = Vec<Option<f64>>> {
    let damaged = n / 20;
    (
        1u32..50,
        proptest::collection::vec(0..n, 0..=damaged),
        proptest::collection::vec(0..n, 0..=damaged),
    )
        .prop_flat_map(move |(step, missing, outliers)| {
            let values: Vec<f64> = (0..n).map(|i| 100.0 + f64::from(i as u32 * step)).collect();
            Just(values).prop_shuffle().prop_map(move |values| {
                let mut column: Vec<Option<f64>> = values.into_iter().map(Some).collect();
                for &i in &missing {
                    column[i] = None;
                }
                for &i in &outliers {
                    column[i] = Some(1.0e9);
                }
                column
            })
        })
}

fn dataset() -> impl Strategy<Value = Vec<RawRecord>> {
    (20usize..60).prop_flat_map(|n| {
        (price_column(n), price_column(n), price_column(n)).prop_map(move |(min, max, modal)| {
            let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
            (0..n)
                .map(|i| RawRecord {
                    state: "Bihar".into(),
                    district: "Patna".into(),
                    market: "Patna".into(),
                    commodity: ["Rice", "Maize", "Lentil"][i % 3].into(),
                    variety: "Common".into(),
                    grade: "FAQ".into(),
                    arrival_date: (start + Days::new(i as u64)).format("%d-%m-%Y").to_string(),
                    min_price: min[i],
                    max_price: max[i],
                    modal_price: modal[i],
                })
                .collect()
        })
    })
}

proptest! {
    #[test]
    fn cleaning_cleaned_data_changes_nothing(raw in dataset()) {
        let cleaner = DataCleaner::default();
        let (once, first) = cleaner.clean(&raw);
        prop_assert_eq!(first.output_rows, raw.len());

        let again: Vec<RawRecord> = once.iter().map(RawRecord::from).collect();
        let (twice, second) = cleaner.clean(&again);
        prop_assert_eq!(&once, &twice);
        prop_assert_eq!(second.outliers, [0, 0, 0]);
        prop_assert_eq!(second.imputed, [0, 0, 0]);
    }

    #[test]
    fn cleaned_prices_are_finite(raw in dataset()) {
        let (records, _) = DataCleaner::default().clean(&raw);
        for r in &records {
            prop_assert!(r.min_price.is_finite());
            prop_assert!(r.max_price.is_finite());
            prop_assert!(r.modal_price.is_finite());
            prop_assert!(r.modal_price < 1.0e9);
        }
    }
}
