//! Dataset schema and validation.
//!
//! Sites submit plain tabular text; this module checks it against the fixed
//! cardiac schema and splits it into a feature matrix and label vector in
//! canonical column order. No imputation or scaling happens here.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Canonical feature column order. Every trained model expects inference
/// vectors in exactly this order.
pub const FEATURE_COLUMNS: [&str; 13] = [
    "age", "sex", "cp", "trestbps", "chol", "fbs", "restecg", "thalach", "exang", "oldpeak",
    "slope", "ca", "thal",
];

pub const TARGET_COLUMN: &str = "target";
pub const FEATURE_COUNT: usize = 13;

/// Minimum data rows a site must contribute.
pub const MIN_ROWS: usize = 10;

/// One inference input in canonical column order.
pub type FeatureRow = [f64; FEATURE_COUNT];

/// Validated training data: features in canonical order plus binary labels.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dataset {
    pub features: Vec<FeatureRow>,
    pub labels: Vec<usize>,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

/// Parse and validate raw tabular text (CSV with a header row).
///
/// Columns may appear in any order in the input; the returned matrix is
/// always in [`FEATURE_COLUMNS`] order. Fails when required columns are
/// absent, when fewer than [`MIN_ROWS`] data rows are present, or when a
/// required cell is not a finite number.
pub fn parse_dataset(text: &str) -> Result<Dataset, CoreError> {
    let mut lines = text.lines().filter(|l| !l.trim().is_empty());
    let header = lines.next().unwrap_or("");
    let columns: HashMap<&str, usize> = header
        .split(',')
        .map(|c| c.trim())
        .enumerate()
        .map(|(i, c)| (c, i))
        .collect();

    let missing: Vec<String> = FEATURE_COLUMNS
        .iter()
        .chain(std::iter::once(&TARGET_COLUMN))
        .filter(|c| !columns.contains_key(**c))
        .map(|c| c.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(CoreError::Schema { missing });
    }

    let rows: Vec<&str> = lines.collect();
    if rows.len() < MIN_ROWS {
        return Err(CoreError::InsufficientRows { rows: rows.len(), min: MIN_ROWS });
    }

    let target_idx = columns[TARGET_COLUMN];
    let feature_idx: Vec<usize> = FEATURE_COLUMNS.iter().map(|c| columns[c]).collect();

    let mut features = Vec::with_capacity(rows.len());
    let mut labels = Vec::with_capacity(rows.len());
    for (row_no, line) in rows.iter().enumerate() {
        let fields: Vec<&str> = line.split(',').map(|f| f.trim()).collect();
        let mut row = [0.0; FEATURE_COUNT];
        for (slot, (&idx, name)) in feature_idx.iter().zip(FEATURE_COLUMNS).enumerate() {
            row[slot] = parse_cell(&fields, idx, name, row_no)?;
        }
        let target = parse_cell(&fields, target_idx, TARGET_COLUMN, row_no)?;
        features.push(row);
        labels.push((target != 0.0) as usize);
    }

    Ok(Dataset { features, labels })
}

fn parse_cell(fields: &[&str], idx: usize, column: &str, row: usize) -> Result<f64, CoreError> {
    let invalid = || CoreError::InvalidValue { column: column.to_string(), row };
    let value: f64 = fields.get(idx).ok_or_else(invalid)?.parse().map_err(|_| invalid())?;
    // "NaN" and "inf" parse successfully; they must never reach split search.
    if !value.is_finite() {
        return Err(invalid());
    }
    Ok(value)
}

/// A single patient's named inputs, convertible to a canonical feature row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientRecord {
    pub age: u32,
    pub sex: u8,
    pub cp: u8,
    pub trestbps: u32,
    pub chol: u32,
    pub fbs: u8,
    pub restecg: u8,
    pub thalach: u32,
    pub exang: u8,
    pub oldpeak: f64,
    pub slope: u8,
    pub ca: u8,
    pub thal: u8,
}

impl PatientRecord {
    pub fn to_features(&self) -> FeatureRow {
        [
            self.age as f64,
            self.sex as f64,
            self.cp as f64,
            self.trestbps as f64,
            self.chol as f64,
            self.fbs as f64,
            self.restecg as f64,
            self.thalach as f64,
            self.exang as f64,
            self.oldpeak,
            self.slope as f64,
            self.ca as f64,
            self.thal as f64,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn csv_with_rows(n: usize) -> String {
        let mut out = String::from(
            "age,sex,cp,trestbps,chol,fbs,restecg,thalach,exang,oldpeak,slope,ca,thal,target\n",
        );
        for i in 0..n {
            out.push_str(&format!("{},1,2,130,240,0,1,150,0,1.5,2,0,3,{}\n", 40 + i, i % 2));
        }
        out
    }

    #[test]
    fn accepts_minimum_rows() {
        let ds = parse_dataset(&csv_with_rows(10)).unwrap();
        assert_eq!(ds.len(), 10);
        assert_eq!(ds.features[0][0], 40.0);
        assert_eq!(ds.labels[1], 1);
    }

    #[test]
    fn rejects_nine_rows() {
        match parse_dataset(&csv_with_rows(9)) {
            Err(CoreError::InsufficientRows { rows: 9, .. }) => {}
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn reports_missing_columns_in_canonical_order() {
        // thal precedes target in the schema even though neither is present.
        let text = "age,sex,cp,trestbps,chol,fbs,restecg,thalach,exang,oldpeak,slope,ca\n1,1,1,1,1,1,1,1,1,1,1,1\n";
        match parse_dataset(text) {
            Err(CoreError::Schema { missing }) => {
                assert_eq!(missing, vec!["thal".to_string(), "target".to_string()]);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn reorders_shuffled_columns() {
        let mut text = String::from(
            "target,thal,ca,slope,oldpeak,exang,thalach,restecg,fbs,chol,trestbps,cp,sex,age\n",
        );
        for i in 0..10 {
            text.push_str(&format!("1,3,0,2,1.5,0,150,1,0,240,130,2,1,{}\n", 50 + i));
        }
        let ds = parse_dataset(&text).unwrap();
        assert_eq!(ds.features[0][0], 50.0); // age ends up in slot 0
        assert_eq!(ds.features[0][12], 3.0); // thal in the last slot
        assert_eq!(ds.labels[0], 1);
    }

    #[test]
    fn rejects_non_numeric_cell() {
        let mut text = csv_with_rows(10);
        text.push_str("abc,1,2,130,240,0,1,150,0,1.5,2,0,3,1\n");
        match parse_dataset(&text) {
            Err(CoreError::InvalidValue { column, row }) => {
                assert_eq!(column, "age");
                assert_eq!(row, 10);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn rejects_non_finite_cell() {
        let mut text = csv_with_rows(10);
        text.push_str("NaN,1,2,130,240,0,1,150,0,1.5,2,0,3,1\n");
        assert!(matches!(parse_dataset(&text), Err(CoreError::InvalidValue { .. })));
    }

    #[test]
    fn patient_record_orders_features() {
        let record = PatientRecord {
            age: 57,
            sex: 1,
            cp: 2,
            trestbps: 130,
            chol: 236,
            fbs: 0,
            restecg: 1,
            thalach: 174,
            exang: 0,
            oldpeak: 0.0,
            slope: 1,
            ca: 1,
            thal: 2,
        };
        let row = record.to_features();
        assert_eq!(row[0], 57.0);
        assert_eq!(row[9], 0.0);
        assert_eq!(row[12], 2.0);
    }
}
