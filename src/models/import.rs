use chrono::NaiveDate;
use serde::Serialize;

use super::MedicineFields;
use crate::constants::{DATE_FORMAT, IMPORT_FIELD_COUNT};
use crate::error::AppError;

/// A mass import line that could not be turned into a medicine
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineError {
    /// 1-based line number in the submitted text
    pub line: usize,
    pub content: String,
    pub reason: String,
}

/// Parsed mass import text
#[derive(Debug, Default)]
pub struct ImportBatch {
    pub records: Vec<MedicineFields>,
    pub errors: Vec<LineError>,
}

/// Parse mass import text, one `name, quantity, expiry, shop, location`
/// record per line
///
/// Each line stands alone: a bad line is recorded in `errors` and parsing
/// moves on. Blank lines are ignored.
pub fn parse_import(text: &str) -> ImportBatch {
    let mut batch = ImportBatch::default();

    for (idx, raw) in text.lines().enumerate() {
        if raw.trim().is_empty() {
            continue;
        }

        match parse_line(raw) {
            Ok(fields) => batch.records.push(fields),
            Err(reason) => batch.errors.push(LineError {
                line: idx + 1,
                content: raw.to_string(),
                reason,
            }),
        }
    }

    batch
}

fn parse_line(line: &str) -> Result<MedicineFields, String> {
    let parts: Vec<&str> = line.split(',').map(str::trim).collect();
    if parts.len() != IMPORT_FIELD_COUNT {
        return Err(format!(
            "expected {} fields, found {}",
            IMPORT_FIELD_COUNT,
            parts.len()
        ));
    }

    let (name, quantity, expiry, shop, location) = (parts[0], parts[1], parts[2], parts[3], parts[4]);

    let quantity: i64 = quantity
        .parse()
        .map_err(|_| format!("invalid quantity '{}'", quantity))?;

    let expiry_date = NaiveDate::parse_from_str(expiry, DATE_FORMAT)
        .map_err(|e| format!("invalid expiry date '{}': {}", expiry, e))?;

    MedicineFields {
        name: name.to_string(),
        quantity,
        expiry_date,
        medical_shop: shop.to_string(),
        location: location.to_string(),
    }
    .normalized()
    .map_err(|e| match e {
        AppError::InvalidInput(msg) => msg,
        other => other.to_string(),
    })
}
