use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Medicine row in the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Medicine {
    pub id: i64,
    pub name: String,
    pub quantity: i64,
    pub expiry_date: NaiveDate,
    pub medical_shop: String,
    pub location: String,
}

/// Editable fields of a medicine, used for create, update and import
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MedicineFields {
    pub name: String,
    pub quantity: i64,
    pub expiry_date: NaiveDate,
    pub medical_shop: String,
    pub location: String,
}

impl MedicineFields {
    /// Trim text fields and reject empty ones or a negative quantity
    pub fn normalized(self) -> Result<Self> {
        let name = required("name", self.name)?;
        let medical_shop = required("medical_shop", self.medical_shop)?;
        let location = required("location", self.location)?;

        if self.quantity < 0 {
            return Err(AppError::InvalidInput(
                "quantity must not be negative".to_string(),
            ));
        }

        Ok(Self {
            name,
            quantity: self.quantity,
            expiry_date: self.expiry_date,
            medical_shop,
            location,
        })
    }
}

fn required(field: &str, value: String) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::InvalidInput(format!("{} must not be empty", field)));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(name: &str, quantity: i64) -> MedicineFields {
        MedicineFields {
            name: name.to_string(),
            quantity,
            expiry_date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            medical_shop: " ShopA ".to_string(),
            location: "Adoor".to_string(),
        }
    }

    #[test]
    fn test_normalized_trims_text() {
        let f = fields("  Paracetamol ", 3).normalized().unwrap();
        assert_eq!(f.name, "Paracetamol");
        assert_eq!(f.medical_shop, "ShopA");
    }

    #[test]
    fn test_normalized_rejects_blank_name() {
        assert!(matches!(
            fields("   ", 3).normalized(),
            Err(AppError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_normalized_rejects_negative_quantity() {
        assert!(matches!(
            fields("Aspirin", -1).normalized(),
            Err(AppError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_zero_quantity_allowed() {
        assert_eq!(fields("Aspirin", 0).normalized().unwrap().quantity, 0);
    }
}
