use chrono::NaiveDate;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};

use super::contains_pattern;
use crate::error::{AppError, Result};
use crate::models::{parse_import, LineError, Medicine, MedicineFields};

pub(crate) const MEDICINE_COLUMNS: &str =
    "id, name, quantity, expiry_date, medical_shop, location";

/// Result of a mass import
#[derive(Debug, serde::Serialize)]
pub struct ImportSummary {
    pub added: usize,
    pub errors: Vec<LineError>,
}

pub async fn list_medicines(pool: &SqlitePool) -> Result<Vec<Medicine>> {
    let rows = sqlx::query_as::<_, Medicine>(&format!("SELECT {} FROM medicines", MEDICINE_COLUMNS))
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn get_medicine(pool: &SqlitePool, id: i64) -> Result<Option<Medicine>> {
    let row = sqlx::query_as::<_, Medicine>(&format!(
        "SELECT {} FROM medicines WHERE id = ?",
        MEDICINE_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Medicines with quantity strictly below `threshold`
pub async fn low_stock(pool: &SqlitePool, threshold: i64) -> Result<Vec<Medicine>> {
    let rows = sqlx::query_as::<_, Medicine>(&format!(
        "SELECT {} FROM medicines WHERE quantity < ?",
        MEDICINE_COLUMNS
    ))
    .bind(threshold)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Medicines expiring on or before `date`
pub async fn expiring_by(pool: &SqlitePool, date: NaiveDate) -> Result<Vec<Medicine>> {
    let rows = sqlx::query_as::<_, Medicine>(&format!(
        "SELECT {} FROM medicines WHERE expiry_date <= ?",
        MEDICINE_COLUMNS
    ))
    .bind(date)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Case-insensitive substring match on the medicine name, any location
pub async fn search_by_name(pool: &SqlitePool, query: &str) -> Result<Vec<Medicine>> {
    let rows = sqlx::query_as::<_, Medicine>(&format!(
        "SELECT {} FROM medicines WHERE name LIKE ? ESCAPE '\\'",
        MEDICINE_COLUMNS
    ))
    .bind(contains_pattern(query.trim()))
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Case-insensitive substring match on the shop name
pub async fn search_by_shop(pool: &SqlitePool, query: &str) -> Result<Vec<Medicine>> {
    let rows = sqlx::query_as::<_, Medicine>(&format!(
        "SELECT {} FROM medicines WHERE medical_shop LIKE ? ESCAPE '\\'",
        MEDICINE_COLUMNS
    ))
    .bind(contains_pattern(query.trim()))
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn add_medicine(pool: &SqlitePool, fields: MedicineFields) -> Result<Medicine> {
    let fields = fields.normalized()?;
    let mut conn = pool.acquire().await?;
    let medicine = insert(&mut *conn, fields).await?;
    tracing::info!(
        "Added medicine {} ({}) at {}",
        medicine.id,
        medicine.name,
        medicine.location
    );
    Ok(medicine)
}

pub async fn update_medicine(
    pool: &SqlitePool,
    id: i64,
    fields: MedicineFields,
) -> Result<Medicine> {
    let fields = fields.normalized()?;
    let result = sqlx::query(
        "UPDATE medicines SET name = ?, quantity = ?, expiry_date = ?, medical_shop = ?, location = ? WHERE id = ?",
    )
    .bind(&fields.name)
    .bind(fields.quantity)
    .bind(fields.expiry_date)
    .bind(&fields.medical_shop)
    .bind(&fields.location)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Medicine"));
    }

    Ok(Medicine {
        id,
        name: fields.name,
        quantity: fields.quantity,
        expiry_date: fields.expiry_date,
        medical_shop: fields.medical_shop,
        location: fields.location,
    })
}

/// Delete one medicine. Reservations referencing it are left in place.
pub async fn delete_medicine(pool: &SqlitePool, id: i64) -> Result<()> {
    let result = sqlx::query("DELETE FROM medicines WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Medicine"));
    }

    tracing::info!("Deleted medicine {}", id);
    Ok(())
}

/// Delete every listed medicine that exists; returns how many were removed
pub async fn delete_medicines(pool: &SqlitePool, ids: &[i64]) -> Result<u64> {
    if ids.is_empty() {
        return Ok(0);
    }

    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("DELETE FROM medicines WHERE id IN (");
    let mut separated = builder.separated(", ");
    for id in ids {
        separated.push_bind(*id);
    }
    separated.push_unseparated(")");

    let result = builder.build().execute(pool).await?;
    tracing::info!(
        "Deleted {} of {} selected medicines",
        result.rows_affected(),
        ids.len()
    );
    Ok(result.rows_affected())
}

/// Parse and insert mass import text
///
/// Valid lines are inserted together in one transaction; malformed lines
/// are reported and skipped.
pub async fn import_medicines(pool: &SqlitePool, text: &str) -> Result<ImportSummary> {
    let batch = parse_import(text);

    for err in &batch.errors {
        tracing::warn!(
            "Skipping import line {}: {} ({})",
            err.line,
            err.content,
            err.reason
        );
    }

    let mut tx = pool.begin().await?;
    let mut added = 0;
    for fields in batch.records {
        insert(&mut *tx, fields).await?;
        added += 1;
    }
    tx.commit().await?;

    tracing::info!(
        "Mass import complete: {} added, {} rejected",
        added,
        batch.errors.len()
    );

    Ok(ImportSummary {
        added,
        errors: batch.errors,
    })
}

async fn insert(conn: &mut SqliteConnection, fields: MedicineFields) -> Result<Medicine> {
    let result = sqlx::query(
        "INSERT INTO medicines (name, quantity, expiry_date, medical_shop, location) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&fields.name)
    .bind(fields.quantity)
    .bind(fields.expiry_date)
    .bind(&fields.medical_shop)
    .bind(&fields.location)
    .execute(&mut *conn)
    .await?;

    Ok(Medicine {
        id: result.last_insert_rowid(),
        name: fields.name,
        quantity: fields.quantity,
        expiry_date: fields.expiry_date,
        medical_shop: fields.medical_shop,
        location: fields.location,
    })
}
