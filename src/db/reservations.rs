use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use std::collections::{BTreeSet, HashMap};

use super::medicines::MEDICINE_COLUMNS;
use crate::constants::ERR_QUANTITY_NOT_POSITIVE;
use crate::error::{AppError, Result};
use crate::models::{Medicine, ReleasedReservation, Reservation, ReservationDetails, User};

const RESERVATION_COLUMNS: &str = "id, user_id, medicine_id, reserved_quantity, reservation_date";

/// Reserve `quantity` units of a medicine for a user
///
/// The availability check and the decrement are a single conditional
/// UPDATE, so concurrent reservations on one medicine cannot oversell it.
/// The decrement and the reservation insert commit together.
pub async fn reserve(
    pool: &SqlitePool,
    user_id: i64,
    medicine_id: i64,
    quantity: i64,
) -> Result<Reservation> {
    if quantity <= 0 {
        return Err(AppError::InvalidInput(
            ERR_QUANTITY_NOT_POSITIVE.to_string(),
        ));
    }

    let mut tx = pool.begin().await?;

    let updated = sqlx::query(
        "UPDATE medicines SET quantity = quantity - ? WHERE id = ? AND quantity >= ?",
    )
    .bind(quantity)
    .bind(medicine_id)
    .bind(quantity)
    .execute(&mut *tx)
    .await?;

    if updated.rows_affected() == 0 {
        let available: Option<(i64,)> = sqlx::query_as("SELECT quantity FROM medicines WHERE id = ?")
            .bind(medicine_id)
            .fetch_optional(&mut *tx)
            .await?;
        tx.rollback().await?;

        return match available {
            None => Err(AppError::NotFound("Medicine")),
            Some((available,)) => {
                tracing::info!(
                    "Reservation refused for medicine {}: requested {}, available {}",
                    medicine_id,
                    quantity,
                    available
                );
                Err(AppError::InsufficientStock {
                    requested: quantity,
                    available,
                })
            }
        };
    }

    let reservation_date = Utc::now();
    let inserted = sqlx::query(
        "INSERT INTO reservations (user_id, medicine_id, reserved_quantity, reservation_date) VALUES (?, ?, ?, ?)",
    )
    .bind(user_id)
    .bind(medicine_id)
    .bind(quantity)
    .bind(reservation_date)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    let reservation = Reservation {
        id: inserted.last_insert_rowid(),
        user_id,
        medicine_id,
        reserved_quantity: quantity,
        reservation_date,
    };

    tracing::info!(
        "User {} reserved {} of medicine {} (reservation {})",
        user_id,
        quantity,
        medicine_id,
        reservation.id
    );

    Ok(reservation)
}

/// Remove a reservation and return its quantity to stock
///
/// If the medicine has since been deleted the restore is skipped and only
/// the reservation is removed. The transaction opens with the DELETE so it
/// holds the write lock from its first statement.
pub async fn delete_reservation(pool: &SqlitePool, reservation_id: i64) -> Result<ReleasedReservation> {
    let mut tx = pool.begin().await?;

    let reservation = sqlx::query_as::<_, Reservation>(&format!(
        "DELETE FROM reservations WHERE id = ? RETURNING {}",
        RESERVATION_COLUMNS
    ))
    .bind(reservation_id)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(reservation) = reservation else {
        tx.rollback().await?;
        return Err(AppError::NotFound("Reservation"));
    };

    let restored = sqlx::query("UPDATE medicines SET quantity = quantity + ? WHERE id = ?")
        .bind(reservation.reserved_quantity)
        .bind(reservation.medicine_id)
        .execute(&mut *tx)
        .await?;
    let stock_restored = restored.rows_affected() > 0;

    tx.commit().await?;

    if stock_restored {
        tracing::info!(
            "Reservation {} removed, restored {} to medicine {}",
            reservation.id,
            reservation.reserved_quantity,
            reservation.medicine_id
        );
    } else {
        tracing::warn!(
            "Reservation {} removed; medicine {} no longer exists, nothing restored",
            reservation.id,
            reservation.medicine_id
        );
    }

    Ok(ReleasedReservation {
        reservation,
        stock_restored,
    })
}

/// All reservations with their user and medicine, where those still exist
pub async fn list_reservations(pool: &SqlitePool) -> Result<Vec<ReservationDetails>> {
    let rows = sqlx::query_as::<_, Reservation>(&format!(
        "SELECT {} FROM reservations ORDER BY id",
        RESERVATION_COLUMNS
    ))
    .fetch_all(pool)
    .await?;
    with_details(pool, rows).await
}

pub async fn reservations_for_user(pool: &SqlitePool, user_id: i64) -> Result<Vec<ReservationDetails>> {
    let rows = sqlx::query_as::<_, Reservation>(&format!(
        "SELECT {} FROM reservations WHERE user_id = ? ORDER BY id",
        RESERVATION_COLUMNS
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    with_details(pool, rows).await
}

async fn with_details(
    pool: &SqlitePool,
    reservations: Vec<Reservation>,
) -> Result<Vec<ReservationDetails>> {
    if reservations.is_empty() {
        return Ok(Vec::new());
    }

    let user_ids: BTreeSet<i64> = reservations.iter().map(|r| r.user_id).collect();
    let medicine_ids: BTreeSet<i64> = reservations.iter().map(|r| r.medicine_id).collect();

    let mut users_query: QueryBuilder<Sqlite> = QueryBuilder::new(
        "SELECT id, username, email, password_hash, role FROM users WHERE id IN (",
    );
    push_id_list(&mut users_query, &user_ids);
    let users: HashMap<i64, User> = users_query
        .build_query_as::<User>()
        .fetch_all(pool)
        .await?
        .into_iter()
        .map(|u| (u.id, u))
        .collect();

    let mut medicines_query: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
        "SELECT {} FROM medicines WHERE id IN (",
        MEDICINE_COLUMNS
    ));
    push_id_list(&mut medicines_query, &medicine_ids);
    let medicines: HashMap<i64, Medicine> = medicines_query
        .build_query_as::<Medicine>()
        .fetch_all(pool)
        .await?
        .into_iter()
        .map(|m| (m.id, m))
        .collect();

    Ok(reservations
        .into_iter()
        .map(|reservation| ReservationDetails {
            user: users.get(&reservation.user_id).cloned(),
            medicine: medicines.get(&reservation.medicine_id).cloned(),
            reservation,
        })
        .collect())
}

fn push_id_list(builder: &mut QueryBuilder<'_, Sqlite>, ids: &BTreeSet<i64>) {
    let mut separated = builder.separated(", ");
    for id in ids {
        separated.push_bind(*id);
    }
    separated.push_unseparated(")");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::medicines::tests::fields;
    use crate::db::medicines::{add_medicine, delete_medicine, get_medicine};
    use crate::db::testing::test_pool;
    use crate::db::users::create_user;
    use crate::models::Role;

    async fn setup(quantity: i64) -> (tempfile::TempDir, SqlitePool, i64, i64) {
        let (dir, pool) = test_pool().await;
        let user = create_user(&pool, "anu", "anu@example.com", "hash", Role::User)
            .await
            .unwrap();
        let medicine = add_medicine(&pool, fields("Paracetamol", quantity, "ShopA", "Adoor"))
            .await
            .unwrap();
        (dir, pool, user.id, medicine.id)
    }

    async fn get_reservation(pool: &SqlitePool, id: i64) -> Result<Option<Reservation>> {
        let row = sqlx::query_as::<_, Reservation>(&format!(
            "SELECT {} FROM reservations WHERE id = ?",
            RESERVATION_COLUMNS
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;
        Ok(row)
    }

    async fn quantity_of(pool: &SqlitePool, id: i64) -> i64 {
        get_medicine(pool, id).await.unwrap().unwrap().quantity
    }

    async fn reservation_count(pool: &SqlitePool) -> i64 {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM reservations")
            .fetch_one(pool)
            .await
            .unwrap();
        count
    }

    #[tokio::test]
    async fn test_reserve_decrements_stock() {
        let (_dir, pool, user_id, medicine_id) = setup(10).await;

        let reservation = reserve(&pool, user_id, medicine_id, 4).await.unwrap();
        assert_eq!(reservation.reserved_quantity, 4);
        assert_eq!(quantity_of(&pool, medicine_id).await, 6);
        assert_eq!(reservation_count(&pool).await, 1);

        let stored = get_reservation(&pool, reservation.id).await.unwrap().unwrap();
        assert_eq!(stored.medicine_id, medicine_id);
        assert_eq!(stored.user_id, user_id);
    }

    #[tokio::test]
    async fn test_reserve_entire_stock() {
        let (_dir, pool, user_id, medicine_id) = setup(5).await;

        reserve(&pool, user_id, medicine_id, 5).await.unwrap();
        assert_eq!(quantity_of(&pool, medicine_id).await, 0);
    }

    #[tokio::test]
    async fn test_reserve_more_than_available_changes_nothing() {
        let (_dir, pool, user_id, medicine_id) = setup(3).await;

        let result = reserve(&pool, user_id, medicine_id, 4).await;
        assert!(matches!(
            result,
            Err(AppError::InsufficientStock {
                requested: 4,
                available: 3
            })
        ));
        assert_eq!(quantity_of(&pool, medicine_id).await, 3);
        assert_eq!(reservation_count(&pool).await, 0);
    }

    #[tokio::test]
    async fn test_reserve_missing_medicine() {
        let (_dir, pool, user_id, _) = setup(3).await;

        assert!(matches!(
            reserve(&pool, user_id, 9999, 1).await,
            Err(AppError::NotFound("Medicine"))
        ));
        assert_eq!(reservation_count(&pool).await, 0);
    }

    #[tokio::test]
    async fn test_reserve_rejects_non_positive_quantity() {
        let (_dir, pool, user_id, medicine_id) = setup(3).await;

        for quantity in [0, -2] {
            assert!(matches!(
                reserve(&pool, user_id, medicine_id, quantity).await,
                Err(AppError::InvalidInput(_))
            ));
        }
        assert_eq!(quantity_of(&pool, medicine_id).await, 3);
    }

    #[tokio::test]
    async fn test_reserve_then_delete_restores_stock() {
        let (_dir, pool, user_id, medicine_id) = setup(10).await;

        let reservation = reserve(&pool, user_id, medicine_id, 7).await.unwrap();
        let released = delete_reservation(&pool, reservation.id).await.unwrap();

        assert!(released.stock_restored);
        assert_eq!(released.reservation.id, reservation.id);
        assert_eq!(quantity_of(&pool, medicine_id).await, 10);
        assert_eq!(reservation_count(&pool).await, 0);
    }

    #[tokio::test]
    async fn test_delete_reservation_after_medicine_deleted() {
        let (_dir, pool, user_id, medicine_id) = setup(10).await;

        let reservation = reserve(&pool, user_id, medicine_id, 2).await.unwrap();
        delete_medicine(&pool, medicine_id).await.unwrap();

        let details = list_reservations(&pool).await.unwrap();
        assert_eq!(details.len(), 1);
        assert!(details[0].medicine.is_none());
        assert_eq!(details[0].user.as_ref().unwrap().id, user_id);

        let released = delete_reservation(&pool, reservation.id).await.unwrap();
        assert!(!released.stock_restored);
        assert_eq!(reservation_count(&pool).await, 0);
    }

    #[tokio::test]
    async fn test_delete_unknown_reservation() {
        let (_dir, pool, _, medicine_id) = setup(10).await;

        assert!(matches!(
            delete_reservation(&pool, 4242).await,
            Err(AppError::NotFound("Reservation"))
        ));
        assert_eq!(quantity_of(&pool, medicine_id).await, 10);
    }

    #[tokio::test]
    async fn test_reservations_for_user_only_lists_own() {
        let (_dir, pool, user_id, medicine_id) = setup(10).await;
        let other = create_user(&pool, "ben", "ben@example.com", "hash", Role::User)
            .await
            .unwrap();

        reserve(&pool, user_id, medicine_id, 1).await.unwrap();
        reserve(&pool, other.id, medicine_id, 2).await.unwrap();

        let mine = reservations_for_user(&pool, user_id).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].reservation.reserved_quantity, 1);
        assert_eq!(mine[0].medicine.as_ref().unwrap().quantity, 7);

        assert_eq!(list_reservations(&pool).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_reservations_never_oversell() {
        let (_dir, pool, user_id, medicine_id) = setup(10).await;

        let mut handles = Vec::new();
        for _ in 0..8 {
            let pool = pool.clone();
            handles.push(tokio::spawn(async move {
                reserve(&pool, user_id, medicine_id, 3).await
            }));
        }

        let mut succeeded = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => succeeded += 1,
                Err(AppError::InsufficientStock { .. }) => {}
                Err(other) => panic!("unexpected error: {other}"),
            }
        }

        assert_eq!(succeeded, 3);
        assert_eq!(quantity_of(&pool, medicine_id).await, 1);
        assert_eq!(reservation_count(&pool).await, 3);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_concurrent_release_and_reserve_keep_stock_consistent() {
        let (_dir, pool, user_id, medicine_id) = setup(1000).await;

        let mut reservation_ids = Vec::new();
        for _ in 0..40 {
            reservation_ids.push(reserve(&pool, user_id, medicine_id, 1).await.unwrap().id);
        }
        assert_eq!(quantity_of(&pool, medicine_id).await, 960);

        let mut handles = Vec::new();
        for id in reservation_ids {
            let release_pool = pool.clone();
            handles.push(tokio::spawn(async move {
                delete_reservation(&release_pool, id).await.map(|_| ())
            }));
            let reserve_pool = pool.clone();
            handles.push(tokio::spawn(async move {
                reserve(&reserve_pool, user_id, medicine_id, 1).await.map(|_| ())
            }));
        }

        for handle in handles {
            if let Err(e) = handle.await.unwrap() {
                panic!("concurrent release or reserve failed: {e}");
            }
        }

        // 40 released, 40 newly reserved
        assert_eq!(quantity_of(&pool, medicine_id).await, 960);
        assert_eq!(reservation_count(&pool).await, 40);
    }
}
