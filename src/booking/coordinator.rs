use super::ledger::{self, Clamp, Spots};
use super::locks::{MealLockGuard, MealLocks};
use super::{BookingError, TransactionFailure};
use crate::models::meal::UpdateMeal;
use crate::models::reservation::{CreateReservation, Reservation, UpdateReservation};
use sqlx::{Sqlite, SqlitePool, Transaction};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Atomic check-and-write for anything that consumes or releases meal capacity.
///
/// A booking takes the meal's in-process lock, opens a transaction, takes
/// SQLite's write lock through a no-op write on the meal row, reads the
/// ledger, and only then writes. Everything up to the commit runs under a
/// deadline; on expiry the transaction is dropped (rolled back) and the lock
/// released. The commit itself is never cut short, so a timeout always means
/// nothing was written.
#[derive(Debug, Clone)]
pub struct BookingCoordinator {
    pool: SqlitePool,
    locks: Arc<MealLocks>,
    timeout: Duration,
}

/// A checked write waiting for its commit. The meal stays locked until then.
struct Staged<T> {
    tx: Transaction<'static, Sqlite>,
    lock: MealLockGuard,
    value: T,
}

impl BookingCoordinator {
    pub fn new(pool: SqlitePool, timeout: Duration) -> Self {
        Self {
            pool,
            locks: Arc::new(MealLocks::new()),
            timeout,
        }
    }

    pub fn locks(&self) -> &Arc<MealLocks> {
        &self.locks
    }

    /// Unguarded read for display paths.
    pub async fn spots(&self, meal_id: i64) -> Result<Spots, BookingError> {
        ledger::spots(&self.pool, meal_id, Clamp::Display)
            .await?
            .ok_or(BookingError::MealNotFound(meal_id))
    }

    pub async fn book(&self, request: &CreateReservation) -> Result<Reservation, BookingError> {
        if request.number_of_guests <= 0 {
            return Err(BookingError::InvalidInput(format!(
                "number_of_guests must be positive, got {}",
                request.number_of_guests
            )));
        }

        let (reservation, seats_left) = self
            .commit_within_deadline(self.stage_booking(request))
            .await?;

        log::info!(
            "reservation {} booked for meal {} ({} guests, {seats_left} seats left)",
            reservation.id,
            reservation.meal_id,
            reservation.number_of_guests
        );
        Ok(reservation)
    }

    async fn stage_booking(
        &self,
        request: &CreateReservation,
    ) -> Result<Staged<(Reservation, i64)>, BookingError> {
        let lock = self.locks.acquire(request.meal_id).await;
        let mut tx = self.pool.begin().await?;

        let spots = lock_meal(&mut tx, request.meal_id).await?;
        if !spots.can_seat(request.number_of_guests) {
            log::warn!(
                "rejected booking for meal {}: {} requested, {} available",
                request.meal_id,
                request.number_of_guests,
                spots.available_spots
            );
            // Dropping `tx` rolls it back.
            return Err(BookingError::InsufficientCapacity {
                requested: request.number_of_guests,
                available: spots.available_spots,
            });
        }

        let created_date = request
            .created_date
            .unwrap_or_else(|| chrono::Utc::now().naive_utc());

        let reservation = sqlx::query_as::<_, Reservation>(
            r#"
            INSERT INTO reservation (meal_id, number_of_guests, contact_name, contact_phonenumber, contact_email, created_date)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(request.meal_id)
        .bind(request.number_of_guests)
        .bind(&request.contact_name)
        .bind(&request.contact_phonenumber)
        .bind(&request.contact_email)
        .bind(created_date)
        .fetch_one(&mut *tx)
        .await?;

        let seats_left = spots.available_spots - reservation.number_of_guests;
        Ok(Staged {
            tx,
            lock,
            value: (reservation, seats_left),
        })
    }

    /// Applies a partial edit to a reservation. The target meal (the new one
    /// when moving) must be able to hold the resulting party; the
    /// reservation's own seats count as free when it stays on its meal.
    pub async fn update_reservation(
        &self,
        id: i64,
        changes: &UpdateReservation,
    ) -> Result<Reservation, BookingError> {
        if let Some(guests) = changes.number_of_guests {
            if guests <= 0 {
                return Err(BookingError::InvalidInput(format!(
                    "number_of_guests must be positive, got {guests}"
                )));
            }
        }

        let (previous, updated) = self
            .commit_within_deadline(self.stage_reservation_update(id, changes))
            .await?;

        log::info!(
            "reservation {id} updated: meal {} -> {}, {} -> {} guests",
            previous.meal_id,
            updated.meal_id,
            previous.number_of_guests,
            updated.number_of_guests
        );
        Ok(updated)
    }

    async fn stage_reservation_update(
        &self,
        id: i64,
        changes: &UpdateReservation,
    ) -> Result<Staged<(Reservation, Reservation)>, BookingError> {
        loop {
            let target_meal = match changes.meal_id {
                Some(meal_id) => meal_id,
                None => fetch_reservation(&self.pool, id).await?.meal_id,
            };

            let lock = self.locks.acquire(target_meal).await;
            let mut tx = self.pool.begin().await?;
            let spots = lock_meal(&mut tx, target_meal).await?;
            let current = fetch_reservation(&mut *tx, id).await?;

            if current.meal_id != target_meal && changes.meal_id.is_none() {
                // Moved by someone else between our read and the lock.
                continue;
            }

            let guests = changes.number_of_guests.unwrap_or(current.number_of_guests);
            let freed = if current.meal_id == target_meal {
                current.number_of_guests
            } else {
                0
            };
            let available = spots.available_spots + freed;

            if guests > available {
                log::warn!(
                    "rejected update of reservation {id} on meal {target_meal}: {guests} requested, {available} available"
                );
                return Err(BookingError::InsufficientCapacity {
                    requested: guests,
                    available,
                });
            }

            let updated = sqlx::query_as::<_, Reservation>(
                r#"
                UPDATE reservation SET
                    meal_id = ?,
                    number_of_guests = ?,
                    contact_name = COALESCE(?, contact_name),
                    contact_phonenumber = COALESCE(?, contact_phonenumber),
                    contact_email = COALESCE(?, contact_email),
                    created_date = COALESCE(?, created_date)
                WHERE id = ?
                RETURNING *
                "#,
            )
            .bind(target_meal)
            .bind(guests)
            .bind(changes.contact_name.as_deref())
            .bind(changes.contact_phonenumber.as_deref())
            .bind(changes.contact_email.as_deref())
            .bind(changes.created_date)
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

            return Ok(Staged {
                tx,
                lock,
                value: (current, updated),
            });
        }
    }

    /// Edits a meal. Lowering `max_reservations` below the seats already
    /// reserved is refused; other edits skip the lock.
    pub async fn update_meal(&self, meal_id: i64, changes: &UpdateMeal) -> Result<(), BookingError> {
        match changes.max_reservations {
            Some(max) if max < 0 => Err(BookingError::InvalidInput(format!(
                "max_reservations must not be negative, got {max}"
            ))),
            Some(max) => {
                let previous = self
                    .commit_within_deadline(self.stage_meal_resize(meal_id, max, changes))
                    .await?;
                log::info!("meal {meal_id} capacity {previous} -> {max}");
                Ok(())
            }
            None => {
                let updated = apply_meal_changes(&self.pool, meal_id, changes).await?;
                if updated == 0 {
                    return Err(BookingError::MealNotFound(meal_id));
                }
                Ok(())
            }
        }
    }

    async fn stage_meal_resize(
        &self,
        meal_id: i64,
        max_reservations: i64,
        changes: &UpdateMeal,
    ) -> Result<Staged<i64>, BookingError> {
        let lock = self.locks.acquire(meal_id).await;
        let mut tx = self.pool.begin().await?;

        let spots = lock_meal(&mut tx, meal_id).await?;
        if spots.reserved_spots > max_reservations {
            log::warn!(
                "rejected resize of meal {meal_id} to {max_reservations}: {} seats reserved",
                spots.reserved_spots
            );
            return Err(BookingError::CapacityBelowReserved {
                max_reservations,
                reserved_spots: spots.reserved_spots,
            });
        }

        apply_meal_changes(&mut *tx, meal_id, changes).await?;

        Ok(Staged {
            tx,
            lock,
            value: spots.max_reservations,
        })
    }

    /// Runs `stage` under the deadline, then commits outside it.
    ///
    /// Once COMMIT has been handed to SQLite its outcome belongs to the
    /// database; abandoning the wait there could report a timeout for a
    /// write that landed.
    async fn commit_within_deadline<T, F>(&self, stage: F) -> Result<T, BookingError>
    where
        F: Future<Output = Result<Staged<T>, BookingError>>,
    {
        let staged = match tokio::time::timeout(self.timeout, stage).await {
            Ok(Ok(staged)) => staged,
            Ok(Err(BookingError::TransactionFailed(failure))) => {
                log::error!("booking transaction failed: {failure}");
                return Err(BookingError::TransactionFailed(failure));
            }
            Ok(Err(rejected)) => return Err(rejected),
            Err(_) => {
                log::error!("booking transaction timed out after {:?}", self.timeout);
                return Err(TransactionFailure::TimedOut(self.timeout).into());
            }
        };

        let Staged { tx, lock, value } = staged;
        if let Err(err) = tx.commit().await {
            log::error!("booking commit failed: {err}");
            return Err(err.into());
        }
        drop(lock);

        Ok(value)
    }
}

/// Takes the write lock for `meal_id` inside `tx` and reads its exact spots.
///
/// SQLite has no `SELECT ... FOR UPDATE`; a no-op write on the meal row is the
/// first statement of the transaction, so the database write lock is held
/// before the ledger is read and no other writer can commit in between.
async fn lock_meal(tx: &mut Transaction<'_, Sqlite>, meal_id: i64) -> Result<Spots, BookingError> {
    let touched = sqlx::query("UPDATE meal SET max_reservations = max_reservations WHERE id = ?")
        .bind(meal_id)
        .execute(&mut **tx)
        .await?;
    if touched.rows_affected() == 0 {
        return Err(BookingError::MealNotFound(meal_id));
    }

    ledger::spots(&mut **tx, meal_id, Clamp::Exact)
        .await?
        .ok_or(BookingError::MealNotFound(meal_id))
}

async fn fetch_reservation<'e, E>(executor: E, id: i64) -> Result<Reservation, BookingError>
where
    E: sqlx::SqliteExecutor<'e>,
{
    sqlx::query_as::<_, Reservation>("SELECT * FROM reservation WHERE id = ?")
        .bind(id)
        .fetch_optional(executor)
        .await?
        .ok_or(BookingError::ReservationNotFound(id))
}

async fn apply_meal_changes<'e, E>(executor: E, meal_id: i64, changes: &UpdateMeal) -> Result<u64, sqlx::Error>
where
    E: sqlx::SqliteExecutor<'e>,
{
    let result = sqlx::query(
        r#"
        UPDATE meal SET
            title = COALESCE(?, title),
            description = COALESCE(?, description),
            location = COALESCE(?, location),
            "when" = COALESCE(?, "when"),
            max_reservations = COALESCE(?, max_reservations),
            price = COALESCE(?, price)
        WHERE id = ?
        "#,
    )
    .bind(changes.title.as_deref())
    .bind(changes.description.as_deref())
    .bind(changes.location.as_deref())
    .bind(changes.when)
    .bind(changes.max_reservations)
    .bind(changes.price)
    .bind(meal_id)
    .execute(executor)
    .await?;

    Ok(result.rows_affected())
}
