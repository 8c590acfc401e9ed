//! Capacity ledger: seats committed and remaining for a meal, derived from
//! the persisted reservation set. Pure reads; the caller decides whether the
//! read happens inside a locked booking transaction or not.

use serde::Serialize;
use sqlx::SqliteExecutor;

/// Seats already committed to `meal`, as a SQL expression over the `meal` row.
///
/// Shared by the ledger and the meal listing queries so both compute the
/// aggregate the same way.
pub const RESERVED_SPOTS_SQL: &str = "COALESCE((SELECT SUM(reservation.number_of_guests) \
     FROM reservation WHERE reservation.meal_id = meal.id), 0)";

/// How `available_spots` is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Clamp {
    /// Never below zero. For read paths shown to users.
    Display,
    /// The signed difference. The capacity check must use this.
    Exact,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Spots {
    pub max_reservations: i64,
    pub reserved_spots: i64,
    pub available_spots: i64,
}

impl Spots {
    pub fn compute(max_reservations: i64, reserved_spots: i64, clamp: Clamp) -> Self {
        let available = max_reservations - reserved_spots;
        let available_spots = match clamp {
            Clamp::Display => available.max(0),
            Clamp::Exact => available,
        };

        Self {
            max_reservations,
            reserved_spots,
            available_spots,
        }
    }

    /// Inclusive: a party that exactly fills the meal fits.
    pub fn can_seat(&self, guests: i64) -> bool {
        guests <= self.available_spots
    }
}

/// Returns `None` when the meal does not exist.
pub async fn spots<'e, E>(executor: E, meal_id: i64, clamp: Clamp) -> Result<Option<Spots>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let sql = format!(
        "SELECT meal.max_reservations, {RESERVED_SPOTS_SQL} AS reserved_spots \
         FROM meal WHERE meal.id = ?"
    );

    let row: Option<(i64, i64)> = sqlx::query_as(&sql)
        .bind(meal_id)
        .fetch_optional(executor)
        .await?;

    Ok(row.map(|(max_reservations, reserved_spots)| {
        Spots::compute(max_reservations, reserved_spots, clamp)
    }))
}
