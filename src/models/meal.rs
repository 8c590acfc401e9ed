use crate::booking::ledger::{Clamp, Spots};
use crate::models::timestamp;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Clone, FromRow)]
pub struct Meal {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub location: String,
    pub when: NaiveDateTime,
    pub max_reservations: i64,
    pub price: f64,
    pub created_date: NaiveDateTime,
}

/// A meal row joined with its reservation and review aggregates.
#[derive(Debug, FromRow)]
pub struct MealRow {
    #[sqlx(flatten)]
    pub meal: Meal,
    pub reserved_spots: i64,
    pub avg_stars: Option<f64>,
}

/// What read paths return: meal fields plus display-clamped spots.
#[derive(Debug, Serialize, Deserialize)]
pub struct MealWithSpots {
    #[serde(flatten)]
    pub meal: Meal,
    pub reserved_spots: i64,
    pub available_spots: i64,
    pub avg_stars: Option<f64>,
}

impl From<MealRow> for MealWithSpots {
    fn from(row: MealRow) -> Self {
        let spots = Spots::compute(row.meal.max_reservations, row.reserved_spots, Clamp::Display);
        Self {
            meal: row.meal,
            reserved_spots: spots.reserved_spots,
            available_spots: spots.available_spots,
            avg_stars: row.avg_stars,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateMeal {
    #[validate(length(min = 1))]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[validate(length(min = 1))]
    pub location: String,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub when: NaiveDateTime,
    #[validate(range(min = 0))]
    pub max_reservations: i64,
    #[validate(range(min = 0.0))]
    pub price: f64,
    #[serde(default, deserialize_with = "timestamp::deserialize_option")]
    pub created_date: Option<NaiveDateTime>,
}

/// Partial meal edit. Absent fields keep their stored value.
#[derive(Debug, Default, Clone, Deserialize, Validate)]
pub struct UpdateMeal {
    #[validate(length(min = 1))]
    pub title: Option<String>,
    pub description: Option<String>,
    #[validate(length(min = 1))]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "timestamp::deserialize_option")]
    pub when: Option<NaiveDateTime>,
    #[validate(range(min = 0))]
    pub max_reservations: Option<i64>,
    #[validate(range(min = 0.0))]
    pub price: Option<f64>,
}

impl UpdateMeal {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.location.is_none()
            && self.when.is_none()
            && self.max_reservations.is_none()
            && self.price.is_none()
    }
}
