use crate::models::timestamp;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Clone, FromRow)]
pub struct Review {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub meal_id: i64,
    pub stars: i64,
    pub created_date: NaiveDateTime,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateReview {
    #[validate(length(min = 1))]
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub meal_id: i64,
    #[validate(range(min = 1, max = 5))]
    pub stars: i64,
    #[serde(default, deserialize_with = "timestamp::deserialize_option")]
    pub created_date: Option<NaiveDateTime>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateReview {
    #[validate(length(min = 1))]
    pub title: Option<String>,
    pub description: Option<String>,
    pub meal_id: Option<i64>,
    #[validate(range(min = 1, max = 5))]
    pub stars: Option<i64>,
}

impl UpdateReview {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.meal_id.is_none()
            && self.stars.is_none()
    }
}
