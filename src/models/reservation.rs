use crate::models::timestamp;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Clone, FromRow)]
pub struct Reservation {
    pub id: i64,
    pub meal_id: i64,
    pub number_of_guests: i64,
    pub contact_name: String,
    pub contact_phonenumber: String,
    pub contact_email: String,
    pub created_date: NaiveDateTime,
}

// Party size is checked by the booking coordinator, not here, so the same
// rule applies to every caller.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateReservation {
    pub meal_id: i64,
    pub number_of_guests: i64,
    #[validate(length(min = 1))]
    pub contact_name: String,
    #[serde(default)]
    pub contact_phonenumber: String,
    #[validate(email)]
    pub contact_email: String,
    #[serde(default, deserialize_with = "timestamp::deserialize_option")]
    pub created_date: Option<NaiveDateTime>,
}

#[derive(Debug, Default, Clone, Deserialize, Validate)]
pub struct UpdateReservation {
    pub meal_id: Option<i64>,
    pub number_of_guests: Option<i64>,
    #[validate(length(min = 1))]
    pub contact_name: Option<String>,
    pub contact_phonenumber: Option<String>,
    #[validate(email)]
    pub contact_email: Option<String>,
    #[serde(default, deserialize_with = "timestamp::deserialize_option")]
    pub created_date: Option<NaiveDateTime>,
}

impl UpdateReservation {
    pub fn is_empty(&self) -> bool {
        self.meal_id.is_none()
            && self.number_of_guests.is_none()
            && self.contact_name.is_none()
            && self.contact_phonenumber.is_none()
            && self.contact_email.is_none()
            && self.created_date.is_none()
    }
}
