#![allow(dead_code)]

use chrono::{Duration, Utc};
use meal_sharing::config::Config;
use meal_sharing::db;
use meal_sharing::models::reservation::CreateReservation;
use sqlx::SqlitePool;
use tempfile::TempDir;

/// A migrated SQLite database in a temporary directory. The directory lives
/// as long as this value does.
pub struct TestDb {
    pub pool: SqlitePool,
    _dir: TempDir,
}

pub async fn setup() -> TestDb {
    let dir = tempfile::tempdir().expect("create temp dir");
    let url = format!("sqlite://{}", dir.path().join("meals.db").display());
    let config = Config::new(url);

    let pool = db::get_db_pool(&config).await.expect("open database");
    db::run_migrations(&pool).await.expect("run migrations");

    TestDb { pool, _dir: dir }
}

pub async fn insert_meal(pool: &SqlitePool, title: &str, max_reservations: i64) -> i64 {
    insert_meal_at(pool, title, max_reservations, 100.0, 7).await
}

/// `days_from_now` may be negative for meals in the past.
pub async fn insert_meal_at(
    pool: &SqlitePool,
    title: &str,
    max_reservations: i64,
    price: f64,
    days_from_now: i64,
) -> i64 {
    let when = (Utc::now() + Duration::days(days_from_now)).naive_utc();

    sqlx::query_scalar(
        r#"
        INSERT INTO meal (title, description, location, "when", max_reservations, price, created_date)
        VALUES (?, 'test meal', 'Copenhagen', ?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(title)
    .bind(when)
    .bind(max_reservations)
    .bind(price)
    .bind(Utc::now().naive_utc())
    .fetch_one(pool)
    .await
    .expect("insert meal")
}

pub fn reservation(meal_id: i64, number_of_guests: i64) -> CreateReservation {
    CreateReservation {
        meal_id,
        number_of_guests,
        contact_name: "Ada".to_string(),
        contact_phonenumber: "+45 12345678".to_string(),
        contact_email: "ada@example.com".to_string(),
        created_date: None,
    }
}

pub async fn reserved_spots(pool: &SqlitePool, meal_id: i64) -> i64 {
    sqlx::query_scalar(
        "SELECT COALESCE(SUM(number_of_guests), 0) FROM reservation WHERE meal_id = ?",
    )
    .bind(meal_id)
    .fetch_one(pool)
    .await
    .expect("sum reservations")
}

pub async fn reservation_count(pool: &SqlitePool) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM reservation")
        .fetch_one(pool)
        .await
        .expect("count reservations")
}
