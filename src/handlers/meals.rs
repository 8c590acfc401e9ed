use crate::booking::ledger::RESERVED_SPOTS_SQL;
use crate::booking::BookingCoordinator;
use crate::error::ApiError;
use crate::models::meal::{CreateMeal, MealRow, MealWithSpots, UpdateMeal};
use crate::models::review::Review;
use crate::models::timestamp;
use actix_web::{web, HttpResponse};
use chrono::{NaiveDateTime, Utc};
use serde::Deserialize;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use validator::Validate;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealSearch {
    pub max_price: Option<f64>,
    pub available_reservations: Option<bool>,
    pub title: Option<String>,
    pub date_after: Option<String>,
    pub date_before: Option<String>,
    pub sort_key: Option<String>,
    pub sort_dir: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SortKey {
    Price,
    Title,
    MaxReservations,
    Stars,
}

impl SortKey {
    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "price" => Some(SortKey::Price),
            "title" => Some(SortKey::Title),
            "max_reservations" => Some(SortKey::MaxReservations),
            "stars" => Some(SortKey::Stars),
            _ => None,
        }
    }

    fn column(self) -> &'static str {
        match self {
            SortKey::Price => "meal.price",
            SortKey::Title => "meal.title",
            SortKey::MaxReservations => "meal.max_reservations",
            SortKey::Stars => "avg_stars",
        }
    }
}

/// `SELECT` over meals with their capacity and rating aggregates, open for
/// further `AND ...` conditions.
fn select_meals<'a>() -> QueryBuilder<'a, Sqlite> {
    QueryBuilder::new(format!(
        "SELECT meal.*, {RESERVED_SPOTS_SQL} AS reserved_spots, \
         (SELECT AVG(review.stars) FROM review WHERE review.meal_id = meal.id) AS avg_stars \
         FROM meal WHERE 1=1"
    ))
}

async fn fetch_meals(
    pool: &SqlitePool,
    mut query: QueryBuilder<'_, Sqlite>,
) -> Result<Vec<MealWithSpots>, ApiError> {
    let rows = query.build_query_as::<MealRow>().fetch_all(pool).await?;
    Ok(rows.into_iter().map(MealWithSpots::from).collect())
}

fn parse_date_filter(name: &str, raw: &str) -> Result<NaiveDateTime, ApiError> {
    timestamp::parse(raw).ok_or_else(|| ApiError::BadRequest(format!("Invalid {name}: {raw}")))
}

pub async fn get_meals(
    pool: web::Data<SqlitePool>,
    params: web::Query<MealSearch>,
) -> Result<HttpResponse, ApiError> {
    let sort = match params.sort_key.as_deref() {
        None => None,
        Some(raw) => Some(
            SortKey::parse(raw)
                .ok_or_else(|| ApiError::BadRequest(format!("Invalid sortKey: {raw}")))?,
        ),
    };

    let mut query = select_meals();

    if let Some(max) = params.max_price {
        query.push(" AND meal.price < ").push_bind(max);
    }

    if let Some(title) = &params.title {
        query.push(" AND meal.title LIKE ").push_bind(format!("%{title}%"));
    }

    if let Some(raw) = &params.date_after {
        let after = parse_date_filter("dateAfter", raw)?;
        query.push(r#" AND meal."when" > "#).push_bind(after);
    }

    if let Some(raw) = &params.date_before {
        let before = parse_date_filter("dateBefore", raw)?;
        query.push(r#" AND meal."when" < "#).push_bind(before);
    }

    match params.available_reservations {
        Some(true) => {
            query.push(format!(" AND meal.max_reservations - {RESERVED_SPOTS_SQL} > 0"));
        }
        Some(false) => {
            query.push(format!(" AND meal.max_reservations - {RESERVED_SPOTS_SQL} <= 0"));
        }
        None => {}
    }

    match sort {
        Some(key) => {
            let direction = if params.sort_dir.as_deref() == Some("desc") {
                "DESC"
            } else {
                "ASC"
            };
            query.push(format!(" ORDER BY {} {direction}, meal.id", key.column()));
        }
        None => {
            query.push(" ORDER BY meal.id");
        }
    }

    let meals = fetch_meals(pool.get_ref(), query).await?;
    Ok(HttpResponse::Ok().json(meals))
}

pub async fn create_meal(
    pool: web::Data<SqlitePool>,
    body: web::Json<CreateMeal>,
) -> Result<HttpResponse, ApiError> {
    body.validate()?;

    let created_date = body
        .created_date
        .unwrap_or_else(|| Utc::now().naive_utc());

    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO meal (title, description, location, "when", max_reservations, price, created_date)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(&body.title)
    .bind(&body.description)
    .bind(&body.location)
    .bind(body.when)
    .bind(body.max_reservations)
    .bind(body.price)
    .bind(created_date)
    .fetch_one(pool.get_ref())
    .await?;

    log::info!("meal {id} created with {} seats", body.max_reservations);

    Ok(HttpResponse::Created().json(serde_json::json!({
        "id": id,
        "message": "Meal created successfully"
    })))
}

pub async fn get_meal_by_id(
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();

    let mut query = select_meals();
    query.push(" AND meal.id = ").push_bind(id);

    let row = query
        .build_query_as::<MealRow>()
        .fetch_optional(pool.get_ref())
        .await?
        .ok_or_else(|| ApiError::NotFound("Meal not found".to_string()))?;

    Ok(HttpResponse::Ok().json(MealWithSpots::from(row)))
}

pub async fn update_meal(
    coordinator: web::Data<BookingCoordinator>,
    path: web::Path<i64>,
    body: web::Json<UpdateMeal>,
) -> Result<HttpResponse, ApiError> {
    body.validate()?;
    if body.is_empty() {
        return Err(ApiError::BadRequest("No fields to update".to_string()));
    }

    coordinator.update_meal(path.into_inner(), &body).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Meal updated successfully"
    })))
}

pub async fn delete_meal(
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();

    let deleted = sqlx::query("DELETE FROM meal WHERE id = ?")
        .bind(id)
        .execute(pool.get_ref())
        .await?
        .rows_affected();

    if deleted == 0 {
        return Err(ApiError::NotFound("Meal not found".to_string()));
    }

    log::info!("meal {id} deleted");
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Meal deleted successfully"
    })))
}

pub async fn get_meal_reviews(
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let reviews = sqlx::query_as::<_, Review>("SELECT * FROM review WHERE meal_id = ? ORDER BY id")
        .bind(path.into_inner())
        .fetch_all(pool.get_ref())
        .await?;

    if reviews.is_empty() {
        return Err(ApiError::NotFound(
            "No reviews found for this meal".to_string(),
        ));
    }

    Ok(HttpResponse::Ok().json(reviews))
}

pub async fn all_meals(pool: web::Data<SqlitePool>) -> Result<HttpResponse, ApiError> {
    let mut query = select_meals();
    query.push(" ORDER BY meal.id");

    Ok(HttpResponse::Ok().json(fetch_meals(pool.get_ref(), query).await?))
}

pub async fn past_meals(pool: web::Data<SqlitePool>) -> Result<HttpResponse, ApiError> {
    let mut query = select_meals();
    query
        .push(r#" AND meal."when" < "#)
        .push_bind(Utc::now().naive_utc())
        .push(" ORDER BY meal.id");

    Ok(HttpResponse::Ok().json(fetch_meals(pool.get_ref(), query).await?))
}

pub async fn future_meals(pool: web::Data<SqlitePool>) -> Result<HttpResponse, ApiError> {
    let mut query = select_meals();
    query
        .push(r#" AND meal."when" > "#)
        .push_bind(Utc::now().naive_utc())
        .push(" ORDER BY meal.id");

    Ok(HttpResponse::Ok().json(fetch_meals(pool.get_ref(), query).await?))
}

pub async fn first_meal(pool: web::Data<SqlitePool>) -> Result<HttpResponse, ApiError> {
    edge_meal(pool.get_ref(), "ASC").await
}

pub async fn last_meal(pool: web::Data<SqlitePool>) -> Result<HttpResponse, ApiError> {
    edge_meal(pool.get_ref(), "DESC").await
}

async fn edge_meal(pool: &SqlitePool, direction: &str) -> Result<HttpResponse, ApiError> {
    let mut query = select_meals();
    query.push(format!(" ORDER BY meal.id {direction} LIMIT 1"));

    match fetch_meals(pool, query).await?.into_iter().next() {
        Some(meal) => Ok(HttpResponse::Ok().json(meal)),
        None => Err(ApiError::NotFound("No meals found".to_string())),
    }
}
