use crate::error::ApiError;
use crate::models::review::{CreateReview, Review, UpdateReview};
use actix_web::{web, HttpResponse};
use chrono::Utc;
use sqlx::SqlitePool;
use validator::Validate;

async fn ensure_meal_exists(pool: &SqlitePool, meal_id: i64) -> Result<(), ApiError> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM meal WHERE id = ?)")
        .bind(meal_id)
        .fetch_one(pool)
        .await?;

    if exists {
        Ok(())
    } else {
        Err(ApiError::NotFound("Meal not found".to_string()))
    }
}

pub async fn get_reviews(pool: web::Data<SqlitePool>) -> Result<HttpResponse, ApiError> {
    let reviews = sqlx::query_as::<_, Review>("SELECT * FROM review ORDER BY id")
        .fetch_all(pool.get_ref())
        .await?;

    Ok(HttpResponse::Ok().json(reviews))
}

pub async fn create_review(
    pool: web::Data<SqlitePool>,
    body: web::Json<CreateReview>,
) -> Result<HttpResponse, ApiError> {
    body.validate()?;
    ensure_meal_exists(pool.get_ref(), body.meal_id).await?;

    let created_date = body
        .created_date
        .unwrap_or_else(|| Utc::now().naive_utc());

    let review = sqlx::query_as::<_, Review>(
        r#"
        INSERT INTO review (title, description, meal_id, stars, created_date)
        VALUES (?, ?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(&body.title)
    .bind(&body.description)
    .bind(body.meal_id)
    .bind(body.stars)
    .bind(created_date)
    .fetch_one(pool.get_ref())
    .await?;

    Ok(HttpResponse::Created().json(review))
}

pub async fn get_review(
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    sqlx::query_as::<_, Review>("SELECT * FROM review WHERE id = ?")
        .bind(path.into_inner())
        .fetch_optional(pool.get_ref())
        .await?
        .map(|review| HttpResponse::Ok().json(review))
        .ok_or_else(|| ApiError::NotFound("Review not found".to_string()))
}

pub async fn update_review(
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
    body: web::Json<UpdateReview>,
) -> Result<HttpResponse, ApiError> {
    body.validate()?;
    if body.is_empty() {
        return Err(ApiError::BadRequest("No fields to update".to_string()));
    }
    if let Some(meal_id) = body.meal_id {
        ensure_meal_exists(pool.get_ref(), meal_id).await?;
    }

    let review = sqlx::query_as::<_, Review>(
        r#"
        UPDATE review SET
            title = COALESCE(?, title),
            description = COALESCE(?, description),
            meal_id = COALESCE(?, meal_id),
            stars = COALESCE(?, stars)
        WHERE id = ?
        RETURNING *
        "#,
    )
    .bind(body.title.as_deref())
    .bind(body.description.as_deref())
    .bind(body.meal_id)
    .bind(body.stars)
    .bind(path.into_inner())
    .fetch_optional(pool.get_ref())
    .await?
    .ok_or_else(|| ApiError::NotFound("Review not found".to_string()))?;

    Ok(HttpResponse::Ok().json(review))
}

pub async fn delete_review(
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let deleted = sqlx::query("DELETE FROM review WHERE id = ?")
        .bind(path.into_inner())
        .execute(pool.get_ref())
        .await?
        .rows_affected();

    if deleted == 0 {
        return Err(ApiError::NotFound("Review not found".to_string()));
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Review deleted successfully"
    })))
}
