use crate::booking::BookingCoordinator;
use crate::error::ApiError;
use crate::models::reservation::{CreateReservation, Reservation, UpdateReservation};
use actix_web::{web, HttpResponse};
use sqlx::SqlitePool;
use validator::Validate;

pub async fn get_reservations(pool: web::Data<SqlitePool>) -> Result<HttpResponse, ApiError> {
    let reservations = sqlx::query_as::<_, Reservation>("SELECT * FROM reservation ORDER BY id")
        .fetch_all(pool.get_ref())
        .await?;

    Ok(HttpResponse::Ok().json(reservations))
}

pub async fn create_reservation(
    coordinator: web::Data<BookingCoordinator>,
    body: web::Json<CreateReservation>,
) -> Result<HttpResponse, ApiError> {
    body.validate()?;

    let reservation = coordinator.book(&body).await?;

    Ok(HttpResponse::Created().json(serde_json::json!({
        "id": reservation.id,
        "message": "Reservation created successfully",
        "reservation": reservation
    })))
}

pub async fn get_reservation(
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();

    match sqlx::query_as::<_, Reservation>("SELECT * FROM reservation WHERE id = ?")
        .bind(id)
        .fetch_optional(pool.get_ref())
        .await?
    {
        Some(reservation) => Ok(HttpResponse::Ok().json(reservation)),
        None => Err(ApiError::NotFound("Reservation not found".to_string())),
    }
}

/// Party size and meal changes re-run the capacity check; see
/// [`BookingCoordinator::update_reservation`].
pub async fn update_reservation(
    coordinator: web::Data<BookingCoordinator>,
    path: web::Path<i64>,
    body: web::Json<UpdateReservation>,
) -> Result<HttpResponse, ApiError> {
    body.validate()?;
    if body.is_empty() {
        return Err(ApiError::BadRequest("No fields to update".to_string()));
    }

    let reservation = coordinator
        .update_reservation(path.into_inner(), &body)
        .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Reservation updated successfully",
        "reservation": reservation
    })))
}

pub async fn delete_reservation(
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();

    let deleted = sqlx::query("DELETE FROM reservation WHERE id = ?")
        .bind(id)
        .execute(pool.get_ref())
        .await?
        .rows_affected();

    if deleted == 0 {
        return Err(ApiError::NotFound("Reservation not found".to_string()));
    }

    log::info!("reservation {id} cancelled");
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Reservation deleted successfully",
        "id": id
    })))
}
