use crate::error::ApiError;
use actix_web::{web, HttpResponse};

pub mod meals;
pub mod reservations;
pub mod reviews;

/// Registers every route. Expects `web::Data<SqlitePool>` and
/// `web::Data<BookingCoordinator>` in app data.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(extractor_errors::json())
        .app_data(extractor_errors::query())
        .app_data(extractor_errors::path())
        .route("/api", web::get().to(welcome))
        .route("/all-meals", web::get().to(meals::all_meals))
        .route("/past-meals", web::get().to(meals::past_meals))
        .route("/future-meals", web::get().to(meals::future_meals))
        .route("/first-meal", web::get().to(meals::first_meal))
        .route("/last-meal", web::get().to(meals::last_meal))
        .service(
            web::scope("/meals")
                .route("", web::get().to(meals::get_meals))
                .route("", web::post().to(meals::create_meal))
                .route("/{id}", web::get().to(meals::get_meal_by_id))
                .route("/{id}", web::put().to(meals::update_meal))
                .route("/{id}", web::delete().to(meals::delete_meal))
                .route("/{id}/reviews", web::get().to(meals::get_meal_reviews)),
        )
        .service(
            web::scope("/reservations")
                .route("", web::get().to(reservations::get_reservations))
                .route("", web::post().to(reservations::create_reservation))
                .route("/{id}", web::get().to(reservations::get_reservation))
                .route("/{id}", web::put().to(reservations::update_reservation))
                .route("/{id}", web::delete().to(reservations::delete_reservation)),
        )
        .service(
            web::scope("/reviews")
                .route("", web::get().to(reviews::get_reviews))
                .route("", web::post().to(reviews::create_review))
                .route("/{id}", web::get().to(reviews::get_review))
                .route("/{id}", web::put().to(reviews::update_review))
                .route("/{id}", web::delete().to(reviews::delete_review)),
        );
}

async fn welcome() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body("<h1>Welcome to the Meal Sharing app</h1>")
}

/// Extractor failures (bad JSON, query strings, path segments) answer with
/// the same `{"error": ...}` body as every other error.
mod extractor_errors {
    use super::ApiError;
    use actix_web::web;

    pub fn json() -> web::JsonConfig {
        web::JsonConfig::default().error_handler(|err, _req| {
            ApiError::BadRequest(format!("Invalid JSON body: {err}")).into()
        })
    }

    pub fn query() -> web::QueryConfig {
        web::QueryConfig::default().error_handler(|err, _req| {
            ApiError::BadRequest(format!("Invalid query string: {err}")).into()
        })
    }

    pub fn path() -> web::PathConfig {
        web::PathConfig::default().error_handler(|err, _req| {
            ApiError::BadRequest(format!("Invalid path: {err}")).into()
        })
    }
}
