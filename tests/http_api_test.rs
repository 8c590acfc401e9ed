//! HTTP surface, driven through `actix_web::test`.

mod common;

use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use common::{insert_meal, insert_meal_at, reserved_spots, setup};
use meal_sharing::booking::BookingCoordinator;
use meal_sharing::error::ErrorResponse;
use meal_sharing::handlers;
use meal_sharing::models::meal::MealWithSpots;
use meal_sharing::models::reservation::Reservation;
use meal_sharing::models::review::Review;
use serde_json::{json, Value};
use std::time::Duration;

macro_rules! app {
    ($pool:expr) => {{
        let coordinator = BookingCoordinator::new($pool.clone(), Duration::from_secs(5));
        test::init_service(
            App::new()
                .app_data(web::Data::new($pool.clone()))
                .app_data(web::Data::new(coordinator))
                .configure(handlers::configure),
        )
        .await
    }};
}

fn booking_body(meal_id: i64, guests: i64) -> Value {
    json!({
        "meal_id": meal_id,
        "number_of_guests": guests,
        "contact_name": "Ada",
        "contact_phonenumber": "+45 12345678",
        "contact_email": "ada@example.com",
        "created_date": "2024-05-01 18:30:00"
    })
}

#[actix_web::test]
async fn booking_returns_created_then_rejects_overflow() {
    let db = setup().await;
    let app = app!(db.pool);
    let meal = insert_meal(&db.pool, "Lasagna", 3).await;

    let req = test::TestRequest::post()
        .uri("/reservations")
        .set_json(booking_body(meal, 3))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["reservation"]["number_of_guests"], 3);
    assert_eq!(body["reservation"]["created_date"], "2024-05-01T18:30:00");

    let req = test::TestRequest::post()
        .uri("/reservations")
        .set_json(booking_body(meal, 1))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: ErrorResponse = test::read_body_json(resp).await;
    assert_eq!(body.error, "Not enough available spots");

    assert_eq!(reserved_spots(&db.pool, meal).await, 3);
}

#[actix_web::test]
async fn booking_unknown_meal_is_404() {
    let db = setup().await;
    let app = app!(db.pool);

    let req = test::TestRequest::post()
        .uri("/reservations")
        .set_json(booking_body(77, 1))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn zero_guests_and_bad_email_are_400() {
    let db = setup().await;
    let app = app!(db.pool);
    let meal = insert_meal(&db.pool, "Curry", 3).await;

    let req = test::TestRequest::post()
        .uri("/reservations")
        .set_json(booking_body(meal, 0))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::BAD_REQUEST
    );

    let mut body = booking_body(meal, 1);
    body["contact_email"] = json!("not-an-email");
    let req = test::TestRequest::post()
        .uri("/reservations")
        .set_json(body)
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::BAD_REQUEST
    );
}

#[actix_web::test]
async fn meal_detail_reports_spots() {
    let db = setup().await;
    let app = app!(db.pool);
    let meal = insert_meal(&db.pool, "Risotto", 5).await;

    let req = test::TestRequest::post()
        .uri("/reservations")
        .set_json(booking_body(meal, 2))
        .to_request();
    test::call_service(&app, req).await;

    let req = test::TestRequest::get()
        .uri(&format!("/meals/{meal}"))
        .to_request();
    let detail: MealWithSpots = test::call_and_read_body_json(&app, req).await;
    assert_eq!(detail.meal.title, "Risotto");
    assert_eq!(detail.reserved_spots, 2);
    assert_eq!(detail.available_spots, 3);
    assert_eq!(detail.avg_stars, None);

    let req = test::TestRequest::get().uri("/meals/999").to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NOT_FOUND
    );
}

#[actix_web::test]
async fn meal_listing_filters_and_sorts() {
    let db = setup().await;
    let app = app!(db.pool);
    let cheap = insert_meal_at(&db.pool, "Soup night", 2, 50.0, 3).await;
    let pricey = insert_meal_at(&db.pool, "Tasting menu", 4, 400.0, 10).await;
    let past = insert_meal_at(&db.pool, "Old soup", 4, 80.0, -10).await;

    let req = test::TestRequest::post()
        .uri("/reservations")
        .set_json(booking_body(cheap, 2))
        .to_request();
    test::call_service(&app, req).await;

    let ids = |meals: Vec<MealWithSpots>| meals.into_iter().map(|m| m.meal.id).collect::<Vec<_>>();

    let req = test::TestRequest::get().uri("/meals?maxPrice=100").to_request();
    let meals: Vec<MealWithSpots> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(ids(meals), vec![cheap, past]);

    let req = test::TestRequest::get().uri("/meals?title=soup").to_request();
    let meals: Vec<MealWithSpots> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(ids(meals), vec![cheap, past]);

    let req = test::TestRequest::get()
        .uri("/meals?availableReservations=true")
        .to_request();
    let meals: Vec<MealWithSpots> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(ids(meals), vec![pricey, past]);

    let req = test::TestRequest::get()
        .uri("/meals?availableReservations=false")
        .to_request();
    let meals: Vec<MealWithSpots> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(ids(meals), vec![cheap]);

    let req = test::TestRequest::get()
        .uri("/meals?sortKey=price&sortDir=desc")
        .to_request();
    let meals: Vec<MealWithSpots> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(ids(meals), vec![pricey, past, cheap]);

    let req = test::TestRequest::get().uri("/past-meals").to_request();
    let meals: Vec<MealWithSpots> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(ids(meals), vec![past]);

    let req = test::TestRequest::get().uri("/future-meals").to_request();
    let meals: Vec<MealWithSpots> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(ids(meals), vec![cheap, pricey]);

    let req = test::TestRequest::get().uri("/last-meal").to_request();
    let meal: MealWithSpots = test::call_and_read_body_json(&app, req).await;
    assert_eq!(meal.meal.id, past);
}

#[actix_web::test]
async fn unknown_sort_key_is_400() {
    let db = setup().await;
    let app = app!(db.pool);

    let req = test::TestRequest::get()
        .uri("/meals?sortKey=calories")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: ErrorResponse = test::read_body_json(resp).await;
    assert_eq!(body.error, "Invalid sortKey: calories");
}

#[actix_web::test]
async fn malformed_requests_get_json_errors() {
    let db = setup().await;
    let app = app!(db.pool);
    let meal = insert_meal(&db.pool, "Goulash", 4).await;

    let mut wrong_type = booking_body(meal, 1);
    wrong_type["number_of_guests"] = json!("two");
    let mut missing_field = booking_body(meal, 1);
    missing_field.as_object_mut().unwrap().remove("contact_email");

    for body in [wrong_type, missing_field] {
        let req = test::TestRequest::post()
            .uri("/reservations")
            .set_json(body)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let error: ErrorResponse = test::read_body_json(resp).await;
        assert!(error.error.starts_with("Invalid JSON body"), "{}", error.error);
    }

    let req = test::TestRequest::get().uri("/meals?maxPrice=abc").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let error: ErrorResponse = test::read_body_json(resp).await;
    assert!(error.error.starts_with("Invalid query string"), "{}", error.error);

    let req = test::TestRequest::get().uri("/meals/abc").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let error: ErrorResponse = test::read_body_json(resp).await;
    assert!(error.error.starts_with("Invalid path"), "{}", error.error);

    assert_eq!(reserved_spots(&db.pool, meal).await, 0);
}

#[actix_web::test]
async fn first_meal_on_empty_table_is_404() {
    let db = setup().await;
    let app = app!(db.pool);

    let req = test::TestRequest::get().uri("/first-meal").to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NOT_FOUND
    );
}

#[actix_web::test]
async fn meal_lifecycle() {
    let db = setup().await;
    let app = app!(db.pool);

    let req = test::TestRequest::post()
        .uri("/meals")
        .set_json(json!({
            "title": "Smørrebrød",
            "description": "Open sandwiches",
            "location": "Aarhus",
            "when": "2030-06-01 12:00:00",
            "max_reservations": 4,
            "price": 120.0
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Value = test::read_body_json(resp).await;
    let id = created["id"].as_i64().unwrap();

    let req = test::TestRequest::post()
        .uri("/reservations")
        .set_json(booking_body(id, 3))
        .to_request();
    test::call_service(&app, req).await;

    let req = test::TestRequest::put()
        .uri(&format!("/meals/{id}"))
        .set_json(json!({ "max_reservations": 2 }))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::CONFLICT
    );

    let req = test::TestRequest::put()
        .uri(&format!("/meals/{id}"))
        .set_json(json!({ "price": 99.5, "max_reservations": 6 }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let req = test::TestRequest::get()
        .uri(&format!("/meals/{id}"))
        .to_request();
    let detail: MealWithSpots = test::call_and_read_body_json(&app, req).await;
    assert_eq!(detail.meal.price, 99.5);
    assert_eq!(detail.available_spots, 3);

    let req = test::TestRequest::delete()
        .uri(&format!("/meals/{id}"))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    // Reservations go with the meal.
    assert_eq!(reserved_spots(&db.pool, id).await, 0);

    let req = test::TestRequest::delete()
        .uri(&format!("/meals/{id}"))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NOT_FOUND
    );
}

#[actix_web::test]
async fn reservation_update_goes_through_capacity_check() {
    let db = setup().await;
    let app = app!(db.pool);
    let meal = insert_meal(&db.pool, "Crêpes", 4).await;

    let req = test::TestRequest::post()
        .uri("/reservations")
        .set_json(booking_body(meal, 2))
        .to_request();
    let created: Value = test::call_and_read_body_json(&app, req).await;
    let id = created["id"].as_i64().unwrap();

    let req = test::TestRequest::put()
        .uri(&format!("/reservations/{id}"))
        .set_json(json!({ "number_of_guests": 5 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::put()
        .uri(&format!("/reservations/{id}"))
        .set_json(json!({ "number_of_guests": 4 }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let req = test::TestRequest::get()
        .uri(&format!("/reservations/{id}"))
        .to_request();
    let reservation: Reservation = test::call_and_read_body_json(&app, req).await;
    assert_eq!(reservation.number_of_guests, 4);

    let req = test::TestRequest::delete()
        .uri(&format!("/reservations/{id}"))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let req = test::TestRequest::get()
        .uri(&format!("/reservations/{id}"))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NOT_FOUND
    );
}

#[actix_web::test]
async fn reviews_feed_meal_rating() {
    let db = setup().await;
    let app = app!(db.pool);
    let meal = insert_meal(&db.pool, "Pierogi", 4).await;

    let req = test::TestRequest::get()
        .uri(&format!("/meals/{meal}/reviews"))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NOT_FOUND
    );

    for stars in [4, 5] {
        let req = test::TestRequest::post()
            .uri("/reviews")
            .set_json(json!({
                "title": "Great",
                "description": "Would come again",
                "meal_id": meal,
                "stars": stars
            }))
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::CREATED
        );
    }

    let req = test::TestRequest::post()
        .uri("/reviews")
        .set_json(json!({ "title": "Meh", "meal_id": meal, "stars": 6 }))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::BAD_REQUEST
    );

    let req = test::TestRequest::post()
        .uri("/reviews")
        .set_json(json!({ "title": "Lost", "meal_id": 555, "stars": 3 }))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NOT_FOUND
    );

    let req = test::TestRequest::get()
        .uri(&format!("/meals/{meal}/reviews"))
        .to_request();
    let reviews: Vec<Review> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(reviews.len(), 2);

    let req = test::TestRequest::put()
        .uri(&format!("/reviews/{}", reviews[0].id))
        .set_json(json!({ "stars": 2 }))
        .to_request();
    let updated: Review = test::call_and_read_body_json(&app, req).await;
    assert_eq!(updated.stars, 2);
    assert_eq!(updated.title, "Great");

    let req = test::TestRequest::get()
        .uri(&format!("/meals/{meal}"))
        .to_request();
    let detail: MealWithSpots = test::call_and_read_body_json(&app, req).await;
    assert_eq!(detail.avg_stars, Some(3.5));

    let req = test::TestRequest::delete()
        .uri(&format!("/reviews/{}", reviews[1].id))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
}
