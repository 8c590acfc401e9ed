use actix_web::{middleware, web, App, HttpServer};
use anyhow::Context;
use dotenv::dotenv;
use env_logger::Env;
use meal_sharing::booking::BookingCoordinator;
use meal_sharing::config::Config;
use meal_sharing::{db, handlers};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let config = Config::from_env().context("invalid configuration")?;

    log::info!("Connecting to database...");
    let pool = db::get_db_pool(&config)
        .await
        .context("failed to create database pool")?;

    log::info!("Running migrations...");
    db::run_migrations(&pool)
        .await
        .context("failed to run migrations")?;

    let coordinator = BookingCoordinator::new(pool.clone(), config.booking_timeout);

    log::info!("Starting server at http://{}:{}", config.host, config.port);

    let pool_data = web::Data::new(pool);
    let coordinator_data = web::Data::new(coordinator);

    HttpServer::new(move || {
        App::new()
            .app_data(pool_data.clone())
            .app_data(coordinator_data.clone())
            .wrap(middleware::Logger::default())
            .configure(handlers::configure)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await?;

    Ok(())
}
