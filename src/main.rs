#[macro_use]
extern crate diesel;

use std::io;

use actix_web::{middleware, web, App, HttpServer};

mod cache;
mod config;
mod db;
mod error;
mod models;
mod query;
mod reconcile;
mod routes;
mod schema;

use crate::cache::MenuCache;
use crate::config::Config;
use crate::db::Database;

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = Config::from_env().map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

    // set up database connection pool
    let db = Database::connect(&config).map_err(|e| {
        log::error!("failed to create database pool: {}", e);
        io::Error::new(io::ErrorKind::Other, e)
    })?;
    let menu_cache = MenuCache::connect(&config);

    log::info!(
        "starting HTTP server at http://{}:{}",
        config.bind_address,
        config.port
    );

    // Start HTTP server
    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(db.clone()))
            .app_data(web::Data::new(menu_cache.clone()))
            .wrap(middleware::Logger::default())
            .configure(routes::configure)
    })
    .bind((config.bind_address.as_str(), config.port))?
    .run()
    .await
}
