use actix_web::{get, web, HttpResponse};
use log::debug;

use crate::cache::{Lookup, MenuCache};
use crate::db::Database;
use crate::error::ServiceError;
use crate::query;

/// All dishes and combos, served from Redis when a fresh copy is cached.
#[get("/menu")]
pub(crate) async fn get_menu(
    db: web::Data<Database>,
    cache: web::Data<MenuCache>,
) -> Result<HttpResponse, ServiceError> {
    let generation = match cache.fetch().await {
        Lookup::Hit(menu) => {
            debug!("menu served from cache");
            return Ok(HttpResponse::Ok().json(menu));
        }
        Lookup::Miss(generation) => generation,
    };
    //if cache does not exist, query the db but cache the result afterwards
    let menu = db.run(|conn| query::menu::load(conn)).await?;
    let body = HttpResponse::Ok().json(&menu);
    // only a generation read before the load may be written back
    if let Some(generation) = generation {
        cache.store(menu, generation).await;
    }
    Ok(body)
}
