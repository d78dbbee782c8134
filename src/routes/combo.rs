use actix_web::{delete, get, post, put, web, HttpResponse};

use super::Search;
use crate::cache::MenuCache;
use crate::db::Database;
use crate::error::ServiceError;
use crate::models::ComboPayload;
use crate::query::combo;

#[get("/menu/combos")]
pub(crate) async fn list_combos(
    params: web::Query<Search>,
    db: web::Data<Database>,
) -> Result<HttpResponse, ServiceError> {
    let keyword = params.into_inner().query;
    let combos = db.run(move |conn| combo::find_all(&keyword, conn)).await?;
    Ok(HttpResponse::Ok().json(combos))
}

/// Creates a combo from existing dishes. Naming a dish that does not exist
/// fails the whole request with 422.
#[post("/menu/combos")]
pub(crate) async fn create_combo(
    payload: web::Json<ComboPayload>,
    db: web::Data<Database>,
    cache: web::Data<MenuCache>,
) -> Result<HttpResponse, ServiceError> {
    let payload = payload.into_inner();
    payload.validate()?;
    let created = db.run(move |conn| combo::create(&payload, conn)).await?;
    cache.invalidate().await;
    Ok(HttpResponse::Created().json(created))
}

#[get("/menu/combos/{id}")]
pub(crate) async fn get_combo(
    id: web::Path<i32>,
    db: web::Data<Database>,
) -> Result<HttpResponse, ServiceError> {
    let id = id.into_inner();
    let found = db
        .run(move |conn| combo::find(id, conn)?.ok_or_else(|| ServiceError::not_found("combo", id)))
        .await?;
    Ok(HttpResponse::Ok().json(found))
}

#[put("/menu/combos/{id}")]
pub(crate) async fn update_combo(
    id: web::Path<i32>,
    payload: web::Json<ComboPayload>,
    db: web::Data<Database>,
    cache: web::Data<MenuCache>,
) -> Result<HttpResponse, ServiceError> {
    let id = id.into_inner();
    let payload = payload.into_inner();
    payload.validate()?;
    let updated = db.run(move |conn| combo::update(id, &payload, conn)).await?;
    cache.invalidate().await;
    Ok(HttpResponse::Ok().json(updated))
}

#[delete("/menu/combos/{id}")]
pub(crate) async fn delete_combo(
    id: web::Path<i32>,
    db: web::Data<Database>,
    cache: web::Data<MenuCache>,
) -> Result<HttpResponse, ServiceError> {
    let id = id.into_inner();
    let deleted = db.run(move |conn| combo::delete(id, conn)).await?;
    cache.invalidate().await;
    Ok(HttpResponse::Ok().json(deleted))
}
