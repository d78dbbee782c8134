use actix_web::{delete, get, post, put, web, HttpResponse};

use super::Search;
use crate::db::Database;
use crate::error::ServiceError;
use crate::models::SupplierPayload;
use crate::query::supplier;

#[get("/suppliers")]
pub(crate) async fn list_suppliers(
    params: web::Query<Search>,
    db: web::Data<Database>,
) -> Result<HttpResponse, ServiceError> {
    let keyword = params.into_inner().query;
    let suppliers = db.run(move |conn| supplier::find_all(&keyword, conn)).await?;
    Ok(HttpResponse::Ok().json(suppliers))
}

#[post("/suppliers")]
pub(crate) async fn create_supplier(
    payload: web::Json<SupplierPayload>,
    db: web::Data<Database>,
) -> Result<HttpResponse, ServiceError> {
    let payload = payload.into_inner();
    payload.validate()?;
    let created = db.run(move |conn| supplier::create(&payload, conn)).await?;
    Ok(HttpResponse::Created().json(created))
}

#[get("/suppliers/{id}")]
pub(crate) async fn get_supplier(
    id: web::Path<i32>,
    db: web::Data<Database>,
) -> Result<HttpResponse, ServiceError> {
    let id = id.into_inner();
    let found = db
        .run(move |conn| {
            supplier::find(id, conn)?.ok_or_else(|| ServiceError::not_found("supplier", id))
        })
        .await?;
    Ok(HttpResponse::Ok().json(found))
}

#[put("/suppliers/{id}")]
pub(crate) async fn update_supplier(
    id: web::Path<i32>,
    payload: web::Json<SupplierPayload>,
    db: web::Data<Database>,
) -> Result<HttpResponse, ServiceError> {
    let id = id.into_inner();
    let payload = payload.into_inner();
    payload.validate()?;
    let updated = db
        .run(move |conn| supplier::update(id, &payload, conn))
        .await?;
    Ok(HttpResponse::Ok().json(updated))
}

#[delete("/suppliers/{id}")]
pub(crate) async fn delete_supplier(
    id: web::Path<i32>,
    db: web::Data<Database>,
) -> Result<HttpResponse, ServiceError> {
    let id = id.into_inner();
    let deleted = db.run(move |conn| supplier::delete(id, conn)).await?;
    Ok(HttpResponse::Ok().json(deleted))
}
