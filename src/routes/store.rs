use actix_web::{delete, get, post, put, web, HttpResponse};
use serde::Deserialize;

use crate::db::Database;
use crate::error::ServiceError;
use crate::models::StorePayload;
use crate::query::store;

#[derive(Debug, Deserialize)]
pub(crate) struct StoreSearch {
    #[serde(default)]
    query: String,
    #[serde(default)]
    state: String,
    #[serde(default)]
    city: String,
}

#[get("/stores")]
pub(crate) async fn list_stores(
    params: web::Query<StoreSearch>,
    db: web::Data<Database>,
) -> Result<HttpResponse, ServiceError> {
    let params = params.into_inner();
    let stores = db
        .run(move |conn| store::find_all(&params.query, &params.state, &params.city, conn))
        .await?;
    Ok(HttpResponse::Ok().json(stores))
}

#[post("/stores")]
pub(crate) async fn create_store(
    payload: web::Json<StorePayload>,
    db: web::Data<Database>,
) -> Result<HttpResponse, ServiceError> {
    let payload = payload.into_inner();
    payload.fields()?;
    let created = db
        .run(move |conn| store::create(&payload.fields()?, conn))
        .await?;
    Ok(HttpResponse::Created().json(created))
}

#[get("/stores/{id}")]
pub(crate) async fn get_store(
    id: web::Path<i32>,
    db: web::Data<Database>,
) -> Result<HttpResponse, ServiceError> {
    let id = id.into_inner();
    let found = db
        .run(move |conn| store::find(id, conn)?.ok_or_else(|| ServiceError::not_found("store", id)))
        .await?;
    Ok(HttpResponse::Ok().json(found))
}

#[put("/stores/{id}")]
pub(crate) async fn update_store(
    id: web::Path<i32>,
    payload: web::Json<StorePayload>,
    db: web::Data<Database>,
) -> Result<HttpResponse, ServiceError> {
    let id = id.into_inner();
    let payload = payload.into_inner();
    payload.fields()?;
    let updated = db
        .run(move |conn| store::update(id, &payload.fields()?, conn))
        .await?;
    Ok(HttpResponse::Ok().json(updated))
}

/// Employees assigned to the store are kept, with their store cleared.
#[delete("/stores/{id}")]
pub(crate) async fn delete_store(
    id: web::Path<i32>,
    db: web::Data<Database>,
) -> Result<HttpResponse, ServiceError> {
    let id = id.into_inner();
    let deleted = db.run(move |conn| store::delete(id, conn)).await?;
    Ok(HttpResponse::Ok().json(deleted))
}

#[get("/stores/{id}/employees")]
pub(crate) async fn store_employees(
    id: web::Path<i32>,
    db: web::Data<Database>,
) -> Result<HttpResponse, ServiceError> {
    let id = id.into_inner();
    let employees = db
        .run(move |conn| {
            if store::find(id, conn)?.is_none() {
                return Err(ServiceError::not_found("store", id));
            }
            store::employees_in(id, conn)
        })
        .await?;
    Ok(HttpResponse::Ok().json(employees))
}
