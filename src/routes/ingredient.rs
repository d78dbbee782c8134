use actix_web::{delete, get, post, put, web, HttpResponse};
use serde::Deserialize;

use crate::db::Database;
use crate::error::ServiceError;
use crate::models::{IngredientPage, IngredientPayload};
use crate::query::ingredient::{self, DEFAULT_LIMIT};

#[derive(Debug, Deserialize)]
pub(crate) struct IngredientSearch {
    #[serde(default)]
    query: String,
    #[serde(default)]
    offset: i64,
    limit: Option<i64>,
}

#[get("/ingredients")]
pub(crate) async fn list_ingredients(
    params: web::Query<IngredientSearch>,
    db: web::Data<Database>,
) -> Result<HttpResponse, ServiceError> {
    let params = params.into_inner();
    let page = db
        .run(move |conn| {
            let limit = params.limit.unwrap_or(DEFAULT_LIMIT);
            Ok(IngredientPage {
                total: ingredient::count(&params.query, conn)?,
                items: ingredient::find_all(&params.query, params.offset, limit, conn)?,
            })
        })
        .await?;
    Ok(HttpResponse::Ok().json(page))
}

#[post("/ingredients")]
pub(crate) async fn create_ingredient(
    payload: web::Json<IngredientPayload>,
    db: web::Data<Database>,
) -> Result<HttpResponse, ServiceError> {
    let payload = payload.into_inner();
    payload.validate()?;
    let created = db
        .run(move |conn| ingredient::create(&payload.name, conn))
        .await?;
    Ok(HttpResponse::Created().json(created))
}

#[get("/ingredients/{id}")]
pub(crate) async fn get_ingredient(
    id: web::Path<i32>,
    db: web::Data<Database>,
) -> Result<HttpResponse, ServiceError> {
    let id = id.into_inner();
    let detail = db
        .run(move |conn| {
            ingredient::find_detail(id, conn)?
                .ok_or_else(|| ServiceError::not_found("ingredient", id))
        })
        .await?;
    Ok(HttpResponse::Ok().json(detail))
}

#[put("/ingredients/{id}")]
pub(crate) async fn update_ingredient(
    id: web::Path<i32>,
    payload: web::Json<IngredientPayload>,
    db: web::Data<Database>,
) -> Result<HttpResponse, ServiceError> {
    let id = id.into_inner();
    let payload = payload.into_inner();
    payload.validate()?;
    let renamed = db
        .run(move |conn| ingredient::rename(id, &payload.name, conn))
        .await?;
    Ok(HttpResponse::Ok().json(renamed))
}

#[delete("/ingredients/{id}")]
pub(crate) async fn delete_ingredient(
    id: web::Path<i32>,
    db: web::Data<Database>,
) -> Result<HttpResponse, ServiceError> {
    let id = id.into_inner();
    let deleted = db.run(move |conn| ingredient::delete(id, conn)).await?;
    Ok(HttpResponse::Ok().json(deleted))
}
