use actix_web::{delete, get, post, put, web, HttpResponse};

use super::Search;
use crate::cache::MenuCache;
use crate::db::Database;
use crate::error::ServiceError;
use crate::models::DishPayload;
use crate::query::dish;

#[get("/menu/dishes")]
pub(crate) async fn list_dishes(
    params: web::Query<Search>,
    db: web::Data<Database>,
) -> Result<HttpResponse, ServiceError> {
    let keyword = params.into_inner().query;
    let dishes = db.run(move |conn| dish::find_all(&keyword, conn)).await?;
    Ok(HttpResponse::Ok().json(dishes))
}

#[post("/menu/dishes")]
pub(crate) async fn create_dish(
    payload: web::Json<DishPayload>,
    db: web::Data<Database>,
    cache: web::Data<MenuCache>,
) -> Result<HttpResponse, ServiceError> {
    let payload = payload.into_inner();
    payload.validate()?;
    let created = db.run(move |conn| dish::create(&payload, conn)).await?;
    cache.invalidate().await;
    Ok(HttpResponse::Created().json(created))
}

#[get("/menu/dishes/{id}")]
pub(crate) async fn get_dish(
    id: web::Path<i32>,
    db: web::Data<Database>,
) -> Result<HttpResponse, ServiceError> {
    let id = id.into_inner();
    let found = db
        .run(move |conn| dish::find(id, conn)?.ok_or_else(|| ServiceError::not_found("dish", id)))
        .await?;
    Ok(HttpResponse::Ok().json(found))
}

#[put("/menu/dishes/{id}")]
pub(crate) async fn update_dish(
    id: web::Path<i32>,
    payload: web::Json<DishPayload>,
    db: web::Data<Database>,
    cache: web::Data<MenuCache>,
) -> Result<HttpResponse, ServiceError> {
    let id = id.into_inner();
    let payload = payload.into_inner();
    payload.validate()?;
    let updated = db.run(move |conn| dish::update(id, &payload, conn)).await?;
    cache.invalidate().await;
    Ok(HttpResponse::Ok().json(updated))
}

#[delete("/menu/dishes/{id}")]
pub(crate) async fn delete_dish(
    id: web::Path<i32>,
    db: web::Data<Database>,
    cache: web::Data<MenuCache>,
) -> Result<HttpResponse, ServiceError> {
    let id = id.into_inner();
    let deleted = db.run(move |conn| dish::delete(id, conn)).await?;
    cache.invalidate().await;
    Ok(HttpResponse::Ok().json(deleted))
}

#[cfg(test)]
mod tests {
    use actix_web::{http::StatusCode, test, App};
    use serde_json::json;

    use super::*;
    use crate::db::tests::unreachable_database;

    #[actix_web::test]
    async fn invalid_dish_is_rejected_before_touching_the_database() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(unreachable_database()))
                .app_data(web::Data::new(MenuCache::disabled(60)))
                .service(create_dish),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/menu/dishes")
            .set_json(json!({
                "name": "Salad",
                "calories": 120,
                "price": -1.0,
                "ingredients": [],
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn duplicate_ingredient_lines_are_rejected() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(unreachable_database()))
                .app_data(web::Data::new(MenuCache::disabled(60)))
                .service(update_dish),
        )
        .await;

        let req = test::TestRequest::put()
            .uri("/menu/dishes/3")
            .set_json(json!({
                "name": "Salad",
                "calories": 120,
                "price": 7.5,
                "ingredients": [
                    { "name": "Tomato", "quantity": 1.0, "unit": "pc" },
                    { "name": " Tomato ", "quantity": 2.0, "unit": "pc" },
                ],
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
