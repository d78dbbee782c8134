use actix_web::{delete, get, post, put, web, HttpResponse};
use serde::Deserialize;

use crate::db::Database;
use crate::error::ServiceError;
use crate::models::EmployeePayload;
use crate::query::employee;

#[derive(Debug, Deserialize)]
pub(crate) struct EmployeeFilter {
    position: Option<String>,
}

#[get("/employees")]
pub(crate) async fn list_employees(
    params: web::Query<EmployeeFilter>,
    db: web::Data<Database>,
) -> Result<HttpResponse, ServiceError> {
    let position = params.into_inner().position.filter(|p| !p.trim().is_empty());
    let employees = db
        .run(move |conn| employee::find_all(position.as_deref(), conn))
        .await?;
    Ok(HttpResponse::Ok().json(employees))
}

/// Distinct positions with how many employees hold each.
#[get("/employees/positions")]
pub(crate) async fn positions(db: web::Data<Database>) -> Result<HttpResponse, ServiceError> {
    let counts = db.run(|conn| employee::headcount(conn)).await?;
    Ok(HttpResponse::Ok().json(counts))
}

#[post("/employees")]
pub(crate) async fn create_employee(
    payload: web::Json<EmployeePayload>,
    db: web::Data<Database>,
) -> Result<HttpResponse, ServiceError> {
    let payload = payload.into_inner();
    payload.validate()?;
    let created = db
        .run(move |conn| employee::create(&payload.fields(), conn))
        .await?;
    Ok(HttpResponse::Created().json(created))
}

#[get("/employees/{id}")]
pub(crate) async fn get_employee(
    id: web::Path<i32>,
    db: web::Data<Database>,
) -> Result<HttpResponse, ServiceError> {
    let id = id.into_inner();
    let found = db
        .run(move |conn| {
            employee::find(id, conn)?.ok_or_else(|| ServiceError::not_found("employee", id))
        })
        .await?;
    Ok(HttpResponse::Ok().json(found))
}

#[put("/employees/{id}")]
pub(crate) async fn update_employee(
    id: web::Path<i32>,
    payload: web::Json<EmployeePayload>,
    db: web::Data<Database>,
) -> Result<HttpResponse, ServiceError> {
    let id = id.into_inner();
    let payload = payload.into_inner();
    payload.validate()?;
    let updated = db
        .run(move |conn| employee::update(id, &payload.fields(), conn))
        .await?;
    Ok(HttpResponse::Ok().json(updated))
}

#[delete("/employees/{id}")]
pub(crate) async fn delete_employee(
    id: web::Path<i32>,
    db: web::Data<Database>,
) -> Result<HttpResponse, ServiceError> {
    let id = id.into_inner();
    let deleted = db.run(move |conn| employee::delete(id, conn)).await?;
    Ok(HttpResponse::Ok().json(deleted))
}

#[cfg(test)]
mod tests {
    use actix_web::{http::StatusCode, test, App};
    use serde_json::json;

    use super::*;
    use crate::db::tests::unreachable_database;

    #[actix_web::test]
    async fn malformed_email_is_rejected() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(unreachable_database()))
                .service(create_employee),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/employees")
            .set_json(json!({
                "name": "Ada",
                "position": "cook",
                "email": "ada.example.com",
                "hire_date": "2021-04-01",
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
