use actix_web::http::header;
use actix_web::{delete, get, post, web, HttpRequest, HttpResponse};
use futures_util::StreamExt;

use crate::db::Database;
use crate::error::ServiceError;
use crate::models::extension_for;
use crate::query::image;

const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Stores the raw request body as an image. The format comes from the
/// `Content-Type` header.
#[post("/images")]
pub(crate) async fn upload_image(
    req: HttpRequest,
    mut body: web::Payload,
    db: web::Data<Database>,
) -> Result<HttpResponse, ServiceError> {
    let content_type = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    let extension = extension_for(content_type)?;

    let mut data = web::BytesMut::new();
    while let Some(chunk) = body.next().await {
        let chunk = chunk.map_err(|e| ServiceError::invalid(e.to_string()))?;
        if data.len() + chunk.len() > MAX_IMAGE_BYTES {
            return Err(ServiceError::TooLarge {
                limit: MAX_IMAGE_BYTES,
            });
        }
        data.extend_from_slice(&chunk);
    }
    if data.is_empty() {
        return Err(ServiceError::invalid("image body is empty"));
    }

    let stored = db
        .run(move |conn| image::create(&data, extension, conn))
        .await?;
    Ok(HttpResponse::Created().json(stored.to_ref()))
}

#[get("/images/{name}")]
pub(crate) async fn get_image(
    name: web::Path<String>,
    db: web::Data<Database>,
) -> Result<HttpResponse, ServiceError> {
    let name = name.into_inner();
    let found = db
        .run(move |conn| {
            image::find_by_name(&name, conn)?.ok_or_else(|| ServiceError::not_found("image", &name))
        })
        .await?;
    let content_type = found.content_type();
    Ok(HttpResponse::Ok().content_type(content_type).body(found.data))
}

#[delete("/images/{name}")]
pub(crate) async fn delete_image(
    name: web::Path<String>,
    db: web::Data<Database>,
) -> Result<HttpResponse, ServiceError> {
    let name = name.into_inner();
    db.run(move |conn| image::delete_by_name(&name, conn)).await?;
    Ok(HttpResponse::NoContent().finish())
}
