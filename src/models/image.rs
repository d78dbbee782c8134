use chrono::NaiveDateTime;
use serde::Serialize;

use crate::error::ServiceError;
use crate::schema::image;

#[derive(Debug, Clone, Queryable)]
pub(crate) struct Image {
    pub id: i32,
    pub name: String,
    pub data: Vec<u8>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[table_name = "image"]
pub(crate) struct NewImage<'a> {
    pub name: &'a str,
    pub data: &'a [u8],
}

/// What a client needs to reference a stored image.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct ImageRef {
    pub id: i32,
    pub name: String,
    pub url: String,
}

impl Image {
    pub(crate) fn to_ref(&self) -> ImageRef {
        ImageRef {
            id: self.id,
            name: self.name.clone(),
            url: format!("/images/{}", self.name),
        }
    }

    pub(crate) fn content_type(&self) -> &'static str {
        content_type_for(&self.name)
    }
}

const FORMATS: &[(&str, &str)] = &[
    ("image/webp", "webp"),
    ("image/png", "png"),
    ("image/jpeg", "jpg"),
    ("image/gif", "gif"),
];

/// File extension to store an upload under, from its `Content-Type`.
pub(crate) fn extension_for(content_type: &str) -> Result<&'static str, ServiceError> {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    FORMATS
        .iter()
        .find(|(mime, _)| *mime == essence)
        .map(|(_, ext)| *ext)
        .ok_or_else(|| ServiceError::UnsupportedMedia(content_type.to_string()))
}

pub(crate) fn content_type_for(name: &str) -> &'static str {
    let ext = name.rsplit('.').next().unwrap_or_default().to_ascii_lowercase();
    match ext.as_str() {
        "jpeg" => "image/jpeg",
        other => FORMATS
            .iter()
            .find(|(_, e)| *e == other)
            .map(|(mime, _)| *mime)
            .unwrap_or("application/octet-stream"),
    }
}
