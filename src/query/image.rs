use diesel::prelude::*;
use uuid::Uuid;

use super::inserted_id;
use crate::error::ServiceError;
use crate::models::{Image, NewImage};
use crate::schema::image;

/// Stores `data` under a fresh `{uuid}.{extension}` name.
pub(crate) fn create(data: &[u8], extension: &str, conn: &MysqlConnection) -> Result<Image, ServiceError> {
    let name = format!("{}.{}", Uuid::new_v4(), extension);
    conn.transaction::<_, ServiceError, _>(|| {
        diesel::insert_into(image::table)
            .values(&NewImage { name: &name, data })
            .execute(conn)?;
        let id = inserted_id(conn)?;
        Ok(image::table.find(id).first(conn)?)
    })
}

pub(crate) fn find_by_name(name: &str, conn: &MysqlConnection) -> Result<Option<Image>, ServiceError> {
    Ok(image::table
        .filter(image::name.eq(name))
        .first(conn)
        .optional()?)
}

pub(crate) fn delete_by_name(name: &str, conn: &MysqlConnection) -> Result<(), ServiceError> {
    let deleted = diesel::delete(image::table.filter(image::name.eq(name))).execute(conn)?;
    if deleted == 0 {
        return Err(ServiceError::not_found("image", name));
    }
    Ok(())
}
