use diesel::dsl::now;
use diesel::prelude::*;

use super::{inserted_id, store as stores};
use crate::error::ServiceError;
use crate::models::{Employee, EmployeeDetail, EmployeeFields, PositionCount};
use crate::schema::employee;

fn detail(found: Employee, conn: &MysqlConnection) -> Result<EmployeeDetail, ServiceError> {
    let store = match found.store_id {
        Some(store_id) => stores::find(store_id, conn)?,
        None => None,
    };
    Ok(EmployeeDetail {
        employee: found,
        store,
    })
}

/// Emails identify employees; a second record may not claim one.
fn ensure_email_free(fields: &EmployeeFields, id: Option<i32>, conn: &MysqlConnection) -> Result<(), ServiceError> {
    match find_by_email(fields.email, conn)? {
        Some(holder) if Some(holder.employee.id) != id => Err(ServiceError::Duplicate(format!(
            "employee with email {}",
            fields.email
        ))),
        _ => Ok(()),
    }
}

fn ensure_store(fields: &EmployeeFields, conn: &MysqlConnection) -> Result<(), ServiceError> {
    if let Some(store_id) = fields.store_id {
        if stores::find(store_id, conn)?.is_none() {
            return Err(ServiceError::invalid(format!("store {} does not exist", store_id)));
        }
    }
    Ok(())
}

pub(crate) fn create(fields: &EmployeeFields, conn: &MysqlConnection) -> Result<EmployeeDetail, ServiceError> {
    conn.transaction::<_, ServiceError, _>(|| {
        ensure_store(fields, conn)?;
        ensure_email_free(fields, None, conn)?;
        diesel::insert_into(employee::table).values(fields).execute(conn)?;
        let id = inserted_id(conn)?;
        detail(employee::table.find(id).first(conn)?, conn)
    })
}

pub(crate) fn find_all(position: Option<&str>, conn: &MysqlConnection) -> Result<Vec<EmployeeDetail>, ServiceError> {
    let mut query = employee::table.order(employee::id.asc()).into_boxed();
    if let Some(position) = position {
        query = query.filter(employee::position.eq(position.trim()));
    }
    let found: Vec<Employee> = query.load(conn)?;
    found.into_iter().map(|e| detail(e, conn)).collect()
}

pub(crate) fn find(id: i32, conn: &MysqlConnection) -> Result<Option<EmployeeDetail>, ServiceError> {
    let found: Option<Employee> = employee::table.find(id).first(conn).optional()?;
    found.map(|e| detail(e, conn)).transpose()
}

pub(crate) fn find_by_email(email: &str, conn: &MysqlConnection) -> Result<Option<EmployeeDetail>, ServiceError> {
    let found: Option<Employee> = employee::table
        .filter(employee::email.eq(email.trim()))
        .first(conn)
        .optional()?;
    found.map(|e| detail(e, conn)).transpose()
}

pub(crate) fn update(id: i32, fields: &EmployeeFields, conn: &MysqlConnection) -> Result<EmployeeDetail, ServiceError> {
    conn.transaction::<_, ServiceError, _>(|| {
        ensure_store(fields, conn)?;
        ensure_email_free(fields, Some(id), conn)?;
        let updated = diesel::update(employee::table.find(id))
            .set((fields, employee::updated_at.eq(now)))
            .execute(conn)?;
        if updated == 0 {
            return Err(ServiceError::not_found("employee", id));
        }
        detail(employee::table.find(id).first(conn)?, conn)
    })
}

pub(crate) fn delete(id: i32, conn: &MysqlConnection) -> Result<EmployeeDetail, ServiceError> {
    conn.transaction::<_, ServiceError, _>(|| {
        let found = find(id, conn)?.ok_or_else(|| ServiceError::not_found("employee", id))?;
        diesel::delete(employee::table.find(id)).execute(conn)?;
        Ok(found)
    })
}

pub(crate) fn positions(conn: &MysqlConnection) -> Result<Vec<String>, ServiceError> {
    Ok(employee::table
        .select(employee::position)
        .distinct()
        .order(employee::position.asc())
        .load(conn)?)
}

pub(crate) fn count_by_position(position: &str, conn: &MysqlConnection) -> Result<i64, ServiceError> {
    Ok(employee::table
        .filter(employee::position.eq(position))
        .count()
        .get_result(conn)?)
}

/// Every distinct position with its headcount.
pub(crate) fn headcount(conn: &MysqlConnection) -> Result<Vec<PositionCount>, ServiceError> {
    positions(conn)?
        .into_iter()
        .map(|position| {
            let count = count_by_position(&position, conn)?;
            Ok(PositionCount { position, count })
        })
        .collect()
}
