use diesel::dsl::now;
use diesel::prelude::*;

use super::{contains, inserted_id};
use crate::error::ServiceError;
use crate::models::{Employee, Store, StoreFields, StoreRow};
use crate::schema::{employee, store};

fn with_count(row: StoreRow, conn: &MysqlConnection) -> Result<Store, ServiceError> {
    let employees = count_employees(row.id, conn)?;
    Ok(row.into_store(employees))
}

pub(crate) fn create(fields: &StoreFields, conn: &MysqlConnection) -> Result<Store, ServiceError> {
    conn.transaction::<_, ServiceError, _>(|| {
        diesel::insert_into(store::table).values(fields).execute(conn)?;
        let id = inserted_id(conn)?;
        let row: StoreRow = store::table.find(id).first(conn)?;
        Ok(row.into_store(0))
    })
}

pub(crate) fn find_all(
    keyword: &str,
    state: &str,
    city: &str,
    conn: &MysqlConnection,
) -> Result<Vec<Store>, ServiceError> {
    let rows: Vec<StoreRow> = store::table
        .filter(store::name.like(contains(keyword)))
        .filter(store::state.like(contains(state)))
        .filter(store::city.like(contains(city)))
        .order(store::id.asc())
        .load(conn)?;
    rows.into_iter().map(|row| with_count(row, conn)).collect()
}

pub(crate) fn find(id: i32, conn: &MysqlConnection) -> Result<Option<Store>, ServiceError> {
    let row: Option<StoreRow> = store::table.find(id).first(conn).optional()?;
    row.map(|row| with_count(row, conn)).transpose()
}

pub(crate) fn update(id: i32, fields: &StoreFields, conn: &MysqlConnection) -> Result<Store, ServiceError> {
    conn.transaction::<_, ServiceError, _>(|| {
        let updated = diesel::update(store::table.find(id))
            .set((fields, store::updated_at.eq(now)))
            .execute(conn)?;
        if updated == 0 {
            return Err(ServiceError::not_found("store", id));
        }
        let row: StoreRow = store::table.find(id).first(conn)?;
        with_count(row, conn)
    })
}

/// Deletes a store. Employees assigned to it are left without a store.
pub(crate) fn delete(id: i32, conn: &MysqlConnection) -> Result<Store, ServiceError> {
    conn.transaction::<_, ServiceError, _>(|| {
        let found = find(id, conn)?.ok_or_else(|| ServiceError::not_found("store", id))?;
        diesel::update(employee::table.filter(employee::store_id.eq(id)))
            .set(employee::store_id.eq(None::<i32>))
            .execute(conn)?;
        diesel::delete(store::table.find(id)).execute(conn)?;
        Ok(found)
    })
}

pub(crate) fn count_employees(store_id: i32, conn: &MysqlConnection) -> Result<i64, ServiceError> {
    Ok(employee::table
        .filter(employee::store_id.eq(store_id))
        .count()
        .get_result(conn)?)
}

pub(crate) fn employees_in(store_id: i32, conn: &MysqlConnection) -> Result<Vec<Employee>, ServiceError> {
    Ok(employee::table
        .filter(employee::store_id.eq(store_id))
        .order(employee::name.asc())
        .load(conn)?)
}
