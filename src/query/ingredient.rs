use diesel::dsl::{exists, now};
use diesel::prelude::*;

use super::{contains, inserted_id};
use crate::error::ServiceError;
use crate::models::{Dish, Ingredient, IngredientDetail, NewIngredient, SupplierSummary};
use crate::schema::{dish, dish_ingredient, ingredient, supplier, supplier_ingredient};

pub(crate) const DEFAULT_LIMIT: i64 = 100;

pub(crate) fn create(name: &str, conn: &MysqlConnection) -> Result<Ingredient, ServiceError> {
    conn.transaction::<_, ServiceError, _>(|| {
        diesel::insert_into(ingredient::table)
            .values(&NewIngredient { name: name.trim() })
            .execute(conn)?;
        let id = inserted_id(conn)?;
        Ok(ingredient::table.find(id).first(conn)?)
    })
}

pub(crate) fn find_all(
    keyword: &str,
    offset: i64,
    limit: i64,
    conn: &MysqlConnection,
) -> Result<Vec<Ingredient>, ServiceError> {
    Ok(ingredient::table
        .filter(ingredient::name.like(contains(keyword)))
        .order(ingredient::name.asc())
        .offset(offset.max(0))
        .limit(limit.max(0))
        .load(conn)?)
}

pub(crate) fn count(keyword: &str, conn: &MysqlConnection) -> Result<i64, ServiceError> {
    Ok(ingredient::table
        .filter(ingredient::name.like(contains(keyword)))
        .count()
        .get_result(conn)?)
}

pub(crate) fn find(id: i32, conn: &MysqlConnection) -> Result<Option<Ingredient>, ServiceError> {
    Ok(ingredient::table.find(id).first(conn).optional()?)
}

pub(crate) fn find_by_name(
    name: &str,
    conn: &MysqlConnection,
) -> Result<Option<Ingredient>, ServiceError> {
    Ok(ingredient::table
        .filter(ingredient::name.eq(name.trim()))
        .first(conn)
        .optional()?)
}

pub(crate) fn find_detail(
    id: i32,
    conn: &MysqlConnection,
) -> Result<Option<IngredientDetail>, ServiceError> {
    let found = match find(id, conn)? {
        Some(found) => found,
        None => return Ok(None),
    };
    let suppliers = suppliers_of(id, conn)?;
    let dishes = dishes_using(id, conn)?;
    Ok(Some(IngredientDetail::new(found, suppliers, dishes)))
}

pub(crate) fn rename(id: i32, name: &str, conn: &MysqlConnection) -> Result<Ingredient, ServiceError> {
    conn.transaction::<_, ServiceError, _>(|| {
        let updated = diesel::update(ingredient::table.find(id))
            .set((ingredient::name.eq(name.trim()), ingredient::updated_at.eq(now)))
            .execute(conn)?;
        if updated == 0 {
            return Err(ServiceError::not_found("ingredient", id));
        }
        Ok(ingredient::table.find(id).first(conn)?)
    })
}

/// Deletes an ingredient nobody uses any more. Ingredients still linked to
/// a dish or a supplier are refused.
pub(crate) fn delete(id: i32, conn: &MysqlConnection) -> Result<Ingredient, ServiceError> {
    conn.transaction::<_, ServiceError, _>(|| {
        let found = find(id, conn)?.ok_or_else(|| ServiceError::not_found("ingredient", id))?;
        if is_referenced(id, conn)? {
            return Err(ServiceError::InUse(format!("ingredient {}", found.name)));
        }
        diesel::delete(ingredient::table.find(id)).execute(conn)?;
        Ok(found)
    })
}

pub(crate) fn is_referenced(id: i32, conn: &MysqlConnection) -> Result<bool, ServiceError> {
    let in_dish: bool = diesel::select(exists(
        dish_ingredient::table.filter(dish_ingredient::ingredient_id.eq(id)),
    ))
    .get_result(conn)?;
    if in_dish {
        return Ok(true);
    }
    Ok(diesel::select(exists(
        supplier_ingredient::table.filter(supplier_ingredient::ingredient_id.eq(id)),
    ))
    .get_result(conn)?)
}

pub(crate) fn suppliers_of(
    id: i32,
    conn: &MysqlConnection,
) -> Result<Vec<SupplierSummary>, ServiceError> {
    Ok(supplier_ingredient::table
        .inner_join(supplier::table)
        .filter(supplier_ingredient::ingredient_id.eq(id))
        .select((
            supplier::id,
            supplier::name,
            supplier::description,
            supplier::image_url,
        ))
        .order(supplier::name.asc())
        .load(conn)?)
}

pub(crate) fn dishes_using(id: i32, conn: &MysqlConnection) -> Result<Vec<Dish>, ServiceError> {
    Ok(dish_ingredient::table
        .inner_join(dish::table)
        .filter(dish_ingredient::ingredient_id.eq(id))
        .select(dish::all_columns)
        .order(dish::name.asc())
        .load(conn)?)
}
