use diesel::dsl::now;
use diesel::prelude::*;
use log::info;

use super::{contains, ingredient, inserted_id};
use crate::error::ServiceError;
use crate::models::{Dish, DishDetail, DishPayload, Ingredient, IngredientInDish, Portion};
use crate::reconcile::{self, Membership, Reconciliation, Relation};
use crate::schema::{combo_dish, dish, dish_ingredient};

/// `dish_ingredient` as seen from a dish. Unknown ingredients are created.
pub(crate) struct DishIngredients<'a> {
    conn: &'a MysqlConnection,
}

impl<'a> DishIngredients<'a> {
    pub(crate) fn new(conn: &'a MysqlConnection) -> Self {
        DishIngredients { conn }
    }
}

impl<'a> Relation for DishIngredients<'a> {
    type Owner = DishDetail;
    type Target = Ingredient;
    type Attrs = Portion;

    const KIND: &'static str = "ingredient";

    fn find(&mut self, name: &str) -> Result<Option<Ingredient>, ServiceError> {
        ingredient::find_by_name(name, self.conn)
    }

    fn create(&mut self, name: &str) -> Result<Option<Ingredient>, ServiceError> {
        ingredient::create(name, self.conn).map(Some)
    }

    fn link(&mut self, dish_id: i32, target: &Ingredient, portion: &Portion) -> Result<usize, ServiceError> {
        Ok(diesel::insert_or_ignore_into(dish_ingredient::table)
            .values((
                dish_ingredient::dish_id.eq(dish_id),
                dish_ingredient::ingredient_id.eq(target.id),
                dish_ingredient::quantity.eq(portion.quantity),
                dish_ingredient::unit.eq(&portion.unit),
            ))
            .execute(self.conn)?)
    }

    fn relink(&mut self, dish_id: i32, target: &Ingredient, portion: &Portion) -> Result<usize, ServiceError> {
        Ok(diesel::update(dish_ingredient::table.find((dish_id, target.id)))
            .set((
                dish_ingredient::quantity.eq(portion.quantity),
                dish_ingredient::unit.eq(&portion.unit),
            ))
            .execute(self.conn)?)
    }

    fn unlink(&mut self, dish_id: i32, target: &Ingredient) -> Result<usize, ServiceError> {
        Ok(diesel::delete(dish_ingredient::table.find((dish_id, target.id))).execute(self.conn)?)
    }

    fn member(target: Ingredient, portion: Portion) -> IngredientInDish {
        IngredientInDish {
            id: target.id,
            name: target.name,
            quantity: portion.quantity,
            unit: portion.unit,
        }
    }

    fn member_name(member: &IngredientInDish) -> &str {
        &member.name
    }

    fn member_attrs(member: &IngredientInDish) -> Portion {
        Portion {
            quantity: member.quantity,
            unit: member.unit.clone(),
        }
    }
}

pub(crate) fn find_all(keyword: &str, conn: &MysqlConnection) -> Result<Vec<Dish>, ServiceError> {
    Ok(dish::table
        .filter(dish::name.like(contains(keyword)))
        .order(dish::id.asc())
        .load(conn)?)
}

pub(crate) fn find(id: i32, conn: &MysqlConnection) -> Result<Option<DishDetail>, ServiceError> {
    let found: Option<Dish> = dish::table.find(id).first(conn).optional()?;
    match found {
        Some(found) => Ok(Some(DishDetail {
            ingredients: ingredients_of(found.id, conn)?,
            dish: found,
        })),
        None => Ok(None),
    }
}

pub(crate) fn find_by_name(name: &str, conn: &MysqlConnection) -> Result<Option<Dish>, ServiceError> {
    Ok(dish::table
        .filter(dish::name.eq(name.trim()))
        .order(dish::id.asc())
        .first(conn)
        .optional()?)
}

pub(crate) fn ingredients_of(
    dish_id: i32,
    conn: &MysqlConnection,
) -> Result<Vec<IngredientInDish>, ServiceError> {
    use crate::schema::ingredient as ingredient_table;

    let rows: Vec<(i32, String, f64, String)> = dish_ingredient::table
        .inner_join(ingredient_table::table)
        .filter(dish_ingredient::dish_id.eq(dish_id))
        .select((
            ingredient_table::id,
            ingredient_table::name,
            dish_ingredient::quantity,
            dish_ingredient::unit,
        ))
        .order(ingredient_table::name.asc())
        .load(conn)?;
    Ok(rows
        .into_iter()
        .map(|(id, name, quantity, unit)| IngredientInDish {
            id,
            name,
            quantity,
            unit,
        })
        .collect())
}

pub(crate) fn create(payload: &DishPayload, conn: &MysqlConnection) -> Result<DishDetail, ServiceError> {
    conn.transaction::<_, ServiceError, _>(|| {
        diesel::insert_into(dish::table)
            .values(&payload.fields())
            .execute(conn)?;
        let id = inserted_id(conn)?;
        let mut created = DishDetail {
            dish: dish::table.find(id).first(conn)?,
            ingredients: Vec::new(),
        };
        let report = sync_ingredients(&mut created, &Membership::new(), &payload.membership(), conn)?;
        log_report(id, &report);
        Ok(created)
    })
}

/// Replaces the scalar fields of a dish and patches its ingredient edges,
/// all or nothing.
pub(crate) fn update(id: i32, payload: &DishPayload, conn: &MysqlConnection) -> Result<DishDetail, ServiceError> {
    conn.transaction::<_, ServiceError, _>(|| {
        let mut current = find(id, conn)?.ok_or_else(|| ServiceError::not_found("dish", id))?;
        let before = DishIngredients::membership(&current);

        diesel::update(dish::table.find(id))
            .set((&payload.fields(), dish::updated_at.eq(now)))
            .execute(conn)?;
        current.dish = dish::table.find(id).first(conn)?;

        let report = sync_ingredients(&mut current, &before, &payload.membership(), conn)?;
        log_report(id, &report);
        Ok(current)
    })
}

pub(crate) fn delete(id: i32, conn: &MysqlConnection) -> Result<Dish, ServiceError> {
    conn.transaction::<_, ServiceError, _>(|| {
        let found: Dish = dish::table
            .find(id)
            .first(conn)
            .optional()?
            .ok_or_else(|| ServiceError::not_found("dish", id))?;
        diesel::delete(dish_ingredient::table.filter(dish_ingredient::dish_id.eq(id))).execute(conn)?;
        diesel::delete(combo_dish::table.filter(combo_dish::dish_id.eq(id))).execute(conn)?;
        diesel::delete(dish::table.find(id)).execute(conn)?;
        Ok(found)
    })
}

fn sync_ingredients(
    detail: &mut DishDetail,
    before: &Membership<Portion>,
    after: &Membership<Portion>,
    conn: &MysqlConnection,
) -> Result<Reconciliation, ServiceError> {
    reconcile::reconcile(&mut DishIngredients::new(conn), detail, before, after)
}

fn log_report(id: i32, report: &Reconciliation) {
    if !report.is_noop() {
        info!(
            "dish {}: ingredients added {:?} (new {:?}), updated {:?}, removed {:?}",
            id, report.added, report.created, report.updated, report.removed
        );
    }
}
