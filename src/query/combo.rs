use diesel::dsl::now;
use diesel::prelude::*;
use log::info;

use super::{contains, dish as dishes, inserted_id};
use crate::error::ServiceError;
use crate::models::{Combo, ComboDetail, ComboPayload, Dish};
use crate::reconcile::{self, Membership, Reconciliation, Relation};
use crate::schema::{combo, combo_dish, dish};

/// `combo_dish` as seen from a combo. A dish cannot be made up from its
/// name alone, so unknown dish names are an error.
pub(crate) struct ComboDishes<'a> {
    conn: &'a MysqlConnection,
}

impl<'a> ComboDishes<'a> {
    pub(crate) fn new(conn: &'a MysqlConnection) -> Self {
        ComboDishes { conn }
    }
}

impl<'a> Relation for ComboDishes<'a> {
    type Owner = ComboDetail;
    type Target = Dish;
    type Attrs = ();

    const KIND: &'static str = "dish";

    fn find(&mut self, name: &str) -> Result<Option<Dish>, ServiceError> {
        dishes::find_by_name(name, self.conn)
    }

    fn link(&mut self, combo_id: i32, target: &Dish, _: &()) -> Result<usize, ServiceError> {
        Ok(diesel::insert_or_ignore_into(combo_dish::table)
            .values((
                combo_dish::combo_id.eq(combo_id),
                combo_dish::dish_id.eq(target.id),
            ))
            .execute(self.conn)?)
    }

    fn unlink(&mut self, combo_id: i32, target: &Dish) -> Result<usize, ServiceError> {
        Ok(diesel::delete(combo_dish::table.find((combo_id, target.id))).execute(self.conn)?)
    }

    fn member(target: Dish, _: ()) -> Dish {
        target
    }

    fn member_name(member: &Dish) -> &str {
        &member.name
    }

    fn member_attrs(_: &Dish) {}
}

pub(crate) fn find_all(keyword: &str, conn: &MysqlConnection) -> Result<Vec<Combo>, ServiceError> {
    Ok(combo::table
        .filter(combo::name.like(contains(keyword)))
        .order(combo::id.asc())
        .load(conn)?)
}

pub(crate) fn find(id: i32, conn: &MysqlConnection) -> Result<Option<ComboDetail>, ServiceError> {
    let found: Option<Combo> = combo::table.find(id).first(conn).optional()?;
    match found {
        Some(found) => Ok(Some(ComboDetail {
            dishes: dishes_in(found.id, conn)?,
            combo: found,
        })),
        None => Ok(None),
    }
}

pub(crate) fn dishes_in(combo_id: i32, conn: &MysqlConnection) -> Result<Vec<Dish>, ServiceError> {
    Ok(combo_dish::table
        .inner_join(dish::table)
        .filter(combo_dish::combo_id.eq(combo_id))
        .select(dish::all_columns)
        .order(dish::name.asc())
        .load(conn)?)
}

pub(crate) fn create(payload: &ComboPayload, conn: &MysqlConnection) -> Result<ComboDetail, ServiceError> {
    conn.transaction::<_, ServiceError, _>(|| {
        diesel::insert_into(combo::table)
            .values(&payload.fields())
            .execute(conn)?;
        let id = inserted_id(conn)?;
        let mut created = ComboDetail {
            combo: combo::table.find(id).first(conn)?,
            dishes: Vec::new(),
        };
        let report = sync_dishes(&mut created, &Membership::new(), &payload.membership(), conn)?;
        log_report(id, &report);
        Ok(created)
    })
}

pub(crate) fn update(id: i32, payload: &ComboPayload, conn: &MysqlConnection) -> Result<ComboDetail, ServiceError> {
    conn.transaction::<_, ServiceError, _>(|| {
        let mut current = find(id, conn)?.ok_or_else(|| ServiceError::not_found("combo", id))?;
        let before = ComboDishes::membership(&current);

        diesel::update(combo::table.find(id))
            .set((&payload.fields(), combo::updated_at.eq(now)))
            .execute(conn)?;
        current.combo = combo::table.find(id).first(conn)?;

        let report = sync_dishes(&mut current, &before, &payload.membership(), conn)?;
        log_report(id, &report);
        Ok(current)
    })
}

pub(crate) fn delete(id: i32, conn: &MysqlConnection) -> Result<Combo, ServiceError> {
    conn.transaction::<_, ServiceError, _>(|| {
        let found: Combo = combo::table
            .find(id)
            .first(conn)
            .optional()?
            .ok_or_else(|| ServiceError::not_found("combo", id))?;
        diesel::delete(combo_dish::table.filter(combo_dish::combo_id.eq(id))).execute(conn)?;
        diesel::delete(combo::table.find(id)).execute(conn)?;
        Ok(found)
    })
}

fn sync_dishes(
    detail: &mut ComboDetail,
    before: &Membership<()>,
    after: &Membership<()>,
    conn: &MysqlConnection,
) -> Result<Reconciliation, ServiceError> {
    reconcile::reconcile(&mut ComboDishes::new(conn), detail, before, after)
}

fn log_report(id: i32, report: &Reconciliation) {
    if !report.is_noop() {
        info!(
            "combo {}: dishes added {:?}, removed {:?}",
            id, report.added, report.removed
        );
    }
}
