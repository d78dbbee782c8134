use diesel::dsl::now;
use diesel::prelude::*;
use log::info;

use super::{contains, ingredient as ingredients, inserted_id};
use crate::error::ServiceError;
use crate::models::{Ingredient, Supplier, SupplierDetail, SupplierPayload, SupplierSummary};
use crate::reconcile::{self, Membership, Reconciliation, Relation};
use crate::schema::{ingredient, supplier, supplier_ingredient};

/// `supplier_ingredient` as seen from a supplier. Unknown ingredients are
/// created.
pub(crate) struct SupplierIngredients<'a> {
    conn: &'a MysqlConnection,
}

impl<'a> SupplierIngredients<'a> {
    pub(crate) fn new(conn: &'a MysqlConnection) -> Self {
        SupplierIngredients { conn }
    }
}

impl<'a> Relation for SupplierIngredients<'a> {
    type Owner = SupplierDetail;
    type Target = Ingredient;
    type Attrs = ();

    const KIND: &'static str = "ingredient";

    fn find(&mut self, name: &str) -> Result<Option<Ingredient>, ServiceError> {
        ingredients::find_by_name(name, self.conn)
    }

    fn create(&mut self, name: &str) -> Result<Option<Ingredient>, ServiceError> {
        ingredients::create(name, self.conn).map(Some)
    }

    fn link(&mut self, supplier_id: i32, target: &Ingredient, _: &()) -> Result<usize, ServiceError> {
        Ok(diesel::insert_or_ignore_into(supplier_ingredient::table)
            .values((
                supplier_ingredient::supplier_id.eq(supplier_id),
                supplier_ingredient::ingredient_id.eq(target.id),
            ))
            .execute(self.conn)?)
    }

    fn unlink(&mut self, supplier_id: i32, target: &Ingredient) -> Result<usize, ServiceError> {
        Ok(
            diesel::delete(supplier_ingredient::table.find((supplier_id, target.id)))
                .execute(self.conn)?,
        )
    }

    fn member(target: Ingredient, _: ()) -> Ingredient {
        target
    }

    fn member_name(member: &Ingredient) -> &str {
        &member.name
    }

    fn member_attrs(_: &Ingredient) {}
}

pub(crate) fn find_all(keyword: &str, conn: &MysqlConnection) -> Result<Vec<SupplierSummary>, ServiceError> {
    Ok(supplier::table
        .filter(supplier::name.like(contains(keyword)))
        .select((
            supplier::id,
            supplier::name,
            supplier::description,
            supplier::image_url,
        ))
        .order(supplier::name.asc())
        .load(conn)?)
}

pub(crate) fn find(id: i32, conn: &MysqlConnection) -> Result<Option<SupplierDetail>, ServiceError> {
    let found: Option<Supplier> = supplier::table.find(id).first(conn).optional()?;
    match found {
        Some(found) => Ok(Some(SupplierDetail {
            ingredients: ingredients_of(found.id, conn)?,
            supplier: found,
        })),
        None => Ok(None),
    }
}

pub(crate) fn ingredients_of(supplier_id: i32, conn: &MysqlConnection) -> Result<Vec<Ingredient>, ServiceError> {
    Ok(supplier_ingredient::table
        .inner_join(ingredient::table)
        .filter(supplier_ingredient::supplier_id.eq(supplier_id))
        .select(ingredient::all_columns)
        .order(ingredient::name.asc())
        .load(conn)?)
}

pub(crate) fn create(payload: &SupplierPayload, conn: &MysqlConnection) -> Result<SupplierDetail, ServiceError> {
    conn.transaction::<_, ServiceError, _>(|| {
        diesel::insert_into(supplier::table)
            .values(&payload.fields())
            .execute(conn)?;
        let id = inserted_id(conn)?;
        let mut created = SupplierDetail {
            supplier: supplier::table.find(id).first(conn)?,
            ingredients: Vec::new(),
        };
        let report = sync_ingredients(&mut created, &Membership::new(), &payload.membership(), conn)?;
        log_report(id, &report);
        Ok(created)
    })
}

pub(crate) fn update(
    id: i32,
    payload: &SupplierPayload,
    conn: &MysqlConnection,
) -> Result<SupplierDetail, ServiceError> {
    conn.transaction::<_, ServiceError, _>(|| {
        let mut current = find(id, conn)?.ok_or_else(|| ServiceError::not_found("supplier", id))?;
        let before = SupplierIngredients::membership(&current);

        diesel::update(supplier::table.find(id))
            .set((&payload.fields(), supplier::updated_at.eq(now)))
            .execute(conn)?;
        current.supplier = supplier::table.find(id).first(conn)?;

        let report = sync_ingredients(&mut current, &before, &payload.membership(), conn)?;
        log_report(id, &report);
        Ok(current)
    })
}

pub(crate) fn delete(id: i32, conn: &MysqlConnection) -> Result<Supplier, ServiceError> {
    conn.transaction::<_, ServiceError, _>(|| {
        let found: Supplier = supplier::table
            .find(id)
            .first(conn)
            .optional()?
            .ok_or_else(|| ServiceError::not_found("supplier", id))?;
        diesel::delete(supplier_ingredient::table.filter(supplier_ingredient::supplier_id.eq(id)))
            .execute(conn)?;
        diesel::delete(supplier::table.find(id)).execute(conn)?;
        Ok(found)
    })
}

fn sync_ingredients(
    detail: &mut SupplierDetail,
    before: &Membership<()>,
    after: &Membership<()>,
    conn: &MysqlConnection,
) -> Result<Reconciliation, ServiceError> {
    reconcile::reconcile(&mut SupplierIngredients::new(conn), detail, before, after)
}

fn log_report(id: i32, report: &Reconciliation) {
    if !report.is_noop() {
        info!(
            "supplier {}: ingredients added {:?} (new {:?}), removed {:?}",
            id, report.added, report.created, report.removed
        );
    }
}
