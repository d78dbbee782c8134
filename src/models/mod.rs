mod combo;
mod dish;
mod employee;
mod image;
mod ingredient;
mod menu;
mod store;
mod supplier;

pub(crate) use combo::{Combo, ComboDetail, ComboPayload};
pub(crate) use dish::{Dish, DishDetail, DishPayload, IngredientInDish, Portion};
pub(crate) use employee::{Employee, EmployeeDetail, EmployeeFields, EmployeePayload, PositionCount};
pub(crate) use image::{extension_for, Image, NewImage};
pub(crate) use ingredient::{Ingredient, IngredientDetail, IngredientPage, IngredientPayload, NewIngredient};
pub(crate) use menu::Menu;
pub(crate) use store::{Store, StoreFields, StorePayload, StoreRow};
pub(crate) use supplier::{Supplier, SupplierDetail, SupplierPayload, SupplierSummary};

use crate::error::ServiceError;

/// Rejects blank values for required text fields.
pub(crate) fn require(field: &str, value: &str) -> Result<(), ServiceError> {
    if value.trim().is_empty() {
        return Err(ServiceError::invalid(format!("{} must not be empty", field)));
    }
    Ok(())
}

pub(crate) fn non_negative(field: &str, value: f64) -> Result<(), ServiceError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ServiceError::invalid(format!(
            "{} must be a non-negative number",
            field
        )));
    }
    Ok(())
}
