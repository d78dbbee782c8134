use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::{require, Dish, SupplierSummary};
use crate::error::ServiceError;
use crate::schema::ingredient;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Queryable)]
pub(crate) struct Ingredient {
    pub id: i32,
    pub name: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[table_name = "ingredient"]
pub(crate) struct NewIngredient<'a> {
    pub name: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct IngredientPayload {
    pub name: String,
}

impl IngredientPayload {
    pub(crate) fn validate(&self) -> Result<(), ServiceError> {
        require("name", &self.name)
    }
}

/// An ingredient together with everything that still points at it.
#[derive(Debug, Serialize)]
pub(crate) struct IngredientDetail {
    #[serde(flatten)]
    pub ingredient: Ingredient,
    pub suppliers: Vec<SupplierSummary>,
    pub dishes: Vec<Dish>,
    pub deletable: bool,
}

impl IngredientDetail {
    pub(crate) fn new(ingredient: Ingredient, suppliers: Vec<SupplierSummary>, dishes: Vec<Dish>) -> Self {
        let deletable = suppliers.is_empty() && dishes.is_empty();
        IngredientDetail {
            ingredient,
            suppliers,
            dishes,
            deletable,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct IngredientPage {
    pub total: i64,
    pub items: Vec<Ingredient>,
}
