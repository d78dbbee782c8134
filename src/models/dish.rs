use std::collections::BTreeSet;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::{non_negative, require};
use crate::error::ServiceError;
use crate::reconcile::{Membership, Owner};
use crate::schema::dish;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Queryable)]
pub(crate) struct Dish {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub calories: i32,
    pub price: f64,
    pub image_url: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Amount of an ingredient that goes into one dish. Carried on the
/// `dish_ingredient` edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct Portion {
    pub quantity: f64,
    pub unit: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct IngredientInDish {
    pub id: i32,
    pub name: String,
    pub quantity: f64,
    pub unit: String,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct DishDetail {
    #[serde(flatten)]
    pub dish: Dish,
    pub ingredients: Vec<IngredientInDish>,
}

impl Owner for DishDetail {
    type Member = IngredientInDish;

    fn owner_id(&self) -> i32 {
        self.dish.id
    }

    fn members(&self) -> &[IngredientInDish] {
        &self.ingredients
    }

    fn members_mut(&mut self) -> &mut Vec<IngredientInDish> {
        &mut self.ingredients
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct IngredientLine {
    pub name: String,
    pub quantity: f64,
    pub unit: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct DishPayload {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub calories: i32,
    pub price: f64,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub ingredients: Vec<IngredientLine>,
}

#[derive(Debug, Insertable, AsChangeset)]
#[table_name = "dish"]
pub(crate) struct DishFields<'a> {
    pub name: &'a str,
    pub description: &'a str,
    pub calories: i32,
    pub price: f64,
    pub image_url: &'a str,
}

impl DishPayload {
    pub(crate) fn validate(&self) -> Result<(), ServiceError> {
        require("name", &self.name)?;
        if self.calories < 0 {
            return Err(ServiceError::invalid("calories must not be negative"));
        }
        non_negative("price", self.price)?;

        let mut seen = BTreeSet::new();
        for line in &self.ingredients {
            require("ingredient name", &line.name)?;
            non_negative("ingredient quantity", line.quantity)?;
            if !seen.insert(line.name.trim()) {
                return Err(ServiceError::invalid(format!(
                    "ingredient `{}` listed twice",
                    line.name.trim()
                )));
            }
        }
        Ok(())
    }

    pub(crate) fn fields(&self) -> DishFields<'_> {
        DishFields {
            name: self.name.trim(),
            description: &self.description,
            calories: self.calories,
            price: self.price,
            image_url: &self.image_url,
        }
    }

    pub(crate) fn membership(&self) -> Membership<Portion> {
        self.ingredients
            .iter()
            .map(|line| {
                (
                    line.name.trim().to_string(),
                    Portion {
                        quantity: line.quantity,
                        unit: line.unit.trim().to_string(),
                    },
                )
            })
            .collect()
    }
}
