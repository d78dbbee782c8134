use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::{non_negative, require, Dish};
use crate::error::ServiceError;
use crate::reconcile::{self, Membership, Owner};
use crate::schema::combo;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Queryable)]
pub(crate) struct Combo {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub image_url: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct ComboDetail {
    #[serde(flatten)]
    pub combo: Combo,
    pub dishes: Vec<Dish>,
}

impl Owner for ComboDetail {
    type Member = Dish;

    fn owner_id(&self) -> i32 {
        self.combo.id
    }

    fn members(&self) -> &[Dish] {
        &self.dishes
    }

    fn members_mut(&mut self) -> &mut Vec<Dish> {
        &mut self.dishes
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ComboPayload {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub image_url: String,
    /// Dish names.
    #[serde(default)]
    pub dishes: Vec<String>,
}

#[derive(Debug, Insertable, AsChangeset)]
#[table_name = "combo"]
pub(crate) struct ComboFields<'a> {
    pub name: &'a str,
    pub description: &'a str,
    pub price: f64,
    pub image_url: &'a str,
}

impl ComboPayload {
    pub(crate) fn validate(&self) -> Result<(), ServiceError> {
        require("name", &self.name)?;
        non_negative("price", self.price)
    }

    pub(crate) fn fields(&self) -> ComboFields<'_> {
        ComboFields {
            name: self.name.trim(),
            description: &self.description,
            price: self.price,
            image_url: &self.image_url,
        }
    }

    pub(crate) fn membership(&self) -> Membership<()> {
        reconcile::names(&self.dishes)
    }
}
