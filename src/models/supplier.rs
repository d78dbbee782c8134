use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::{require, Ingredient};
use crate::error::ServiceError;
use crate::reconcile::{self, Membership, Owner};
use crate::schema::supplier;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Queryable)]
pub(crate) struct Supplier {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub image_url: String,
    pub contact_person: String,
    pub email: String,
    pub phone: String,
    pub state: String,
    pub city: String,
    pub address: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Listing shape of a supplier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Queryable)]
pub(crate) struct SupplierSummary {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub image_url: String,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct SupplierDetail {
    #[serde(flatten)]
    pub supplier: Supplier,
    pub ingredients: Vec<Ingredient>,
}

impl Owner for SupplierDetail {
    type Member = Ingredient;

    fn owner_id(&self) -> i32 {
        self.supplier.id
    }

    fn members(&self) -> &[Ingredient] {
        &self.ingredients
    }

    fn members_mut(&mut self) -> &mut Vec<Ingredient> {
        &mut self.ingredients
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct SupplierPayload {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub contact_person: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub address: String,
    /// Ingredient names; unknown names are created.
    #[serde(default)]
    pub ingredients: Vec<String>,
}

#[derive(Debug, Insertable, AsChangeset)]
#[table_name = "supplier"]
pub(crate) struct SupplierFields<'a> {
    pub name: &'a str,
    pub description: &'a str,
    pub image_url: &'a str,
    pub contact_person: &'a str,
    pub email: &'a str,
    pub phone: &'a str,
    pub state: &'a str,
    pub city: &'a str,
    pub address: &'a str,
}

impl SupplierPayload {
    pub(crate) fn validate(&self) -> Result<(), ServiceError> {
        require("name", &self.name)?;
        if !self.email.is_empty() && !self.email.contains('@') {
            return Err(ServiceError::invalid("email is malformed"));
        }
        Ok(())
    }

    pub(crate) fn fields(&self) -> SupplierFields<'_> {
        SupplierFields {
            name: self.name.trim(),
            description: &self.description,
            image_url: &self.image_url,
            contact_person: &self.contact_person,
            email: self.email.trim(),
            phone: &self.phone,
            state: &self.state,
            city: &self.city,
            address: &self.address,
        }
    }

    pub(crate) fn membership(&self) -> Membership<()> {
        reconcile::names(&self.ingredients)
    }
}
