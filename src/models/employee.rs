use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::{require, Store};
use crate::error::ServiceError;
use crate::schema::employee;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Queryable)]
pub(crate) struct Employee {
    pub id: i32,
    pub name: String,
    pub position: String,
    pub email: String,
    pub phone: String,
    pub hire_date: NaiveDate,
    #[serde(rename = "type")]
    pub type_: String,
    pub store_id: Option<i32>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct EmployeeDetail {
    #[serde(flatten)]
    pub employee: Employee,
    pub store: Option<Store>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct PositionCount {
    pub position: String,
    pub count: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct EmployeePayload {
    pub name: String,
    pub position: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    /// `YYYY-MM-DD`
    pub hire_date: NaiveDate,
    #[serde(rename = "type", default)]
    pub type_: String,
    #[serde(default)]
    pub store_id: Option<i32>,
}

#[derive(Debug, Insertable, AsChangeset)]
#[table_name = "employee"]
#[changeset_options(treat_none_as_null = "true")]
pub(crate) struct EmployeeFields<'a> {
    pub name: &'a str,
    pub position: &'a str,
    pub email: &'a str,
    pub phone: &'a str,
    pub hire_date: NaiveDate,
    pub type_: &'a str,
    pub store_id: Option<i32>,
}

impl EmployeePayload {
    pub(crate) fn validate(&self) -> Result<(), ServiceError> {
        require("name", &self.name)?;
        require("position", &self.position)?;
        require("email", &self.email)?;
        if !self.email.contains('@') {
            return Err(ServiceError::invalid("email is malformed"));
        }
        Ok(())
    }

    pub(crate) fn fields(&self) -> EmployeeFields<'_> {
        EmployeeFields {
            name: self.name.trim(),
            position: self.position.trim(),
            email: self.email.trim(),
            phone: &self.phone,
            hire_date: self.hire_date,
            type_: self.type_.trim(),
            store_id: self.store_id,
        }
    }
}
