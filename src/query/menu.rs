use diesel::prelude::*;

use super::{combo, dish};
use crate::error::ServiceError;
use crate::models::Menu;

pub(crate) fn load(conn: &MysqlConnection) -> Result<Menu, ServiceError> {
    Ok(Menu {
        dishes: dish::find_all("", conn)?,
        combos: combo::find_all("", conn)?,
    })
}
