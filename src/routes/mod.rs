use actix_web::web;
use serde::Deserialize;

mod combo;
mod dish;
mod employee;
mod health;
mod image;
mod ingredient;
mod menu;
mod store;
mod supplier;

/// `?query=` keyword filter shared by the catalog listings.
#[derive(Debug, Deserialize)]
pub(crate) struct Search {
    #[serde(default)]
    pub query: String,
}

pub(crate) fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(health::health)
        .service(menu::get_menu)
        .service(ingredient::list_ingredients)
        .service(ingredient::create_ingredient)
        .service(ingredient::get_ingredient)
        .service(ingredient::update_ingredient)
        .service(ingredient::delete_ingredient)
        .service(dish::list_dishes)
        .service(dish::create_dish)
        .service(dish::get_dish)
        .service(dish::update_dish)
        .service(dish::delete_dish)
        .service(combo::list_combos)
        .service(combo::create_combo)
        .service(combo::get_combo)
        .service(combo::update_combo)
        .service(combo::delete_combo)
        .service(supplier::list_suppliers)
        .service(supplier::create_supplier)
        .service(supplier::get_supplier)
        .service(supplier::update_supplier)
        .service(supplier::delete_supplier)
        .service(store::list_stores)
        .service(store::create_store)
        .service(store::get_store)
        .service(store::update_store)
        .service(store::delete_store)
        .service(store::store_employees)
        // before /employees/{id} so "positions" is not taken for an id
        .service(employee::positions)
        .service(employee::list_employees)
        .service(employee::create_employee)
        .service(employee::get_employee)
        .service(employee::update_employee)
        .service(employee::delete_employee)
        .service(image::upload_image)
        .service(image::get_image)
        .service(image::delete_image);
}
