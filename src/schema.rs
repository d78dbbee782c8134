table! {
    combo (id) {
        id -> Integer,
        name -> Varchar,
        description -> Text,
        price -> Double,
        image_url -> Varchar,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

table! {
    combo_dish (combo_id, dish_id) {
        combo_id -> Integer,
        dish_id -> Integer,
    }
}

table! {
    dish (id) {
        id -> Integer,
        name -> Varchar,
        description -> Text,
        calories -> Integer,
        price -> Double,
        image_url -> Varchar,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

table! {
    dish_ingredient (dish_id, ingredient_id) {
        dish_id -> Integer,
        ingredient_id -> Integer,
        quantity -> Double,
        unit -> Varchar,
    }
}

table! {
    employee (id) {
        id -> Integer,
        name -> Varchar,
        position -> Varchar,
        email -> Varchar,
        phone -> Varchar,
        hire_date -> Date,
        #[sql_name = "type"]
        type_ -> Varchar,
        store_id -> Nullable<Integer>,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

table! {
    image (id) {
        id -> Integer,
        name -> Varchar,
        data -> Blob,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

table! {
    ingredient (id) {
        id -> Integer,
        name -> Varchar,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

table! {
    store (id) {
        id -> Integer,
        name -> Varchar,
        phone -> Varchar,
        latitude -> Double,
        longitude -> Double,
        state -> Varchar,
        city -> Varchar,
        address -> Varchar,
        zipcode -> Varchar,
        weekdays -> Varchar,
        open_time -> Time,
        close_time -> Time,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

table! {
    supplier (id) {
        id -> Integer,
        name -> Varchar,
        description -> Text,
        image_url -> Varchar,
        contact_person -> Varchar,
        email -> Varchar,
        phone -> Varchar,
        state -> Varchar,
        city -> Varchar,
        address -> Varchar,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

table! {
    supplier_ingredient (supplier_id, ingredient_id) {
        supplier_id -> Integer,
        ingredient_id -> Integer,
    }
}

joinable!(combo_dish -> combo (combo_id));
joinable!(combo_dish -> dish (dish_id));
joinable!(dish_ingredient -> dish (dish_id));
joinable!(dish_ingredient -> ingredient (ingredient_id));
joinable!(employee -> store (store_id));
joinable!(supplier_ingredient -> ingredient (ingredient_id));
joinable!(supplier_ingredient -> supplier (supplier_id));

allow_tables_to_appear_in_same_query!(
    combo,
    combo_dish,
    dish,
    dish_ingredient,
    employee,
    image,
    ingredient,
    store,
    supplier,
    supplier_ingredient,
);
