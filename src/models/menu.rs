use serde::{Deserialize, Serialize};

use super::{Combo, Dish};

/// Everything on sale, without nested relations.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct Menu {
    pub dishes: Vec<Dish>,
    pub combos: Vec<Combo>,
}

impl Menu {
    pub(crate) fn to_bytes(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(self)
    }

    pub(crate) fn from_u8(bytes: Vec<u8>) -> Result<Self, bincode::Error> {
        bincode::deserialize(&bytes)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    #[test]
    fn cached_bytes_decode_to_the_same_menu() {
        let at = NaiveDate::from_ymd_opt(2024, 5, 1)
            .and_then(|d| d.and_hms_opt(12, 0, 0))
            .unwrap();
        let fries = Dish {
            id: 3,
            name: "Fries".into(),
            description: String::new(),
            calories: 300,
            price: 3.49,
            image_url: "/images/fries.webp".into(),
            created_at: at,
            updated_at: at,
        };
        let meal = Combo {
            id: 1,
            name: "Burger Meal".into(),
            description: "Burger, fries and a drink".into(),
            price: 12.99,
            image_url: String::new(),
            created_at: at,
            updated_at: at,
        };
        let menu = Menu {
            dishes: vec![fries],
            combos: vec![meal],
        };

        let bytes = menu.to_bytes().unwrap();
        assert_eq!(Menu::from_u8(bytes).unwrap(), menu);
    }

    #[test]
    fn garbage_is_an_error_not_a_panic() {
        assert!(Menu::from_u8(vec![0xff, 0x01]).is_err());
    }
}
