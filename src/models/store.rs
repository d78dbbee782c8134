use chrono::{NaiveDateTime, NaiveTime};
use log::warn;
use serde::{Deserialize, Serialize};

use super::require;
use crate::error::ServiceError;
use crate::schema::store;

/// A store as it sits in the `store` table. Weekdays are kept as a
/// comma-separated list of ISO day numbers (Monday = 1).
#[derive(Debug, Clone, Queryable)]
pub(crate) struct StoreRow {
    pub id: i32,
    pub name: String,
    pub phone: String,
    pub latitude: f64,
    pub longitude: f64,
    pub state: String,
    pub city: String,
    pub address: String,
    pub zipcode: String,
    pub weekdays: String,
    pub open_time: NaiveTime,
    pub close_time: NaiveTime,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct Store {
    pub id: i32,
    pub name: String,
    pub phone: String,
    pub latitude: f64,
    pub longitude: f64,
    pub state: String,
    pub city: String,
    pub address: String,
    pub zipcode: String,
    pub weekdays: Vec<u8>,
    pub open_time: NaiveTime,
    pub close_time: NaiveTime,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub employees_count: i64,
}

impl StoreRow {
    pub(crate) fn into_store(self, employees_count: i64) -> Store {
        let weekdays = parse_weekdays(&self.weekdays).unwrap_or_else(|e| {
            warn!("store {} has unreadable weekdays: {}", self.id, e);
            Vec::new()
        });
        Store {
            id: self.id,
            name: self.name,
            phone: self.phone,
            latitude: self.latitude,
            longitude: self.longitude,
            state: self.state,
            city: self.city,
            address: self.address,
            zipcode: self.zipcode,
            weekdays,
            open_time: self.open_time,
            close_time: self.close_time,
            created_at: self.created_at,
            updated_at: self.updated_at,
            employees_count,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct StorePayload {
    pub name: String,
    #[serde(default)]
    pub phone: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub zipcode: String,
    #[serde(default)]
    pub weekdays: Vec<u8>,
    pub open_time: String,
    pub close_time: String,
}

#[derive(Debug, Insertable, AsChangeset)]
#[table_name = "store"]
pub(crate) struct StoreFields<'a> {
    pub name: &'a str,
    pub phone: &'a str,
    pub latitude: f64,
    pub longitude: f64,
    pub state: &'a str,
    pub city: &'a str,
    pub address: &'a str,
    pub zipcode: &'a str,
    pub weekdays: String,
    pub open_time: NaiveTime,
    pub close_time: NaiveTime,
}

impl StorePayload {
    /// Validates the payload and turns it into table fields.
    pub(crate) fn fields(&self) -> Result<StoreFields<'_>, ServiceError> {
        require("name", &self.name)?;
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(ServiceError::invalid("latitude must be within [-90, 90]"));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(ServiceError::invalid("longitude must be within [-180, 180]"));
        }
        if let Some(day) = self.weekdays.iter().find(|d| !(1..=7).contains(*d)) {
            return Err(ServiceError::invalid(format!(
                "weekday {} is outside 1..=7",
                day
            )));
        }

        Ok(StoreFields {
            name: self.name.trim(),
            phone: &self.phone,
            latitude: self.latitude,
            longitude: self.longitude,
            state: &self.state,
            city: &self.city,
            address: &self.address,
            zipcode: &self.zipcode,
            weekdays: format_weekdays(&self.weekdays),
            open_time: parse_clock(&self.open_time)?,
            close_time: parse_clock(&self.close_time)?,
        })
    }
}

/// Accepts `HH:MM` as well as `HH:MM:SS`.
pub(crate) fn parse_clock(raw: &str) -> Result<NaiveTime, ServiceError> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .map_err(|_| ServiceError::invalid(format!("`{}` is not a time of day", raw)))
}

pub(crate) fn parse_weekdays(raw: &str) -> Result<Vec<u8>, String> {
    let mut days = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<u8>()
                .ok()
                .filter(|d| (1..=7).contains(d))
                .ok_or_else(|| format!("`{}` is not a weekday", s))
        })
        .collect::<Result<Vec<_>, _>>()?;
    days.sort_unstable();
    days.dedup();
    Ok(days)
}

pub(crate) fn format_weekdays(days: &[u8]) -> String {
    let mut days = days.to_vec();
    days.sort_unstable();
    days.dedup();
    days.iter()
        .map(|d| d.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> StorePayload {
        StorePayload {
            name: "Downtown".into(),
            phone: "555-0100".into(),
            latitude: 25.04,
            longitude: 121.56,
            state: "TP".into(),
            city: "Taipei".into(),
            address: "1 Main St".into(),
            zipcode: "100".into(),
            weekdays: vec![5, 1, 3, 1],
            open_time: "09:00".into(),
            close_time: "21:30:00".into(),
        }
    }

    #[test]
    fn clock_accepts_short_and_long_forms() {
        assert_eq!(parse_clock("09:00").unwrap(), NaiveTime::from_hms_opt(9, 0, 0).unwrap());
        assert_eq!(
            parse_clock(" 21:30:15 ").unwrap(),
            NaiveTime::from_hms_opt(21, 30, 15).unwrap()
        );
        assert!(parse_clock("9am").is_err());
        assert!(parse_clock("25:00").is_err());
    }

    #[test]
    fn weekdays_are_sorted_and_deduplicated() {
        assert_eq!(format_weekdays(&[5, 1, 3, 1]), "1,3,5");
        assert_eq!(parse_weekdays("5, 1,3,,1").unwrap(), vec![1, 3, 5]);
        assert_eq!(parse_weekdays("").unwrap(), Vec::<u8>::new());
        assert!(parse_weekdays("1,8").is_err());
        assert!(parse_weekdays("mon").is_err());
    }

    #[test]
    fn payload_becomes_table_fields() {
        let p = payload();
        let fields = p.fields().unwrap();

        assert_eq!(fields.weekdays, "1,3,5");
        assert_eq!(fields.open_time, NaiveTime::from_hms_opt(9, 0, 0).unwrap());
        assert_eq!(fields.close_time, NaiveTime::from_hms_opt(21, 30, 0).unwrap());
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let mut p = payload();
        p.latitude = 91.0;
        assert!(p.fields().is_err());

        let mut p = payload();
        p.longitude = -180.5;
        assert!(p.fields().is_err());

        let mut p = payload();
        p.weekdays = vec![0];
        assert!(p.fields().is_err());

        let mut p = payload();
        p.name = "  ".into();
        assert!(p.fields().is_err());
    }

    #[test]
    fn corrupt_weekdays_do_not_break_reads() {
        let at = chrono::NaiveDate::from_ymd_opt(2024, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap();
        let row = StoreRow {
            id: 1,
            name: "Airport".into(),
            phone: String::new(),
            latitude: 0.0,
            longitude: 0.0,
            state: String::new(),
            city: String::new(),
            address: String::new(),
            zipcode: String::new(),
            weekdays: "1,x".into(),
            open_time: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            close_time: NaiveTime::from_hms_opt(20, 0, 0).unwrap(),
            created_at: at,
            updated_at: at,
        };

        let store = row.into_store(3);
        assert!(store.weekdays.is_empty());
        assert_eq!(store.employees_count, 3);
    }
}
