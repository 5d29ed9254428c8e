use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::booking::Slot;

/// A bookable restaurant table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    pub id: String,
    pub number: u32,
    pub places: u32,
    pub is_vip: bool,
    #[serde(default)]
    pub min_order: f64,
}

/// An admitted booking. Never mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    pub id: String,
    pub table_id: String,
    pub table_number: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    pub user_id: String,
    pub date: NaiveDate,
    #[serde(with = "slot_time")]
    pub slot_time_start: NaiveTime,
    #[serde(with = "slot_time")]
    pub slot_time_end: NaiveTime,
    pub created_at: DateTime<Utc>,
}

impl Reservation {
    pub fn slot(&self) -> Slot {
        Slot::new(self.slot_time_start, self.slot_time_end)
    }
}

/// `HH:MM` wall-clock encoding used for slot boundaries on the wire and in storage.
pub mod slot_time {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::contract::{parse_slot_time, SLOT_TIME_FORMAT};

    pub fn serialize<S: Serializer>(value: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&value.format(SLOT_TIME_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_slot_time("slot time", &raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::{json, Value};

    use super::*;

    fn sample_reservation() -> Reservation {
        Reservation {
            id: "res-1".to_string(),
            table_id: "table-5".to_string(),
            table_number: 5,
            client_name: Some("Ada".to_string()),
            phone_number: None,
            user_id: "user-1".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 6, 1).expect("valid date"),
            slot_time_start: NaiveTime::from_hms_opt(18, 0, 0).expect("valid time"),
            slot_time_end: NaiveTime::from_hms_opt(19, 0, 0).expect("valid time"),
            created_at: Utc
                .with_ymd_and_hms(2024, 5, 20, 12, 0, 0)
                .single()
                .expect("valid timestamp"),
        }
    }

    #[test]
    fn reservation_uses_camel_case_and_short_slot_times() {
        let value =
            serde_json::to_value(sample_reservation()).expect("reservation should serialize");

        assert_eq!(value["tableId"], Value::from("table-5"));
        assert_eq!(value["date"], Value::from("2024-06-01"));
        assert_eq!(value["slotTimeStart"], Value::from("18:00"));
        assert_eq!(value["slotTimeEnd"], Value::from("19:00"));
        assert!(value.get("phoneNumber").is_none());
    }

    #[test]
    fn reservation_rejects_malformed_stored_slot_time() {
        let mut value =
            serde_json::to_value(sample_reservation()).expect("reservation should serialize");
        value["slotTimeEnd"] = Value::from("7pm");

        let error =
            serde_json::from_value::<Reservation>(value).expect_err("slot time should fail");
        assert!(error.to_string().contains("HH:MM"));
    }

    #[test]
    fn table_min_order_defaults_to_zero() {
        let table: Table = serde_json::from_value(json!({
            "id": "t-1",
            "number": 3,
            "places": 4,
            "isVip": false
        }))
        .expect("table should parse");

        assert_eq!(table.min_order, 0.0);
    }
}
