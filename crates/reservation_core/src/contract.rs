use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveTime};
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::booking::Slot;
use crate::model::{Reservation, Table};

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const SLOT_TIME_FORMAT: &str = "%H:%M";
pub const MIN_PASSWORD_LENGTH: usize = 12;
pub const RESERVATION_CREATED_MESSAGE: &str = "Reservation created successfully";
pub const USER_CREATED_MESSAGE: &str = "User created successfully";

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern should compile")
});

static PASSWORD_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9$%^*_-]+$").expect("password pattern should compile")
});

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

// ── requests ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ReservationRequest {
    pub table_number: Option<u32>,
    pub date: Option<String>,
    pub slot_time_start: Option<String>,
    pub slot_time_end: Option<String>,
    pub client_name: Option<String>,
    pub phone_number: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedReservation {
    pub table_number: u32,
    pub date: NaiveDate,
    pub slot: Slot,
    pub client_name: Option<String>,
    pub phone_number: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TableRequest {
    pub id: Option<String>,
    pub number: Option<u32>,
    pub places: Option<u32>,
    pub is_vip: Option<bool>,
    pub min_order: Option<f64>,
}

/// A validated table whose identifier may still need to be generated.
#[derive(Debug, Clone, PartialEq)]
pub struct TableDraft {
    pub id: Option<String>,
    pub number: u32,
    pub places: u32,
    pub is_vip: bool,
    pub min_order: f64,
}

impl TableDraft {
    pub fn into_table(self, generate_id: impl FnOnce() -> String) -> Table {
        Table {
            id: self.id.unwrap_or_else(generate_id),
            number: self.number,
            places: self.places,
            is_vip: self.is_vip,
            min_order: self.min_order,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SignUpRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SignInRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

// ── responses ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReservationCreated {
    pub reservation_id: String,
    pub message: String,
}

impl ReservationCreated {
    pub fn new(reservation_id: impl Into<String>) -> Self {
        Self {
            reservation_id: reservation_id.into(),
            message: RESERVATION_CREATED_MESSAGE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TableCreated {
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TableList {
    pub tables: Vec<Table>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReservationList {
    pub reservations: Vec<Reservation>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SignInResponse {
    pub access_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// ── normalization ──────────────────────────────────────────────────

pub fn normalize_reservation(
    payload: ReservationRequest,
) -> Result<NormalizedReservation, ValidationError> {
    let mut missing = MissingFields::default();
    let table_number = missing.check("tableNumber", payload.table_number);
    let date = missing.check("date", non_blank(payload.date));
    let start = missing.check("slotTimeStart", non_blank(payload.slot_time_start));
    let end = missing.check("slotTimeEnd", non_blank(payload.slot_time_end));
    missing.into_result()?;

    let (Some(table_number), Some(date), Some(start), Some(end)) = (table_number, date, start, end)
    else {
        return Err(ValidationError::new("Missing required fields"));
    };

    if table_number == 0 {
        return Err(ValidationError::new("tableNumber must be a positive integer"));
    }

    Ok(NormalizedReservation {
        table_number,
        date: parse_date("date", &date)?,
        slot: Slot::new(
            parse_slot_time("slotTimeStart", &start)?,
            parse_slot_time("slotTimeEnd", &end)?,
        ),
        client_name: non_blank(payload.client_name),
        phone_number: non_blank(payload.phone_number),
    })
}

pub fn normalize_table(payload: TableRequest) -> Result<TableDraft, ValidationError> {
    let mut missing = MissingFields::default();
    let number = missing.check("number", payload.number);
    let places = missing.check("places", payload.places);
    let is_vip = missing.check("isVip", payload.is_vip);
    missing.into_result()?;

    let (Some(number), Some(places), Some(is_vip)) = (number, places, is_vip) else {
        return Err(ValidationError::new("Missing required fields"));
    };

    if number == 0 {
        return Err(ValidationError::new("number must be a positive integer"));
    }
    if places == 0 {
        return Err(ValidationError::new("places must be a positive integer"));
    }

    let min_order = payload.min_order.unwrap_or(0.0);
    if !min_order.is_finite() || min_order < 0.0 {
        return Err(ValidationError::new("minOrder must be a non-negative number"));
    }

    Ok(TableDraft {
        id: non_blank(payload.id),
        number,
        places,
        is_vip,
        min_order,
    })
}

pub fn normalize_sign_up(payload: SignUpRequest) -> Result<NewUser, ValidationError> {
    let mut missing = MissingFields::default();
    let first_name = missing.check("firstName", non_blank(payload.first_name));
    let last_name = missing.check("lastName", non_blank(payload.last_name));
    let email = missing.check("email", non_blank(payload.email));
    let password = missing.check("password", payload.password.filter(|value| !value.is_empty()));
    missing.into_result()?;

    let (Some(first_name), Some(last_name), Some(email), Some(password)) =
        (first_name, last_name, email, password)
    else {
        return Err(ValidationError::new("Missing required fields"));
    };

    validate_email(&email)?;
    validate_password(&password)?;

    Ok(NewUser {
        first_name,
        last_name,
        email,
        password,
    })
}

pub fn normalize_sign_in(payload: SignInRequest) -> Result<Credentials, ValidationError> {
    let mut missing = MissingFields::default();
    let email = missing.check("email", non_blank(payload.email));
    let password = missing.check("password", payload.password.filter(|value| !value.is_empty()));
    missing.into_result()?;

    let (Some(email), Some(password)) = (email, password) else {
        return Err(ValidationError::new("Missing required fields"));
    };

    validate_email(&email)?;
    Ok(Credentials { email, password })
}

pub fn parse_date(field: &str, raw: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .map_err(|_| ValidationError::new(format!("{field} must be a date in YYYY-MM-DD format")))
}

pub fn parse_slot_time(field: &str, raw: &str) -> Result<NaiveTime, ValidationError> {
    NaiveTime::parse_from_str(raw.trim(), SLOT_TIME_FORMAT)
        .map_err(|_| ValidationError::new(format!("{field} must be a time in HH:MM format")))
}

fn validate_email(email: &str) -> Result<(), ValidationError> {
    if EMAIL_PATTERN.is_match(email) {
        Ok(())
    } else {
        Err(ValidationError::new("email must be a valid email address"))
    }
}

fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::new(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters long"
        )));
    }

    let has_letter = password.chars().any(|ch| ch.is_ascii_alphabetic());
    let has_digit = password.chars().any(|ch| ch.is_ascii_digit());
    if !PASSWORD_PATTERN.is_match(password) || !has_letter || !has_digit {
        return Err(ValidationError::new(
            "password must contain letters and digits and may only use the symbols $%^*-_",
        ));
    }

    Ok(())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_string())
        .filter(|trimmed| !trimmed.is_empty())
}

#[derive(Default)]
struct MissingFields {
    names: Vec<&'static str>,
}

impl MissingFields {
    fn check<T>(&mut self, name: &'static str, value: Option<T>) -> Option<T> {
        if value.is_none() {
            self.names.push(name);
        }
        value
    }

    fn into_result(self) -> Result<(), ValidationError> {
        if self.names.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::new(format!(
                "Missing required fields: {}",
                self.names.join(", ")
            )))
        }
    }
}
