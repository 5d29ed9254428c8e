use chrono::NaiveDate;

use crate::contract::DATE_FORMAT;

/// Ledger key serializing admissions for one table on one date.
pub fn slot_ledger_key(table_id: &str, date: NaiveDate) -> String {
    format!(
        "table_id={}/date={}",
        table_id.trim_matches('/'),
        date.format(DATE_FORMAT)
    )
}

/// Ledger key claimed by the table carrying `number`.
pub fn table_number_key(number: u32) -> String {
    format!("table_number={number}")
}
