use std::collections::HashMap;
use std::str::FromStr;

use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::operation::transact_write_items::TransactWriteItemsError;
use aws_sdk_dynamodb::types::{AttributeValue, Put, TransactWriteItem, Update};
use aws_sdk_dynamodb::Client;
use chrono::{DateTime, NaiveDate, Utc};
use reservation_core::contract::{parse_date, parse_slot_time, DATE_FORMAT, SLOT_TIME_FORMAT};
use reservation_core::model::{Reservation, Table};
use reservation_core::storage_keys::{slot_ledger_key, table_number_key};

use super::reservation_store::{ReservationStore, SlotSnapshot};
use super::table_store::TableStore;
use super::{run_blocking, StoreError};

type Item = HashMap<String, AttributeValue>;

const LEDGER_KEY_ATTRIBUTE: &str = "slotKey";
const LEDGER_VERSION_ATTRIBUTE: &str = "version";
const LEDGER_OWNER_ATTRIBUTE: &str = "tableId";

const CONDITION_FAILED: &str = "ConditionalCheckFailed";
const TRANSACTION_CONFLICT: &str = "TransactionConflict";
const NOT_CANCELLED: &str = "None";

/// Tables live in `table_name`; each table's number is claimed by a marker
/// item in the ledger table written in the same transaction.
#[derive(Clone)]
pub struct DynamoTableStore {
    client: Client,
    table_name: String,
    ledger_table: String,
}

impl DynamoTableStore {
    pub fn new(
        client: Client,
        table_name: impl Into<String>,
        ledger_table: impl Into<String>,
    ) -> Self {
        Self {
            client,
            table_name: table_name.into(),
            ledger_table: ledger_table.into(),
        }
    }
}

impl TableStore for DynamoTableStore {
    fn find_by_number(&self, number: u32) -> Result<Option<Table>, StoreError> {
        let filter = ScanFilter::new("#number = :number")
            .name("#number", "number")
            .value(":number", AttributeValue::N(number.to_string()));
        let items = run_blocking(scan_items(&self.client, &self.table_name, Some(&filter)))?;
        items.first().map(table_from_item).transpose()
    }

    fn get_table(&self, table_id: &str) -> Result<Option<Table>, StoreError> {
        let output = run_blocking(
            self.client
                .get_item()
                .table_name(&self.table_name)
                .key("id", AttributeValue::S(table_id.to_string()))
                .consistent_read(true)
                .send(),
        )
        .map_err(|error| {
            StoreError::Unavailable(format!(
                "failed to read table {table_id}: {}",
                DisplayErrorContext(&error)
            ))
        })?;
        output.item().map(table_from_item).transpose()
    }

    fn list_tables(&self) -> Result<Vec<Table>, StoreError> {
        run_blocking(scan_items(&self.client, &self.table_name, None))?
            .iter()
            .map(table_from_item)
            .collect()
    }

    fn put_table(&self, table: &Table) -> Result<(), StoreError> {
        let table_put = Put::builder()
            .table_name(&self.table_name)
            .set_item(Some(table_to_item(table)))
            .condition_expression("attribute_not_exists(id)")
            .build()
            .map_err(|error| StoreError::Unavailable(format!("invalid table put: {error}")))?;

        let number_claim = Put::builder()
            .table_name(&self.ledger_table)
            .item(
                LEDGER_KEY_ATTRIBUTE,
                AttributeValue::S(table_number_key(table.number)),
            )
            .item(LEDGER_OWNER_ATTRIBUTE, AttributeValue::S(table.id.clone()))
            .condition_expression("attribute_not_exists(#key)")
            .expression_attribute_names("#key", LEDGER_KEY_ATTRIBUTE)
            .build()
            .map_err(|error| StoreError::Unavailable(format!("invalid number claim: {error}")))?;

        run_blocking(
            self.client
                .transact_write_items()
                .transact_items(TransactWriteItem::builder().put(table_put).build())
                .transact_items(TransactWriteItem::builder().put(number_claim).build())
                .send(),
        )
        .map(|_| ())
        .map_err(|error| match error.as_service_error().and_then(cancellation_codes) {
            Some(codes) => table_write_failure(table, &codes),
            None => StoreError::Unavailable(format!(
                "failed to write table {}: {}",
                table.id,
                DisplayErrorContext(&error)
            )),
        })
    }
}

#[derive(Clone)]
pub struct DynamoReservationStore {
    client: Client,
    reservations_table: String,
    ledger_table: String,
}

impl DynamoReservationStore {
    pub fn new(
        client: Client,
        reservations_table: impl Into<String>,
        ledger_table: impl Into<String>,
    ) -> Self {
        Self {
            client,
            reservations_table: reservations_table.into(),
            ledger_table: ledger_table.into(),
        }
    }

    async fn read_slot_snapshot(
        &self,
        table_id: &str,
        date: NaiveDate,
    ) -> Result<SlotSnapshot, StoreError> {
        // The ledger is read before the reservations: anything committed
        // after this point moves the version and fails the insert.
        let ledger = self
            .client
            .get_item()
            .table_name(&self.ledger_table)
            .key(
                LEDGER_KEY_ATTRIBUTE,
                AttributeValue::S(slot_ledger_key(table_id, date)),
            )
            .consistent_read(true)
            .send()
            .await
            .map_err(|error| {
                StoreError::Unavailable(format!(
                    "failed to read slot ledger: {}",
                    DisplayErrorContext(&error)
                ))
            })?;
        let version = match ledger.item() {
            Some(item) => number_attr(item, LEDGER_VERSION_ATTRIBUTE)?,
            None => 0,
        };

        let filter = ScanFilter::new("tableId = :table_id AND #date = :date")
            .name("#date", "date")
            .value(":table_id", AttributeValue::S(table_id.to_string()))
            .value(
                ":date",
                AttributeValue::S(date.format(DATE_FORMAT).to_string()),
            );
        let reservations = scan_items(&self.client, &self.reservations_table, Some(&filter))
            .await?
            .iter()
            .map(reservation_from_item)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(SlotSnapshot {
            version,
            reservations,
        })
    }
}

impl ReservationStore for DynamoReservationStore {
    fn slot_snapshot(&self, table_id: &str, date: NaiveDate) -> Result<SlotSnapshot, StoreError> {
        run_blocking(self.read_slot_snapshot(table_id, date))
    }

    fn insert_reservation(
        &self,
        reservation: &Reservation,
        expected_version: u64,
    ) -> Result<(), StoreError> {
        let ledger_update = Update::builder()
            .table_name(&self.ledger_table)
            .key(
                LEDGER_KEY_ATTRIBUTE,
                AttributeValue::S(slot_ledger_key(&reservation.table_id, reservation.date)),
            )
            .update_expression("SET #version = :next")
            .condition_expression("attribute_not_exists(#key) OR #version = :expected")
            .expression_attribute_names("#key", LEDGER_KEY_ATTRIBUTE)
            .expression_attribute_names("#version", LEDGER_VERSION_ATTRIBUTE)
            .expression_attribute_values(
                ":expected",
                AttributeValue::N(expected_version.to_string()),
            )
            .expression_attribute_values(
                ":next",
                AttributeValue::N(expected_version.saturating_add(1).to_string()),
            )
            .build()
            .map_err(|error| StoreError::Unavailable(format!("invalid ledger update: {error}")))?;

        let reservation_put = Put::builder()
            .table_name(&self.reservations_table)
            .set_item(Some(reservation_to_item(reservation)))
            .condition_expression("attribute_not_exists(id)")
            .build()
            .map_err(|error| StoreError::Unavailable(format!("invalid reservation put: {error}")))?;

        run_blocking(
            self.client
                .transact_write_items()
                .transact_items(TransactWriteItem::builder().update(ledger_update).build())
                .transact_items(TransactWriteItem::builder().put(reservation_put).build())
                .send(),
        )
        .map(|_| ())
        .map_err(|error| {
            // Reservation ids are random, so a failed condition is the ledger.
            match error.as_service_error().and_then(cancellation_codes) {
                Some(codes) if is_contention(&codes) => StoreError::Contended,
                Some(codes) => StoreError::Unavailable(format!(
                    "reservation {} write cancelled: {}",
                    reservation.id,
                    codes.join(", ")
                )),
                None => StoreError::Unavailable(format!(
                    "failed to write reservation {}: {}",
                    reservation.id,
                    DisplayErrorContext(&error)
                )),
            }
        })
    }

    fn list_reservations(&self) -> Result<Vec<Reservation>, StoreError> {
        run_blocking(scan_items(&self.client, &self.reservations_table, None))?
            .iter()
            .map(reservation_from_item)
            .collect()
    }
}

/// Per-item cancellation codes of a cancelled transaction, in request order.
fn cancellation_codes(error: &TransactWriteItemsError) -> Option<Vec<String>> {
    match error {
        TransactWriteItemsError::TransactionCanceledException(cancelled) => Some(
            cancelled
                .cancellation_reasons()
                .iter()
                .map(|reason| reason.code().unwrap_or(NOT_CANCELLED).to_string())
                .collect(),
        ),
        _ => None,
    }
}

/// True when every failing item lost to another writer. Throttling and
/// validation codes are not contention and must not be retried as such.
fn is_contention(codes: &[String]) -> bool {
    let lost_race = |code: &str| code == CONDITION_FAILED || code == TRANSACTION_CONFLICT;
    codes.iter().any(|code| lost_race(code))
        && codes
            .iter()
            .all(|code| code == NOT_CANCELLED || lost_race(code))
}

/// Codes follow the `put_table` order: table item, then number claim.
fn table_write_failure(table: &Table, codes: &[String]) -> StoreError {
    match codes {
        [id, _] if id == CONDITION_FAILED => StoreError::AlreadyExists,
        [_, number] if number == CONDITION_FAILED => StoreError::NumberTaken(table.number),
        _ => StoreError::Unavailable(format!(
            "table {} write cancelled: {}",
            table.id,
            codes.join(", ")
        )),
    }
}

struct ScanFilter {
    expression: &'static str,
    names: HashMap<String, String>,
    values: Item,
}

impl ScanFilter {
    fn new(expression: &'static str) -> Self {
        Self {
            expression,
            names: HashMap::new(),
            values: HashMap::new(),
        }
    }

    fn name(mut self, placeholder: &str, attribute: &str) -> Self {
        self.names
            .insert(placeholder.to_string(), attribute.to_string());
        self
    }

    fn value(mut self, placeholder: &str, value: AttributeValue) -> Self {
        self.values.insert(placeholder.to_string(), value);
        self
    }
}

/// Scans every page; filters apply per page, so matches may sit on any of them.
async fn scan_items(
    client: &Client,
    table_name: &str,
    filter: Option<&ScanFilter>,
) -> Result<Vec<Item>, StoreError> {
    let mut items = Vec::new();
    let mut start_key: Option<Item> = None;

    loop {
        let mut request = client
            .scan()
            .table_name(table_name)
            .consistent_read(true)
            .set_exclusive_start_key(start_key.take());
        if let Some(filter) = filter {
            request = request
                .filter_expression(filter.expression)
                .set_expression_attribute_values(Some(filter.values.clone()));
            if !filter.names.is_empty() {
                request = request.set_expression_attribute_names(Some(filter.names.clone()));
            }
        }

        let output = request.send().await.map_err(|error| {
            StoreError::Unavailable(format!(
                "failed to scan {table_name}: {}",
                DisplayErrorContext(&error)
            ))
        })?;
        items.extend(output.items().iter().cloned());

        match output.last_evaluated_key() {
            Some(key) if !key.is_empty() => start_key = Some(key.clone()),
            _ => break,
        }
    }

    Ok(items)
}

fn table_to_item(table: &Table) -> Item {
    HashMap::from([
        ("id".to_string(), AttributeValue::S(table.id.clone())),
        ("number".to_string(), AttributeValue::N(table.number.to_string())),
        ("places".to_string(), AttributeValue::N(table.places.to_string())),
        ("isVip".to_string(), AttributeValue::Bool(table.is_vip)),
        ("minOrder".to_string(), AttributeValue::N(table.min_order.to_string())),
    ])
}

fn table_from_item(item: &Item) -> Result<Table, StoreError> {
    Ok(Table {
        id: string_attr(item, "id")?,
        number: number_attr(item, "number")?,
        places: number_attr(item, "places")?,
        is_vip: item
            .get("isVip")
            .and_then(|value| value.as_bool().ok())
            .copied()
            .unwrap_or(false),
        min_order: match item.get("minOrder") {
            Some(_) => number_attr(item, "minOrder")?,
            None => 0.0,
        },
    })
}

fn reservation_to_item(reservation: &Reservation) -> Item {
    let mut item = HashMap::from([
        ("id".to_string(), AttributeValue::S(reservation.id.clone())),
        (
            "tableId".to_string(),
            AttributeValue::S(reservation.table_id.clone()),
        ),
        (
            "tableNumber".to_string(),
            AttributeValue::N(reservation.table_number.to_string()),
        ),
        (
            "userId".to_string(),
            AttributeValue::S(reservation.user_id.clone()),
        ),
        (
            "date".to_string(),
            AttributeValue::S(reservation.date.format(DATE_FORMAT).to_string()),
        ),
        (
            "slotTimeStart".to_string(),
            AttributeValue::S(reservation.slot_time_start.format(SLOT_TIME_FORMAT).to_string()),
        ),
        (
            "slotTimeEnd".to_string(),
            AttributeValue::S(reservation.slot_time_end.format(SLOT_TIME_FORMAT).to_string()),
        ),
        (
            "createdAt".to_string(),
            AttributeValue::S(reservation.created_at.to_rfc3339()),
        ),
    ]);
    if let Some(client_name) = &reservation.client_name {
        item.insert(
            "clientName".to_string(),
            AttributeValue::S(client_name.clone()),
        );
    }
    if let Some(phone_number) = &reservation.phone_number {
        item.insert(
            "phoneNumber".to_string(),
            AttributeValue::S(phone_number.clone()),
        );
    }
    item
}

fn reservation_from_item(item: &Item) -> Result<Reservation, StoreError> {
    let malformed = |error: reservation_core::contract::ValidationError| {
        StoreError::Malformed(error.to_string())
    };
    let created_at = string_attr(item, "createdAt")?;

    Ok(Reservation {
        id: string_attr(item, "id")?,
        table_id: string_attr(item, "tableId")?,
        table_number: number_attr(item, "tableNumber")?,
        client_name: optional_string_attr(item, "clientName"),
        phone_number: optional_string_attr(item, "phoneNumber"),
        user_id: string_attr(item, "userId")?,
        date: parse_date("date", &string_attr(item, "date")?).map_err(malformed)?,
        slot_time_start: parse_slot_time("slotTimeStart", &string_attr(item, "slotTimeStart")?)
            .map_err(malformed)?,
        slot_time_end: parse_slot_time("slotTimeEnd", &string_attr(item, "slotTimeEnd")?)
            .map_err(malformed)?,
        created_at: DateTime::parse_from_rfc3339(&created_at)
            .map(|timestamp| timestamp.with_timezone(&Utc))
            .map_err(|error| StoreError::Malformed(format!("createdAt '{created_at}': {error}")))?,
    })
}

fn string_attr(item: &Item, name: &str) -> Result<String, StoreError> {
    item.get(name)
        .and_then(|value| value.as_s().ok())
        .cloned()
        .ok_or_else(|| StoreError::Malformed(format!("missing string attribute '{name}'")))
}

fn optional_string_attr(item: &Item, name: &str) -> Option<String> {
    item.get(name)
        .and_then(|value| value.as_s().ok())
        .filter(|value| !value.is_empty())
        .cloned()
}

fn number_attr<T: FromStr>(item: &Item, name: &str) -> Result<T, StoreError> {
    let raw = item
        .get(name)
        .and_then(|value| value.as_n().ok())
        .ok_or_else(|| StoreError::Malformed(format!("missing number attribute '{name}'")))?;
    raw.parse().map_err(|_| {
        StoreError::Malformed(format!("attribute '{name}' is not a valid number: {raw}"))
    })
}
