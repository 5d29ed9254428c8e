//! Process-local implementations of the store and directory traits.
//!
//! Every call is recorded so callers can assert which backend operations a
//! request performed.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use chrono::NaiveDate;
use reservation_core::contract::{Credentials, NewUser};
use reservation_core::model::{Reservation, Table};
use reservation_core::storage_keys::slot_ledger_key;

use super::reservation_store::{ReservationStore, SlotSnapshot};
use super::table_store::TableStore;
use super::user_directory::{DirectoryError, UserDirectory};
use super::StoreError;

#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<StoreState>,
}

#[derive(Default)]
struct StoreState {
    tables: Vec<Table>,
    reservations: Vec<Reservation>,
    ledger: HashMap<String, u64>,
    calls: Vec<&'static str>,
    unavailable: bool,
    interleaved: Vec<Reservation>,
}

impl StoreState {
    fn record(&mut self, call: &'static str) -> Result<(), StoreError> {
        self.calls.push(call);
        if self.unavailable {
            return Err(StoreError::Unavailable(format!(
                "in-memory store rejected {call}"
            )));
        }
        Ok(())
    }

    fn ledger_version(&self, table_id: &str, date: NaiveDate) -> u64 {
        self.ledger
            .get(&slot_ledger_key(table_id, date))
            .copied()
            .unwrap_or(0)
    }

    fn commit(&mut self, reservation: Reservation) {
        let key = slot_ledger_key(&reservation.table_id, reservation.date);
        *self.ledger.entry(key).or_insert(0) += 1;
        self.reservations.push(reservation);
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tables(tables: impl IntoIterator<Item = Table>) -> Self {
        let store = Self::new();
        store.lock().tables.extend(tables);
        store
    }

    /// A store whose every operation fails with [`StoreError::Unavailable`].
    pub fn unavailable() -> Self {
        let store = Self::new();
        store.lock().unavailable = true;
        store
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.lock().calls.clone()
    }

    pub fn reservations(&self) -> Vec<Reservation> {
        self.lock().reservations.clone()
    }

    pub fn tables(&self) -> Vec<Table> {
        self.lock().tables.clone()
    }

    /// Commits `reservation` right before the next insert is evaluated, the
    /// way a concurrent request finishing first would.
    pub fn interleave_before_next_insert(&self, reservation: Reservation) {
        self.lock().interleaved.push(reservation);
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().expect("poisoned mutex")
    }
}

impl TableStore for InMemoryStore {
    fn find_by_number(&self, number: u32) -> Result<Option<Table>, StoreError> {
        let mut state = self.lock();
        state.record("find_by_number")?;
        Ok(state
            .tables
            .iter()
            .find(|table| table.number == number)
            .cloned())
    }

    fn get_table(&self, table_id: &str) -> Result<Option<Table>, StoreError> {
        let mut state = self.lock();
        state.record("get_table")?;
        Ok(state.tables.iter().find(|table| table.id == table_id).cloned())
    }

    fn list_tables(&self) -> Result<Vec<Table>, StoreError> {
        let mut state = self.lock();
        state.record("list_tables")?;
        Ok(state.tables.clone())
    }

    fn put_table(&self, table: &Table) -> Result<(), StoreError> {
        let mut state = self.lock();
        state.record("put_table")?;
        if state.tables.iter().any(|existing| existing.id == table.id) {
            return Err(StoreError::AlreadyExists);
        }
        if state.tables.iter().any(|existing| existing.number == table.number) {
            return Err(StoreError::NumberTaken(table.number));
        }
        state.tables.push(table.clone());
        Ok(())
    }
}

impl ReservationStore for InMemoryStore {
    fn slot_snapshot(&self, table_id: &str, date: NaiveDate) -> Result<SlotSnapshot, StoreError> {
        let mut state = self.lock();
        state.record("slot_snapshot")?;
        Ok(SlotSnapshot {
            version: state.ledger_version(table_id, date),
            reservations: state
                .reservations
                .iter()
                .filter(|reservation| reservation.table_id == table_id && reservation.date == date)
                .cloned()
                .collect(),
        })
    }

    fn insert_reservation(
        &self,
        reservation: &Reservation,
        expected_version: u64,
    ) -> Result<(), StoreError> {
        let mut state = self.lock();
        state.record("insert_reservation")?;

        let interleaved = std::mem::take(&mut state.interleaved);
        for concurrent in interleaved {
            state.commit(concurrent);
        }

        if state.ledger_version(&reservation.table_id, reservation.date) != expected_version {
            return Err(StoreError::Contended);
        }
        if state
            .reservations
            .iter()
            .any(|existing| existing.id == reservation.id)
        {
            return Err(StoreError::AlreadyExists);
        }

        state.commit(reservation.clone());
        Ok(())
    }

    fn list_reservations(&self) -> Result<Vec<Reservation>, StoreError> {
        let mut state = self.lock();
        state.record("list_reservations")?;
        Ok(state.reservations.clone())
    }
}

#[derive(Default)]
pub struct InMemoryDirectory {
    users: Mutex<HashMap<String, NewUser>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user(&self, email: &str) -> Option<NewUser> {
        self.users.lock().expect("poisoned mutex").get(email).cloned()
    }
}

impl UserDirectory for InMemoryDirectory {
    fn sign_up(&self, user: &NewUser) -> Result<(), DirectoryError> {
        let mut users = self.users.lock().expect("poisoned mutex");
        if users.contains_key(&user.email) {
            return Err(DirectoryError::UserExists);
        }
        users.insert(user.email.clone(), user.clone());
        Ok(())
    }

    fn sign_in(&self, credentials: &Credentials) -> Result<String, DirectoryError> {
        let users = self.users.lock().expect("poisoned mutex");
        match users.get(&credentials.email) {
            Some(user) if user.password == credentials.password => {
                Ok(format!("token-{}", credentials.email))
            }
            _ => Err(DirectoryError::InvalidCredentials),
        }
    }
}
