use chrono::NaiveDate;
use reservation_core::model::Reservation;

use super::StoreError;

/// Reservations for one table and date, read after the ledger version they
/// are valid for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlotSnapshot {
    pub version: u64,
    pub reservations: Vec<Reservation>,
}

pub trait ReservationStore: Send + Sync {
    fn slot_snapshot(&self, table_id: &str, date: NaiveDate) -> Result<SlotSnapshot, StoreError>;

    /// Writes the reservation and bumps its slot ledger in one step.
    ///
    /// Fails with [`StoreError::Contended`] and writes nothing when the ledger
    /// for the reservation's table and date is no longer at `expected_version`.
    fn insert_reservation(
        &self,
        reservation: &Reservation,
        expected_version: u64,
    ) -> Result<(), StoreError>;

    fn list_reservations(&self) -> Result<Vec<Reservation>, StoreError>;
}
