use reservation_core::model::Table;

use super::StoreError;

pub trait TableStore: Send + Sync {
    /// First table carrying `number`, in store order.
    fn find_by_number(&self, number: u32) -> Result<Option<Table>, StoreError>;

    fn get_table(&self, table_id: &str) -> Result<Option<Table>, StoreError>;

    fn list_tables(&self) -> Result<Vec<Table>, StoreError>;

    /// Fails with [`StoreError::AlreadyExists`] when the id is taken and with
    /// [`StoreError::NumberTaken`] when another table holds the number. Either
    /// way nothing is written.
    fn put_table(&self, table: &Table) -> Result<(), StoreError>;
}
