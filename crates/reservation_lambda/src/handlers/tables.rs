use reservation_core::contract::{normalize_table, TableCreated, TableList, TableRequest};
use reservation_core::error::ApiError;
use reservation_core::model::Table;
use tracing::info;
use uuid::Uuid;

use crate::adapters::table_store::TableStore;
use crate::adapters::StoreError;

pub fn create_table(
    request: TableRequest,
    tables: &dyn TableStore,
) -> Result<TableCreated, ApiError> {
    let draft = normalize_table(request)?;
    if tables.find_by_number(draft.number)?.is_some() {
        return Err(ApiError::DuplicateTableNumber);
    }

    let table = draft.into_table(|| Uuid::new_v4().to_string());
    match tables.put_table(&table) {
        Ok(()) => {
            info!(
                component = "tables",
                event = "table_created",
                table_id = %table.id,
                number = table.number,
            );
            Ok(TableCreated { id: table.id })
        }
        Err(StoreError::NumberTaken(_)) => Err(ApiError::DuplicateTableNumber),
        Err(StoreError::AlreadyExists) => Err(ApiError::Validation(format!(
            "Table with id '{}' already exists",
            table.id
        ))),
        Err(error) => Err(error.into()),
    }
}

pub fn list_tables(tables: &dyn TableStore) -> Result<TableList, ApiError> {
    let mut listed = tables.list_tables()?;
    listed.sort_by(|left, right| {
        left.number
            .cmp(&right.number)
            .then_with(|| left.id.cmp(&right.id))
    });
    Ok(TableList { tables: listed })
}

pub fn get_table(table_id: &str, tables: &dyn TableStore) -> Result<Table, ApiError> {
    tables
        .get_table(table_id)?
        .ok_or_else(|| ApiError::NotFound("Table".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryStore;

    fn request(id: Option<&str>, number: u32) -> TableRequest {
        TableRequest {
            id: id.map(str::to_string),
            number: Some(number),
            places: Some(4),
            is_vip: Some(false),
            min_order: Some(25.0),
        }
    }

    #[test]
    fn creates_table_with_generated_id() {
        let store = InMemoryStore::new();

        let created = create_table(request(None, 3), &store).expect("table should be created");

        assert!(!created.id.is_empty());
        let stored = store.tables();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, created.id);
        assert_eq!(stored[0].min_order, 25.0);
    }

    #[test]
    fn rejects_reused_table_number() {
        let store = InMemoryStore::new();
        create_table(request(Some("a"), 3), &store).expect("first table should be created");

        let error = create_table(request(Some("b"), 3), &store).expect_err("number is taken");

        assert_eq!(error, ApiError::DuplicateTableNumber);
        assert_eq!(store.tables().len(), 1);
    }

    /// Reads through to the wrapped store except that number lookups miss,
    /// as they do for a request racing another create of the same number.
    struct StaleNumberLookup<'a>(&'a InMemoryStore);

    impl TableStore for StaleNumberLookup<'_> {
        fn find_by_number(&self, _number: u32) -> Result<Option<Table>, StoreError> {
            Ok(None)
        }

        fn get_table(&self, table_id: &str) -> Result<Option<Table>, StoreError> {
            self.0.get_table(table_id)
        }

        fn list_tables(&self) -> Result<Vec<Table>, StoreError> {
            self.0.list_tables()
        }

        fn put_table(&self, table: &Table) -> Result<(), StoreError> {
            self.0.put_table(table)
        }
    }

    #[test]
    fn racing_creates_with_one_number_admit_only_the_first() {
        let store = InMemoryStore::new();
        let racing = StaleNumberLookup(&store);

        create_table(request(Some("a"), 7), &racing).expect("first table should be created");
        let error = create_table(request(Some("b"), 7), &racing)
            .expect_err("the write itself should reject the number");

        assert_eq!(error, ApiError::DuplicateTableNumber);
        let numbers: Vec<u32> = store.tables().iter().map(|table| table.number).collect();
        assert_eq!(numbers, vec![7]);
    }

    #[test]
    fn rejects_reused_table_id() {
        let store = InMemoryStore::new();
        create_table(request(Some("a"), 3), &store).expect("first table should be created");

        let error = create_table(request(Some("a"), 4), &store).expect_err("id is taken");

        assert_eq!(
            error,
            ApiError::Validation("Table with id 'a' already exists".to_string())
        );
    }

    #[test]
    fn lists_tables_by_number() {
        let store = InMemoryStore::new();
        for (id, number) in [("c", 9), ("a", 2), ("b", 5)] {
            create_table(request(Some(id), number), &store).expect("table should be created");
        }

        let listed = list_tables(&store).expect("list should succeed");
        let numbers: Vec<u32> = listed.tables.iter().map(|table| table.number).collect();
        assert_eq!(numbers, vec![2, 5, 9]);
    }

    #[test]
    fn missing_table_is_not_found() {
        let store = InMemoryStore::new();

        let error = get_table("nope", &store).expect_err("table should be missing");

        assert_eq!(error.status_code(), 404);
        assert_eq!(error.public_message(), "Table not found");
    }
}
