use chrono::Utc;
use reservation_core::booking::check_slot;
use reservation_core::contract::{
    normalize_reservation, ReservationCreated, ReservationList, ReservationRequest,
};
use reservation_core::error::ApiError;
use reservation_core::identity::CallerIdentity;
use reservation_core::model::Reservation;
use tracing::{info, warn};
use uuid::Uuid;

use crate::adapters::reservation_store::ReservationStore;
use crate::adapters::table_store::TableStore;
use crate::adapters::StoreError;

/// Snapshot-check-insert rounds before a contended slot is reported as a
/// backend failure.
pub const MAX_BOOKING_ATTEMPTS: usize = 3;

pub fn create_reservation(
    request: ReservationRequest,
    caller: &CallerIdentity,
    tables: &dyn TableStore,
    reservations: &dyn ReservationStore,
) -> Result<ReservationCreated, ApiError> {
    let booking = normalize_reservation(request)?;
    let table = tables
        .find_by_number(booking.table_number)?
        .ok_or(ApiError::TableNotFound)?;

    for attempt in 1..=MAX_BOOKING_ATTEMPTS {
        let snapshot = reservations.slot_snapshot(&table.id, booking.date)?;
        if let Err(conflict) = check_slot(
            &table.id,
            booking.date,
            &booking.slot,
            &snapshot.reservations,
        ) {
            info!(
                component = "booking",
                event = "slot_conflict",
                table_id = %table.id,
                date = %booking.date,
                conflicting_id = %conflict.conflicting_id,
            );
            return Err(conflict.into());
        }

        let reservation = Reservation {
            id: Uuid::new_v4().to_string(),
            table_id: table.id.clone(),
            table_number: table.number,
            client_name: booking.client_name.clone(),
            phone_number: booking.phone_number.clone(),
            user_id: caller.user_id.clone(),
            date: booking.date,
            slot_time_start: booking.slot.start,
            slot_time_end: booking.slot.end,
            created_at: Utc::now(),
        };

        match reservations.insert_reservation(&reservation, snapshot.version) {
            Ok(()) => {
                info!(
                    component = "booking",
                    event = "reservation_created",
                    reservation_id = %reservation.id,
                    table_id = %reservation.table_id,
                    date = %reservation.date,
                    attempt,
                );
                return Ok(ReservationCreated::new(reservation.id));
            }
            Err(StoreError::Contended) => {
                warn!(
                    component = "booking",
                    event = "slot_contended",
                    table_id = %table.id,
                    date = %booking.date,
                    attempt,
                );
            }
            Err(error) => return Err(error.into()),
        }
    }

    Err(ApiError::BackendUnavailable(format!(
        "slot ledger for table {} on {} stayed contended after {MAX_BOOKING_ATTEMPTS} attempts",
        table.id, booking.date
    )))
}

/// Reservations owned by the caller, ordered by date then start time.
pub fn list_reservations(
    caller: &CallerIdentity,
    reservations: &dyn ReservationStore,
) -> Result<ReservationList, ApiError> {
    let mut owned: Vec<Reservation> = reservations
        .list_reservations()?
        .into_iter()
        .filter(|reservation| reservation.user_id == caller.user_id)
        .collect();
    owned.sort_by(|left, right| {
        (left.date, left.slot_time_start, left.table_number)
            .cmp(&(right.date, right.slot_time_start, right.table_number))
    });

    Ok(ReservationList {
        reservations: owned,
    })
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveTime};
    use reservation_core::model::Table;

    use super::*;
    use crate::adapters::memory::InMemoryStore;

    fn caller() -> CallerIdentity {
        CallerIdentity {
            user_id: "user-1".to_string(),
            email: Some("ada@example.com".to_string()),
        }
    }

    fn table(id: &str, number: u32) -> Table {
        Table {
            id: id.to_string(),
            number,
            places: 4,
            is_vip: false,
            min_order: 0.0,
        }
    }

    fn request(table_number: u32, date: &str, start: &str, end: &str) -> ReservationRequest {
        ReservationRequest {
            table_number: Some(table_number),
            date: Some(date.to_string()),
            slot_time_start: Some(start.to_string()),
            slot_time_end: Some(end.to_string()),
            client_name: Some("Ada".to_string()),
            phone_number: Some("+100".to_string()),
        }
    }

    fn existing(id: &str, table_id: &str, start: &str, end: &str) -> Reservation {
        Reservation {
            id: id.to_string(),
            table_id: table_id.to_string(),
            table_number: 5,
            client_name: None,
            phone_number: None,
            user_id: "user-2".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 6, 1).expect("valid date"),
            slot_time_start: NaiveTime::parse_from_str(start, "%H:%M").expect("valid time"),
            slot_time_end: NaiveTime::parse_from_str(end, "%H:%M").expect("valid time"),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn admits_first_booking_and_stores_it() {
        let store = InMemoryStore::with_tables([table("t-5", 5)]);

        let created = create_reservation(
            request(5, "2024-06-01", "18:00", "19:00"),
            &caller(),
            &store,
            &store,
        )
        .expect("booking should succeed");

        assert_eq!(created.message, "Reservation created successfully");
        let stored = store.reservations();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, created.reservation_id);
        assert_eq!(stored[0].table_id, "t-5");
        assert_eq!(stored[0].user_id, "user-1");
        assert_eq!(stored[0].client_name.as_deref(), Some("Ada"));
    }

    #[test]
    fn overlapping_and_boundary_bookings_are_rejected_without_writes() {
        let store = InMemoryStore::with_tables([table("t-5", 5)]);
        create_reservation(
            request(5, "2024-06-01", "18:00", "19:00"),
            &caller(),
            &store,
            &store,
        )
        .expect("first booking should succeed");

        for (start, end) in [("18:30", "19:30"), ("19:00", "20:00"), ("17:00", "18:00")] {
            let error = create_reservation(
                request(5, "2024-06-01", start, end),
                &caller(),
                &store,
                &store,
            )
            .expect_err("overlapping booking should fail");
            assert_eq!(error, ApiError::SlotConflict);
        }

        assert_eq!(store.reservations().len(), 1);
    }

    #[test]
    fn resubmitting_a_conflicting_request_conflicts_again() {
        let store = InMemoryStore::with_tables([table("t-5", 5)]);
        create_reservation(request(5, "2024-06-01", "18:00", "19:00"), &caller(), &store, &store)
            .expect("first booking should succeed");

        for _ in 0..2 {
            let error = create_reservation(
                request(5, "2024-06-01", "18:30", "19:30"),
                &caller(),
                &store,
                &store,
            )
            .expect_err("booking should conflict");
            assert_eq!(error, ApiError::SlotConflict);
        }
    }

    #[test]
    fn same_slot_on_another_table_or_date_is_admitted() {
        let store = InMemoryStore::with_tables([table("t-5", 5), table("t-6", 6)]);
        create_reservation(request(5, "2024-06-01", "18:00", "19:00"), &caller(), &store, &store)
            .expect("first booking should succeed");

        create_reservation(request(6, "2024-06-01", "18:00", "19:00"), &caller(), &store, &store)
            .expect("other table should succeed");
        create_reservation(request(5, "2024-06-02", "18:00", "19:00"), &caller(), &store, &store)
            .expect("other date should succeed");

        assert_eq!(store.reservations().len(), 3);
    }

    #[test]
    fn zero_length_booking_is_admitted_on_an_empty_day() {
        let store = InMemoryStore::with_tables([table("t-5", 5)]);

        create_reservation(
            request(5, "2024-06-01", "18:30", "18:30"),
            &caller(),
            &store,
            &store,
        )
        .expect("zero-length booking should succeed");

        let stored = store.reservations();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].slot_time_start, stored[0].slot_time_end);
    }

    #[test]
    fn zero_length_booking_conflicts_inside_and_on_the_boundary() {
        let store = InMemoryStore::with_tables([table("t-5", 5)]);
        create_reservation(
            request(5, "2024-06-01", "18:00", "19:00"),
            &caller(),
            &store,
            &store,
        )
        .expect("first booking should succeed");

        for instant in ["18:30", "19:00"] {
            let error = create_reservation(
                request(5, "2024-06-01", instant, instant),
                &caller(),
                &store,
                &store,
            )
            .expect_err("zero-length booking should conflict");
            assert_eq!(error, ApiError::SlotConflict);
        }

        assert_eq!(store.reservations().len(), 1);
    }

    #[test]
    fn unknown_table_number_is_table_not_found() {
        let store = InMemoryStore::with_tables([table("t-5", 5)]);

        let error = create_reservation(
            request(99, "2024-06-01", "18:00", "19:00"),
            &caller(),
            &store,
            &store,
        )
        .expect_err("booking should fail");

        assert_eq!(error, ApiError::TableNotFound);
        assert_eq!(store.calls(), vec!["find_by_number"]);
    }

    #[test]
    fn duplicate_table_numbers_resolve_to_first_match() {
        let store = InMemoryStore::with_tables([table("first", 7), table("second", 7)]);

        create_reservation(request(7, "2024-06-01", "18:00", "19:00"), &caller(), &store, &store)
            .expect("booking should succeed");

        assert_eq!(store.reservations()[0].table_id, "first");
    }

    #[test]
    fn missing_fields_fail_before_any_store_call() {
        let store = InMemoryStore::with_tables([table("t-5", 5)]);
        let mut incomplete = request(5, "2024-06-01", "18:00", "19:00");
        incomplete.date = None;

        let error = create_reservation(incomplete, &caller(), &store, &store)
            .expect_err("booking should fail");

        assert_eq!(
            error,
            ApiError::Validation("Missing required fields: date".to_string())
        );
        assert!(store.calls().is_empty());
    }

    #[test]
    fn contended_insert_rechecks_and_detects_the_concurrent_conflict() {
        let store = InMemoryStore::with_tables([table("t-5", 5)]);
        store.interleave_before_next_insert(existing("racer", "t-5", "18:30", "19:30"));

        let error = create_reservation(
            request(5, "2024-06-01", "18:00", "19:00"),
            &caller(),
            &store,
            &store,
        )
        .expect_err("booking should lose the race");

        assert_eq!(error, ApiError::SlotConflict);
        let stored = store.reservations();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, "racer");
    }

    #[test]
    fn contended_insert_retries_when_concurrent_booking_does_not_overlap() {
        let store = InMemoryStore::with_tables([table("t-5", 5)]);
        store.interleave_before_next_insert(existing("lunch", "t-5", "12:00", "13:00"));

        create_reservation(request(5, "2024-06-01", "18:00", "19:00"), &caller(), &store, &store)
            .expect("booking should succeed on retry");

        assert_eq!(store.reservations().len(), 2);
        assert_eq!(
            store.calls(),
            vec![
                "find_by_number",
                "slot_snapshot",
                "insert_reservation",
                "slot_snapshot",
                "insert_reservation",
            ]
        );
    }

    #[test]
    fn backend_failure_is_backend_unavailable() {
        let store = InMemoryStore::unavailable();

        let error = create_reservation(
            request(5, "2024-06-01", "18:00", "19:00"),
            &caller(),
            &store,
            &store,
        )
        .expect_err("booking should fail");

        assert!(matches!(error, ApiError::BackendUnavailable(_)));
        assert_eq!(error.public_message(), "Internal Server Error");
    }

    #[test]
    fn list_reservations_returns_only_callers_bookings_in_order() {
        let store = InMemoryStore::with_tables([table("t-5", 5)]);
        create_reservation(request(5, "2024-06-02", "12:00", "13:00"), &caller(), &store, &store)
            .expect("booking should succeed");
        create_reservation(request(5, "2024-06-01", "20:00", "21:00"), &caller(), &store, &store)
            .expect("booking should succeed");
        store.interleave_before_next_insert(existing("someone-else", "t-5", "09:00", "10:00"));
        create_reservation(request(5, "2024-06-01", "18:00", "19:00"), &caller(), &store, &store)
            .expect("booking should succeed");

        let listed = list_reservations(&caller(), &store).expect("list should succeed");

        let slots: Vec<String> = listed
            .reservations
            .iter()
            .map(|reservation| {
                format!(
                    "{} {}",
                    reservation.date,
                    reservation.slot_time_start.format("%H:%M")
                )
            })
            .collect();
        assert_eq!(
            slots,
            vec!["2024-06-01 18:00", "2024-06-01 20:00", "2024-06-02 12:00"]
        );
    }
}
