use chrono::{NaiveDate, NaiveTime};
use thiserror::Error;

use crate::model::Reservation;

/// Wall-clock booking window within a single day.
///
/// Zero-length and inverted windows are representable; admission does not
/// reject them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl Slot {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    pub fn overlaps(&self, other: &Slot) -> bool {
        slots_overlap(self, other)
    }
}

/// Inclusive on both ends: two slots sharing a boundary instant conflict.
pub fn slots_overlap(existing: &Slot, candidate: &Slot) -> bool {
    existing.start <= candidate.end && candidate.start <= existing.end
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("slot conflicts with reservation {conflicting_id}")]
pub struct SlotConflict {
    pub conflicting_id: String,
}

/// Decides whether `candidate` may be admitted for `table_id` on `date`.
///
/// Reservations for other tables or dates are ignored, so callers may pass a
/// wider set than the store query returned. The first overlapping
/// reservation wins.
pub fn check_slot(
    table_id: &str,
    date: NaiveDate,
    candidate: &Slot,
    existing: &[Reservation],
) -> Result<(), SlotConflict> {
    let conflicting = existing
        .iter()
        .filter(|reservation| reservation.table_id == table_id && reservation.date == date)
        .find(|reservation| slots_overlap(&reservation.slot(), candidate));

    match conflicting {
        Some(reservation) => Err(SlotConflict {
            conflicting_id: reservation.id.clone(),
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn time(raw: &str) -> NaiveTime {
        NaiveTime::parse_from_str(raw, "%H:%M").expect("valid time")
    }

    fn date(raw: &str) -> NaiveDate {
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").expect("valid date")
    }

    fn slot(start: &str, end: &str) -> Slot {
        Slot::new(time(start), time(end))
    }

    fn reservation(id: &str, table_id: &str, day: &str, start: &str, end: &str) -> Reservation {
        Reservation {
            id: id.to_string(),
            table_id: table_id.to_string(),
            table_number: 5,
            client_name: None,
            phone_number: None,
            user_id: "user-1".to_string(),
            date: date(day),
            slot_time_start: time(start),
            slot_time_end: time(end),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn partial_overlap_conflicts() {
        assert!(slots_overlap(&slot("18:00", "19:00"), &slot("18:30", "19:30")));
        assert!(slots_overlap(&slot("18:30", "19:30"), &slot("18:00", "19:00")));
    }

    #[test]
    fn shared_boundary_conflicts() {
        assert!(slots_overlap(&slot("18:00", "19:00"), &slot("19:00", "20:00")));
        assert!(slots_overlap(&slot("19:00", "20:00"), &slot("18:00", "19:00")));
    }

    #[test]
    fn containment_conflicts() {
        assert!(slots_overlap(&slot("17:00", "22:00"), &slot("18:00", "19:00")));
        assert!(slot("18:00", "19:00").overlaps(&slot("17:00", "22:00")));
    }

    #[test]
    fn disjoint_slots_do_not_conflict() {
        assert!(!slots_overlap(&slot("18:00", "19:00"), &slot("19:01", "20:00")));
        assert!(!slots_overlap(&slot("12:00", "13:00"), &slot("10:00", "11:59")));
    }

    #[test]
    fn check_slot_reports_first_conflicting_reservation() {
        let existing = vec![
            reservation("early", "table-5", "2024-06-01", "12:00", "13:00"),
            reservation("dinner", "table-5", "2024-06-01", "18:00", "19:00"),
            reservation("late", "table-5", "2024-06-01", "19:00", "21:00"),
        ];

        let conflict = check_slot(
            "table-5",
            date("2024-06-01"),
            &slot("18:30", "19:30"),
            &existing,
        )
        .expect_err("candidate should conflict");

        assert_eq!(conflict.conflicting_id, "dinner");
    }

    #[test]
    fn other_tables_and_dates_never_conflict() {
        let existing = vec![
            reservation("other-table", "table-6", "2024-06-01", "18:00", "19:00"),
            reservation("other-day", "table-5", "2024-06-02", "18:00", "19:00"),
        ];

        let candidate = slot("18:00", "19:00");
        assert!(check_slot("table-5", date("2024-06-01"), &candidate, &existing).is_ok());
    }

    #[test]
    fn inverted_candidate_is_admitted_when_nothing_overlaps() {
        let existing = vec![reservation("dinner", "table-5", "2024-06-01", "18:00", "19:00")];

        let candidate = slot("21:00", "17:00");
        assert!(check_slot("table-5", date("2024-06-01"), &candidate, &existing).is_ok());
    }

    #[test]
    fn zero_length_candidate_is_admitted_on_an_empty_day() {
        assert!(check_slot("table-5", date("2024-06-01"), &slot("18:30", "18:30"), &[]).is_ok());
    }

    #[test]
    fn zero_length_candidate_conflicts_inside_and_on_the_boundary() {
        let existing = vec![reservation("dinner", "table-5", "2024-06-01", "18:00", "19:00")];

        let day = date("2024-06-01");

        for instant in ["18:30", "19:00", "18:00"] {
            let conflict = check_slot("table-5", day, &slot(instant, instant), &existing)
                .expect_err("instant inside the reservation should conflict");
            assert_eq!(conflict.conflicting_id, "dinner");
        }
        assert!(check_slot("table-5", day, &slot("19:01", "19:01"), &existing).is_ok());
    }

    #[test]
    fn sequentially_admitted_slots_never_overlap() {
        let day = date("2024-06-01");
        let mut admitted: Vec<Reservation> = Vec::new();

        for hour in 10..22u32 {
            for (start_minute, length) in [(0u32, 30u32), (15, 45), (30, 90)] {
                let start = NaiveTime::from_hms_opt(hour, start_minute, 0).expect("valid time");
                let end = start + chrono::Duration::minutes(i64::from(length));
                let candidate = Slot::new(start, end);
                if check_slot("table-5", day, &candidate, &admitted).is_ok() {
                    let mut next = reservation("", "table-5", "2024-06-01", "00:00", "00:00");
                    next.id = format!("res-{}", admitted.len());
                    next.slot_time_start = candidate.start;
                    next.slot_time_end = candidate.end;
                    admitted.push(next);
                }
            }
        }

        assert!(admitted.len() > 1);
        for (index, first) in admitted.iter().enumerate() {
            for second in &admitted[index + 1..] {
                assert!(
                    !slots_overlap(&first.slot(), &second.slot()),
                    "{} overlaps {}",
                    first.id,
                    second.id
                );
            }
        }
    }
}
