//! Candidate slot scan over the business day.
//!
//! Slots advance at 30-minute granularity from opening; a candidate is
//! admissible when its duration-extended interval still fits before close
//! and collides with no same-day booking.

use chrono::{Duration, NaiveDate, NaiveTime};

use crate::domain::appointment::{Appointment, ServiceType};
use crate::schedule::interval::Interval;

pub const SLOT_MINUTES: i64 = 30;
pub const MAX_SUGGESTIONS: usize = 5;

pub fn business_open() -> NaiveTime {
    NaiveTime::from_hms_opt(9, 0, 0).expect("valid time")
}

pub fn business_close() -> NaiveTime {
    NaiveTime::from_hms_opt(18, 0, 0).expect("valid time")
}

/// True when the duration-extended interval fits inside the business window.
pub fn fits_business_hours(start: NaiveTime, service: ServiceType) -> bool {
    let (end, overflow) =
        start.overflowing_add_signed(Duration::minutes(service.duration_minutes()));
    overflow == 0 && start >= business_open() && end <= business_close()
}

/// Every free slot of the day for the given service, in chronological order.
pub fn free_slots(
    date: NaiveDate,
    service: ServiceType,
    bookings: &[Appointment],
) -> Vec<NaiveTime> {
    let taken: Vec<Interval> = bookings
        .iter()
        .filter(|booking| booking.date == date)
        .map(Interval::for_appointment)
        .collect();

    let mut slots = Vec::new();
    let mut cursor = business_open();
    while fits_business_hours(cursor, service) {
        let candidate = Interval::for_service(date, cursor, service);
        if !taken.iter().any(|interval| candidate.overlaps(interval)) {
            slots.push(cursor);
        }
        let (next, overflow) = cursor.overflowing_add_signed(Duration::minutes(SLOT_MINUTES));
        if overflow != 0 {
            break;
        }
        cursor = next;
    }
    slots
}

/// Up to [`MAX_SUGGESTIONS`] alternatives offered alongside a conflict.
pub fn suggest_slots(
    date: NaiveDate,
    service: ServiceType,
    bookings: &[Appointment],
) -> Vec<NaiveTime> {
    let mut slots = free_slots(date, service, bookings);
    slots.truncate(MAX_SUGGESTIONS);
    slots
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveTime};

    use super::{business_close, free_slots, suggest_slots, MAX_SUGGESTIONS};
    use crate::domain::appointment::{Appointment, AppointmentId, ServiceType};

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 9).expect("valid date")
    }

    fn at(hour: u32, minute: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, minute, 0).expect("valid time")
    }

    fn booking(date: NaiveDate, start: NaiveTime, service: ServiceType) -> Appointment {
        Appointment {
            id: AppointmentId("apt-test".to_string()),
            customer_name: "Ana Flores".to_string(),
            contact: "+5215512345678".to_string(),
            service,
            date,
            start,
            vehicle: None,
        }
    }

    #[test]
    fn suggestions_are_chronological_and_capped() {
        let slots = suggest_slots(day(), ServiceType::Rotation, &[]);
        assert_eq!(slots.len(), MAX_SUGGESTIONS);
        assert_eq!(slots[0], at(9, 0));
        assert!(slots.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn suggestions_skip_booked_slots() {
        let bookings = vec![
            booking(day(), at(9, 0), ServiceType::Alignment),
            booking(day(), at(10, 30), ServiceType::Rotation),
        ];
        let slots = suggest_slots(day(), ServiceType::Rotation, &bookings);
        // 09:00 and 09:30 sit under the alignment hour; 10:30 is taken.
        assert_eq!(slots, vec![at(10, 0), at(11, 0), at(11, 30), at(12, 0), at(12, 30)]);
    }

    #[test]
    fn no_slot_extends_past_business_close() {
        for service in [ServiceType::Alignment, ServiceType::Rotation] {
            let slots = free_slots(day(), service, &[]);
            let duration = chrono::Duration::minutes(service.duration_minutes());
            for slot in slots {
                assert!(slot + duration <= business_close(), "slot {slot} overruns close");
            }
        }
    }

    #[test]
    fn last_admissible_slot_depends_on_duration() {
        let half_hour = free_slots(day(), ServiceType::Rotation, &[]);
        assert_eq!(half_hour.last().copied(), Some(at(17, 30)));

        let full_hour = free_slots(day(), ServiceType::Alignment, &[]);
        assert_eq!(full_hour.last().copied(), Some(at(17, 0)));
    }

    #[test]
    fn other_day_bookings_do_not_block_slots() {
        let other_day = NaiveDate::from_ymd_opt(2026, 3, 10).expect("valid date");
        let bookings = vec![booking(other_day, at(9, 0), ServiceType::Alignment)];
        let slots = free_slots(day(), ServiceType::Rotation, &bookings);
        assert_eq!(slots.first().copied(), Some(at(9, 0)));
    }

    #[test]
    fn fully_booked_day_yields_no_suggestions() {
        let mut bookings = Vec::new();
        let mut cursor = at(9, 0);
        while cursor < at(18, 0) {
            bookings.push(booking(day(), cursor, ServiceType::Rotation));
            cursor += chrono::Duration::minutes(30);
        }
        assert!(suggest_slots(day(), ServiceType::Rotation, &bookings).is_empty());
    }
}
