use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;

use crate::domain::appointment::{Appointment, ServiceType};

/// Half-open appointment interval `[start, end)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Interval {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl Interval {
    pub fn for_service(date: NaiveDate, start: NaiveTime, service: ServiceType) -> Self {
        let start = date.and_time(start);
        Self { start, end: start + Duration::minutes(service.duration_minutes()) }
    }

    pub fn for_appointment(appointment: &Appointment) -> Self {
        Self::for_service(appointment.date, appointment.start, appointment.service)
    }

    /// Half-open overlap test. Back-to-back intervals sharing only an
    /// endpoint do not overlap.
    pub fn overlaps(&self, other: &Interval) -> bool {
        self.start < other.end && self.end > other.start
    }
}

/// First existing interval the requested one collides with, if any.
pub fn find_conflict<'a>(
    requested: &Interval,
    existing: &'a [Interval],
) -> Option<&'a Interval> {
    existing.iter().find(|interval| requested.overlaps(interval))
}
