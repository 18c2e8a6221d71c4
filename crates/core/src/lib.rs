pub mod catalog;
pub mod config;
pub mod domain;
pub mod errors;
pub mod schedule;

pub use catalog::{clamp_limit, parse_tire_spec, search, TireMatch, TireQuery};
pub use domain::appointment::{Appointment, AppointmentId, ServiceType};
pub use domain::product::{Product, ProductId};
pub use domain::tire::{TireSpec, VehicleClass};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use schedule::{find_conflict, free_slots, suggest_slots, Interval};
