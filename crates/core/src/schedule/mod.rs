pub mod interval;
pub mod slots;

pub use interval::{find_conflict, Interval};
pub use slots::{
    business_close, business_open, fits_business_hours, free_slots, suggest_slots,
    MAX_SUGGESTIONS, SLOT_MINUTES,
};
