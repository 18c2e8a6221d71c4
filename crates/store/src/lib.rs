pub mod bookings;
pub mod pricelist;

pub use bookings::{BookingStore, InMemoryBookingStore, SheetsBookingStore, StoreError};
pub use pricelist::{PriceBook, PriceListError, PriceListSource, XlsxPriceListSource};
