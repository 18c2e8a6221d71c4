pub mod appointment;
pub mod product;
pub mod tire;
