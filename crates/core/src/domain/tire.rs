use serde::{Deserialize, Serialize};

/// Car or truck, inferred from whether an aspect ratio is present.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleClass {
    Car,
    Truck,
}

/// Tire size derived from a product name. Never stored; parsed on demand.
///
/// `aspect_ratio` is `None` for truck sizes, which carry only width and rim
/// diameter. Width is millimeters, aspect ratio a percent, diameter inches.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TireSpec {
    pub width: u16,
    pub aspect_ratio: Option<u16>,
    pub rim_diameter: u16,
    pub vehicle_class: VehicleClass,
}
