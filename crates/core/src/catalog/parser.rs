//! Tire-size extraction from free-text product names.
//!
//! Price-list rows carry sizes in a handful of house formats, e.g.
//! `205 55 16 FIRESTONE F600`, `205 55 R16 ...`, `1200 R20 ...` (truck) and
//! the inline `185/65R15` notation. Patterns are tried in a fixed priority
//! order and the first match wins; that ordering is load-bearing for output
//! stability and must not be rearranged.

use std::sync::LazyLock;

use regex::Regex;

use crate::domain::tire::{TireSpec, VehicleClass};

// `WWW AA DD ...` — three space-separated integers at the start.
static SPACED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{3})\s+(\d{2})\s+(\d{2})(?:\s|$)").expect("valid regex"));

// `WWW AA RDD ...` — as above, diameter carries the rim prefix.
static SPACED_RIM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{3})\s+(\d{2})\s+[Rr](\d{2})(?:\s|$)").expect("valid regex")
});

// `WWWW RDD ...` — truck size, no aspect ratio.
static TRUCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{3,4})\s+[Rr](\d{2})(?:\s|$)").expect("valid regex"));

// `WWW/AA[-R]DD` — inline notation, anywhere in the name.
static INLINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{3})/(\d{2})\s*(?:-\s*[Rr]?|[Rr])\s*(\d{2})\b").expect("valid regex")
});

/// Parse a product name into a [`TireSpec`], or `None` when the name carries
/// no recognizable size (the product is then excluded from tire search).
pub fn parse_tire_spec(name: &str) -> Option<TireSpec> {
    let name = name.trim();

    for pattern in [&*SPACED, &*SPACED_RIM] {
        if let Some(caps) = pattern.captures(name) {
            return Some(TireSpec {
                width: caps.get(1)?.as_str().parse().ok()?,
                aspect_ratio: Some(caps.get(2)?.as_str().parse().ok()?),
                rim_diameter: caps.get(3)?.as_str().parse().ok()?,
                vehicle_class: VehicleClass::Car,
            });
        }
    }

    if let Some(caps) = TRUCK.captures(name) {
        return Some(TireSpec {
            width: caps.get(1)?.as_str().parse().ok()?,
            aspect_ratio: None,
            rim_diameter: caps.get(2)?.as_str().parse().ok()?,
            vehicle_class: VehicleClass::Truck,
        });
    }

    if let Some(caps) = INLINE.captures(name) {
        return Some(TireSpec {
            width: caps.get(1)?.as_str().parse().ok()?,
            aspect_ratio: Some(caps.get(2)?.as_str().parse().ok()?),
            rim_diameter: caps.get(3)?.as_str().parse().ok()?,
            vehicle_class: VehicleClass::Car,
        });
    }

    None
}
