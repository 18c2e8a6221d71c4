//! Tire search over the in-memory price book.
//!
//! Width must match exactly; the vehicle class is inferred from whether the
//! query supplies an aspect ratio. Fuzzy mode tolerates ±5 on the aspect
//! ratio and ignores rim prefixes on the diameter; exact mode requires both
//! to line up.

use serde::{Deserialize, Serialize};

use crate::catalog::parser::parse_tire_spec;
use crate::domain::product::Product;
use crate::domain::tire::{TireSpec, VehicleClass};

pub const DEFAULT_LIMIT: usize = 10;
pub const MIN_LIMIT: usize = 1;
pub const MAX_LIMIT: usize = 100;

/// How far a parsed aspect ratio may sit from the queried one in fuzzy mode.
pub const ASPECT_RATIO_TOLERANCE: u16 = 5;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TireQuery {
    pub width: u16,
    pub aspect_ratio: Option<u16>,
    pub diameter: Option<String>,
    pub exact: bool,
    pub limit: usize,
}

impl TireQuery {
    pub fn new(width: u16) -> Self {
        Self { width, aspect_ratio: None, diameter: None, exact: false, limit: DEFAULT_LIMIT }
    }

    /// Aspect ratio present means a car-sized query, absent means truck.
    pub fn vehicle_class(&self) -> VehicleClass {
        if self.aspect_ratio.is_some() {
            VehicleClass::Car
        } else {
            VehicleClass::Truck
        }
    }
}

/// Clamp a caller-supplied limit into `[MIN_LIMIT, MAX_LIMIT]`, defaulting
/// when the caller supplied none.
pub fn clamp_limit(limit: Option<usize>) -> usize {
    limit.unwrap_or(DEFAULT_LIMIT).clamp(MIN_LIMIT, MAX_LIMIT)
}

/// Numeric diameter with any leading rim prefix removed, so `R16` and `16`
/// compare equal regardless of which side carries the prefix.
pub fn strip_rim_prefix(value: &str) -> Option<u16> {
    let trimmed = value.trim();
    let bare = trimmed.strip_prefix(['R', 'r']).unwrap_or(trimmed);
    bare.parse().ok()
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TireMatch {
    pub product: Product,
    pub spec: TireSpec,
}

fn diameter_matches(spec: &TireSpec, query_diameter: &str) -> bool {
    strip_rim_prefix(query_diameter) == Some(spec.rim_diameter)
}

fn spec_matches(spec: &TireSpec, query: &TireQuery) -> bool {
    if spec.width != query.width || spec.vehicle_class != query.vehicle_class() {
        return false;
    }

    match query.vehicle_class() {
        VehicleClass::Car if query.exact => {
            let aspect_ok = match (spec.aspect_ratio, query.aspect_ratio) {
                (Some(parsed), Some(wanted)) => parsed == wanted,
                _ => false,
            };
            let diameter_ok =
                query.diameter.as_deref().is_some_and(|d| diameter_matches(spec, d));
            aspect_ok && diameter_ok
        }
        VehicleClass::Car => {
            let aspect_ok = match (spec.aspect_ratio, query.aspect_ratio) {
                (Some(parsed), Some(wanted)) => parsed.abs_diff(wanted) <= ASPECT_RATIO_TOLERANCE,
                (_, None) => true,
                (None, Some(_)) => false,
            };
            let diameter_ok = match query.diameter.as_deref() {
                Some(d) => diameter_matches(spec, d),
                None => true,
            };
            aspect_ok && diameter_ok
        }
        VehicleClass::Truck => match query.diameter.as_deref() {
            Some(d) => diameter_matches(spec, d),
            None => true,
        },
    }
}

/// Run the query over the product set: parse each name on demand, keep the
/// matches, rank ascending by final price, truncate to the query limit.
pub fn search(products: &[Product], query: &TireQuery) -> Vec<TireMatch> {
    let mut matches: Vec<TireMatch> = products
        .iter()
        .filter_map(|product| {
            let spec = parse_tire_spec(&product.name)?;
            spec_matches(&spec, query)
                .then(|| TireMatch { product: product.clone(), spec })
        })
        .collect();

    matches.sort_by(|a, b| a.product.final_price.cmp(&b.product.final_price));
    matches.truncate(query.limit.clamp(MIN_LIMIT, MAX_LIMIT));
    matches
}
