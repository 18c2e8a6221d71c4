pub mod matcher;
pub mod parser;

pub use matcher::{clamp_limit, search, strip_rim_prefix, TireMatch, TireQuery};
pub use parser::parse_tire_spec;
