use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductId(pub String);

/// One row of the price list. Immutable once loaded; the full set is
/// replaced wholesale on reload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub unit_cost: Decimal,
    pub stock: u32,
    pub cost_with_tax: Decimal,
    pub final_price: Decimal,
}
