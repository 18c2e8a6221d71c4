//! Price-list loading and the in-memory price book.
//!
//! The price list lives in a spreadsheet file maintained by hand. Loading is
//! wholesale: a reload parses the whole workbook and replaces the product set
//! in one assignment. There is no incremental update path.

use std::path::PathBuf;
use std::sync::{PoisonError, RwLock};

use calamine::{open_workbook, Data, Reader, Xlsx};
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::warn;

use treadline_core::catalog::{search, TireMatch, TireQuery};
use treadline_core::config::PriceListConfig;
use treadline_core::domain::product::{Product, ProductId};

#[derive(Debug, Error)]
pub enum PriceListError {
    #[error("could not open workbook `{path}`: {source}")]
    OpenWorkbook { path: PathBuf, source: calamine::XlsxError },
    #[error("worksheet `{0}` was not found in the workbook")]
    MissingWorksheet(String),
    #[error("the workbook has no worksheets")]
    EmptyWorkbook,
    #[error("required column `{0}` was not found in the header row")]
    MissingColumn(&'static str),
    #[error("row {row}: could not decode column `{column}`")]
    Decode { row: usize, column: &'static str },
}

/// "Read all rows" collaborator for the price list.
pub trait PriceListSource: Send + Sync {
    fn load(&self) -> Result<Vec<Product>, PriceListError>;
}

/// Reads the price list from an `.xlsx` workbook. The first row is the
/// header; recognized columns are matched case-insensitively by name.
pub struct XlsxPriceListSource {
    path: PathBuf,
    sheet: Option<String>,
}

const COLUMNS: [&str; 6] = ["id", "name", "unit_cost", "stock", "cost_with_tax", "final_price"];

impl XlsxPriceListSource {
    pub fn new(path: impl Into<PathBuf>, sheet: Option<String>) -> Self {
        Self { path: path.into(), sheet }
    }

    pub fn from_config(config: &PriceListConfig) -> Self {
        Self::new(config.path.clone(), config.sheet.clone())
    }
}

impl PriceListSource for XlsxPriceListSource {
    fn load(&self) -> Result<Vec<Product>, PriceListError> {
        let mut workbook: Xlsx<_> = open_workbook(&self.path).map_err(|source| {
            PriceListError::OpenWorkbook { path: self.path.clone(), source }
        })?;

        let sheet_name = match &self.sheet {
            Some(name) => name.clone(),
            None => workbook
                .sheet_names()
                .first()
                .cloned()
                .ok_or(PriceListError::EmptyWorkbook)?,
        };

        let range = workbook
            .worksheet_range(&sheet_name)
            .map_err(|_| PriceListError::MissingWorksheet(sheet_name.clone()))?;

        let mut rows = range.rows();
        let header = rows.next().ok_or(PriceListError::MissingColumn("id"))?;
        let columns = resolve_columns(header)?;

        let mut products = Vec::new();
        for (index, row) in rows.enumerate() {
            // Header is row 1, so data rows are 1-based from 2.
            let row_number = index + 2;
            if row_is_blank(row) {
                continue;
            }
            match decode_row(row, &columns, row_number) {
                Ok(product) => products.push(product),
                Err(error) => {
                    warn!(
                        event_name = "pricelist.row_skipped",
                        row = row_number,
                        error = %error,
                        "skipping malformed price list row"
                    );
                }
            }
        }

        Ok(products)
    }
}

struct ColumnMap {
    id: usize,
    name: usize,
    unit_cost: usize,
    stock: usize,
    cost_with_tax: usize,
    final_price: usize,
}

fn resolve_columns(header: &[Data]) -> Result<ColumnMap, PriceListError> {
    let find = |wanted: &'static str| -> Result<usize, PriceListError> {
        header
            .iter()
            .position(|cell| {
                matches!(cell, Data::String(label) if label.trim().eq_ignore_ascii_case(wanted))
            })
            .ok_or(PriceListError::MissingColumn(wanted))
    };

    Ok(ColumnMap {
        id: find(COLUMNS[0])?,
        name: find(COLUMNS[1])?,
        unit_cost: find(COLUMNS[2])?,
        stock: find(COLUMNS[3])?,
        cost_with_tax: find(COLUMNS[4])?,
        final_price: find(COLUMNS[5])?,
    })
}

fn row_is_blank(row: &[Data]) -> bool {
    row.iter().all(|cell| matches!(cell, Data::Empty))
}

fn decode_row(row: &[Data], columns: &ColumnMap, row_number: usize) -> Result<Product, PriceListError> {
    Ok(Product {
        id: ProductId(text_cell(row, columns.id, "id", row_number)?),
        name: text_cell(row, columns.name, "name", row_number)?,
        unit_cost: decimal_cell(row, columns.unit_cost, "unit_cost", row_number)?,
        stock: integer_cell(row, columns.stock, "stock", row_number)?,
        cost_with_tax: decimal_cell(row, columns.cost_with_tax, "cost_with_tax", row_number)?,
        final_price: decimal_cell(row, columns.final_price, "final_price", row_number)?,
    })
}

fn text_cell(
    row: &[Data],
    index: usize,
    column: &'static str,
    row_number: usize,
) -> Result<String, PriceListError> {
    match row.get(index) {
        Some(Data::String(value)) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        Some(Data::Int(value)) => Ok(value.to_string()),
        Some(Data::Float(value)) if value.fract() == 0.0 => Ok(format!("{}", *value as i64)),
        _ => Err(PriceListError::Decode { row: row_number, column }),
    }
}

fn decimal_cell(
    row: &[Data],
    index: usize,
    column: &'static str,
    row_number: usize,
) -> Result<Decimal, PriceListError> {
    match row.get(index) {
        Some(Data::Float(value)) => Decimal::try_from(*value)
            .map_err(|_| PriceListError::Decode { row: row_number, column }),
        Some(Data::Int(value)) => Ok(Decimal::from(*value)),
        Some(Data::String(value)) => value
            .trim()
            .replace(',', "")
            .parse()
            .map_err(|_| PriceListError::Decode { row: row_number, column }),
        _ => Err(PriceListError::Decode { row: row_number, column }),
    }
}

fn integer_cell(
    row: &[Data],
    index: usize,
    column: &'static str,
    row_number: usize,
) -> Result<u32, PriceListError> {
    match row.get(index) {
        Some(Data::Int(value)) => {
            u32::try_from(*value).map_err(|_| PriceListError::Decode { row: row_number, column })
        }
        Some(Data::Float(value)) if value.fract() == 0.0 && *value >= 0.0 => Ok(*value as u32),
        Some(Data::String(value)) => value
            .trim()
            .parse()
            .map_err(|_| PriceListError::Decode { row: row_number, column }),
        _ => Err(PriceListError::Decode { row: row_number, column }),
    }
}

/// The in-memory product set served to search callers. Reload swaps the whole
/// vector behind a write lock; readers see either the old set or the new one.
#[derive(Default)]
pub struct PriceBook {
    products: RwLock<Vec<Product>>,
}

impl PriceBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_products(products: Vec<Product>) -> Self {
        Self { products: RwLock::new(products) }
    }

    pub fn len(&self) -> usize {
        self.products.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn products(&self) -> Vec<Product> {
        self.products.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Replace-all semantics: the previous set is dropped in one assignment.
    pub fn replace_all(&self, products: Vec<Product>) -> usize {
        let count = products.len();
        *self.products.write().unwrap_or_else(PoisonError::into_inner) = products;
        count
    }

    pub fn search(&self, query: &TireQuery) -> Vec<TireMatch> {
        let products = self.products.read().unwrap_or_else(PoisonError::into_inner);
        search(&products, query)
    }
}
