//! Mensura - Catalog-driven unit conversion
//!
//! Given a category, a source unit, a target unit and a value, pick a
//! resolution strategy from the catalog, evaluate it and round the result
//! up to four decimals.
//!
//! ```
//! use mensura::Converter;
//! use mensura_catalog::{Catalog, CategoryDef};
//!
//! let catalog = Catalog::new().with_category(
//!     CategoryDef::new("temperature")
//!         .with_role("celsius", "celsius")
//!         .with_role("fahrenheit", "fahrenheit")
//!         .with_formula("celsius_to_fahrenheit", "value * 9/5 + 32"),
//! );
//! let converter = Converter::new(catalog).unwrap();
//! let result = converter.convert("temperature", "celsius", "fahrenheit", "0").unwrap();
//! assert_eq!(result.output_value, 32.0);
//! ```

mod formula;
mod history;
mod request;
mod resolve;

pub use formula::{eval_expr, Expr, Formula, FormulaError, Op, MAX_DEPTH, MAX_FORMULA_LEN, VARIABLE};
pub use history::{History, HistoryEntry, MAX_HISTORY_SIZE};
pub use request::{ConversionRequest, ConversionResult, ValidRequest};
pub use resolve::{resolve, select_strategy, Strategy, StrategyKind};

use chrono::Utc;
use mensura_catalog::{Catalog, CatalogError};
use mensura_core::{round_result, ConversionError, RawValue};
use std::sync::Arc;

/// Convert one value against a catalog
pub fn convert(
    catalog: &Catalog,
    category: &str,
    from_unit: &str,
    to_unit: &str,
    raw_value: impl Into<RawValue>,
) -> Result<ConversionResult, ConversionError> {
    convert_request(catalog, &ConversionRequest::new(category, from_unit, to_unit, raw_value))
}

/// Validate, resolve, evaluate and round a request
pub fn convert_request(
    catalog: &Catalog,
    request: &ConversionRequest,
) -> Result<ConversionResult, ConversionError> {
    let valid = request.validate(catalog)?;
    let (raw, strategy) = resolve(valid.category, &request.from_unit, &request.to_unit, valid.value)?;

    let output_value = round_result(raw);
    if !output_value.is_finite() {
        return Err(ConversionError::overflow().in_category(valid.category.name()));
    }

    Ok(ConversionResult {
        category: request.category.clone(),
        from_unit: request.from_unit.clone(),
        to_unit: request.to_unit.clone(),
        input_value: valid.value,
        output_value,
        strategy,
        computed_at: Utc::now(),
    })
}

/// Conversion engine over a shared, read-only catalog
///
/// Cheap to clone; clones share the catalog. Construction runs
/// `Catalog::validate`, so builder catalogs get the same checks as loaded ones.
#[derive(Debug, Clone)]
pub struct Converter {
    catalog: Arc<Catalog>,
}

impl Converter {
    pub fn new(catalog: Catalog) -> Result<Self, CatalogError> {
        Self::from_shared(Arc::new(catalog))
    }

    pub fn from_shared(catalog: Arc<Catalog>) -> Result<Self, CatalogError> {
        catalog.validate()?;
        Ok(Self { catalog })
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn convert(
        &self,
        category: &str,
        from_unit: &str,
        to_unit: &str,
        raw_value: impl Into<RawValue>,
    ) -> Result<ConversionResult, ConversionError> {
        convert(&self.catalog, category, from_unit, to_unit, raw_value)
    }

    pub fn convert_request(&self, request: &ConversionRequest) -> Result<ConversionResult, ConversionError> {
        convert_request(&self.catalog, request)
    }
}
