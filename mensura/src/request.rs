//! Conversion requests and results

use crate::resolve::StrategyKind;
use chrono::{DateTime, Utc};
use mensura_catalog::{Catalog, CategoryDef};
use mensura_core::{ConversionError, RawValue};
use serde::{Deserialize, Serialize};

/// One conversion asked for by a caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionRequest {
    pub category: String,
    pub from_unit: String,
    pub to_unit: String,
    pub value: RawValue,
}

impl ConversionRequest {
    pub fn new(
        category: impl Into<String>,
        from_unit: impl Into<String>,
        to_unit: impl Into<String>,
        value: impl Into<RawValue>,
    ) -> Self {
        Self {
            category: category.into(),
            from_unit: from_unit.into(),
            to_unit: to_unit.into(),
            value: value.into(),
        }
    }

    /// Check the request against the catalog before any strategy runs
    ///
    /// Order: required fields, numeric value, category, units.
    pub fn validate<'c>(&self, catalog: &'c Catalog) -> Result<ValidRequest<'c>, ConversionError> {
        if self.category.trim().is_empty() {
            return Err(ConversionError::missing_field("category"));
        }
        if self.from_unit.trim().is_empty() {
            return Err(ConversionError::missing_field("from unit"));
        }
        if self.to_unit.trim().is_empty() {
            return Err(ConversionError::missing_field("to unit"));
        }

        let value = self.value.to_number()?;

        let category = catalog.category(&self.category)?;
        catalog.unit(&self.category, &self.from_unit)?;
        catalog.unit(&self.category, &self.to_unit)?;

        Ok(ValidRequest { category, value })
    }
}

/// A request that passed validation
#[derive(Debug, Clone)]
pub struct ValidRequest<'c> {
    pub category: &'c CategoryDef,
    pub value: f64,
}

/// A successful, rounded conversion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionResult {
    pub category: String,
    pub from_unit: String,
    pub to_unit: String,
    pub input_value: f64,
    pub output_value: f64,
    pub strategy: StrategyKind,
    pub computed_at: DateTime<Utc>,
}
