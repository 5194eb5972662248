//! Catalog loading errors

use thiserror::Error;

/// Error type for building a catalog from a document
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CatalogError {
    #[error("Invalid catalog JSON: {0}")]
    Json(String),

    #[error("Catalog document must be an object keyed by category name")]
    NotAnObject,

    #[error("Category '{0}' is missing a 'units' object")]
    MissingUnits(String),

    #[error("Unit '{unit}' in category '{category}' must be a number or a role tag string")]
    InvalidUnitValue { category: String, unit: String },

    #[error("Unit '{unit}' in category '{category}' has ratio {ratio}; ratios must be finite and non-zero")]
    InvalidRatio { category: String, unit: String, ratio: f64 },

    #[error("Category '{0}' mixes ratio units with role-tagged units")]
    MixedUnitKinds(String),

    #[error("Category '{0}' has a 'formula' entry that is not an object")]
    FormulaNotObject(String),

    #[error("Formula '{key}' in category '{category}' must be a string")]
    InvalidFormula { category: String, key: String },
}

impl From<serde_json::Error> for CatalogError {
    fn from(err: serde_json::Error) -> Self {
        CatalogError::Json(err.to_string())
    }
}
