//! Catalog document loading
//!
//! The document is a JSON object keyed by category name:
//!
//! ```json
//! {
//!   "length": { "units": { "meter": 1, "foot": 3.28084 } },
//!   "temperature": {
//!     "units": { "celsius": "celsius", "fahrenheit": "fahrenheit" },
//!     "formula": { "celsius_to_fahrenheit": "value * 9/5 + 32" }
//!   }
//! }
//! ```
//!
//! Numeric unit values become ratios, string unit values become role tags.
//! Declared order of categories, units and formulas is preserved.

use crate::category::CategoryDef;
use crate::error::CatalogError;
use crate::registry::Catalog;
use crate::unit::{UnitDef, UnitKind};
use serde_json::{json, Map, Value as JsonValue};

impl Catalog {
    /// Parse and validate a catalog document
    pub fn from_json_str(source: &str) -> Result<Self, CatalogError> {
        let doc: JsonValue = serde_json::from_str(source)?;
        Self::from_json_value(&doc)
    }

    /// Build and validate a catalog from an already parsed document
    pub fn from_json_value(doc: &JsonValue) -> Result<Self, CatalogError> {
        let categories = doc.as_object().ok_or(CatalogError::NotAnObject)?;

        let mut catalog = Catalog::new();
        for (name, body) in categories {
            catalog.push_category(parse_category(name, body)?);
        }

        catalog.validate()?;
        Ok(catalog)
    }

    /// Serialize back to the document shape
    pub fn to_json(&self) -> JsonValue {
        let mut doc = Map::new();
        for cat in self.categories() {
            doc.insert(cat.name().to_string(), category_to_json(cat));
        }
        JsonValue::Object(doc)
    }
}

fn parse_category(name: &str, body: &JsonValue) -> Result<CategoryDef, CatalogError> {
    let units = body
        .get("units")
        .and_then(|u| u.as_object())
        .ok_or_else(|| CatalogError::MissingUnits(name.to_string()))?;

    let mut cat = CategoryDef::new(name);
    for (unit, value) in units {
        let kind = match value {
            JsonValue::Number(n) => n.as_f64().map(UnitKind::Ratio),
            JsonValue::String(tag) => Some(UnitKind::FormulaRole(tag.clone())),
            _ => None,
        }
        .ok_or_else(|| CatalogError::InvalidUnitValue {
            category: name.to_string(),
            unit: unit.clone(),
        })?;
        cat.push_unit(UnitDef { name: unit.clone(), kind });
    }

    match body.get("formula") {
        None | Some(JsonValue::Null) => {}
        Some(JsonValue::Object(formulas)) => {
            for (key, expr) in formulas {
                let expr = expr.as_str().ok_or_else(|| CatalogError::InvalidFormula {
                    category: name.to_string(),
                    key: key.clone(),
                })?;
                cat.push_formula(key, expr);
            }
        }
        Some(_) => return Err(CatalogError::FormulaNotObject(name.to_string())),
    }

    Ok(cat)
}

/// One category in document shape
pub fn category_to_json(cat: &CategoryDef) -> JsonValue {
    let mut units = Map::new();
    for unit in cat.units() {
        let value = match &unit.kind {
            UnitKind::Ratio(r) => json!(r),
            UnitKind::FormulaRole(tag) => json!(tag),
        };
        units.insert(unit.name.clone(), value);
    }

    let mut body = Map::new();
    body.insert("units".to_string(), JsonValue::Object(units));

    if cat.has_formulas() {
        let formulas: Map<String, JsonValue> = cat
            .formulas()
            .map(|(k, v)| (k.to_string(), json!(v)))
            .collect();
        body.insert("formula".to_string(), JsonValue::Object(formulas));
    }

    JsonValue::Object(body)
}
