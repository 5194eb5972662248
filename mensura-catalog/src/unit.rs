//! Unit representation

use serde::{Deserialize, Serialize};

/// How a unit takes part in conversions
///
/// Chosen per category when the catalog is loaded. Ratio units scale
/// linearly against a shared base; role units are substituted by tag into
/// formula keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UnitKind {
    /// Number of this unit in one base unit
    Ratio(f64),
    /// Tag indexing into `<role>_to_<role>` formula keys
    FormulaRole(String),
}

impl UnitKind {
    pub fn as_ratio(&self) -> Option<f64> {
        match self {
            UnitKind::Ratio(r) => Some(*r),
            UnitKind::FormulaRole(_) => None,
        }
    }

    pub fn as_role(&self) -> Option<&str> {
        match self {
            UnitKind::FormulaRole(tag) => Some(tag),
            UnitKind::Ratio(_) => None,
        }
    }

    pub fn is_role(&self) -> bool {
        matches!(self, UnitKind::FormulaRole(_))
    }
}

/// A named unit inside one category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitDef {
    pub name: String,
    pub kind: UnitKind,
}

impl UnitDef {
    pub fn ratio(name: &str, ratio: f64) -> Self {
        UnitDef {
            name: name.to_string(),
            kind: UnitKind::Ratio(ratio),
        }
    }

    pub fn role(name: &str, tag: &str) -> Self {
        UnitDef {
            name: name.to_string(),
            kind: UnitKind::FormulaRole(tag.to_string()),
        }
    }
}

/// Human-facing unit label: `cubic_meter` reads as `cubic meter`
pub fn format_unit_name(name: &str) -> String {
    name.replace('_', " ")
}
